// THEORY:
// The `dashboard` module is the top-level API of the crate. It joins the two things
// a user interface cares about: the control events coming in (drop a waste type,
// reset) and the frames going out to whatever surface shows them. A `BinDashboard`
// owns one `AnimationSequencer` for the lifetime of a session, plays each drop into
// a `FrameSink`, commits, then shows the refreshed bin and reports its status.

use crate::core_modules::bin_state::{BinState, WasteKind};
use crate::core_modules::renderer::Frame;
use crate::core_modules::sequencer::{AnimationSequencer, DropSequence};
use crate::core_modules::status::StatusReport;
use crate::error::{BinError, Result};
use log::{info, warn};
use std::fmt;
use std::str::FromStr;

// Re-export key data structures for the public API.
pub use crate::core_modules::choreography::{AnimationConfig, Phase};
pub use crate::core_modules::renderer::{BinGeometry, BinRenderer};
pub use crate::core_modules::status::{CompartmentStatus, FillStatus};

/// A consumer of rendered frames, such as a window, a socket or a directory.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// Collects every frame in memory.
impl FrameSink for Vec<Frame> {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// A discrete input from the control source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Drop(WasteKind),
    Reset,
}

impl FromStr for ControlEvent {
    type Err = BinError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("reset") {
            Ok(ControlEvent::Reset)
        } else {
            s.parse().map(ControlEvent::Drop)
        }
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEvent::Drop(kind) => write!(f, "drop {kind}"),
            ControlEvent::Reset => f.write_str("reset"),
        }
    }
}

/// One bin, one session.
#[derive(Debug, Clone, Default)]
pub struct BinDashboard {
    sequencer: AnimationSequencer,
}

impl BinDashboard {
    pub fn new(sequencer: AnimationSequencer) -> Self {
        Self { sequencer }
    }

    pub fn state(&self) -> BinState {
        self.sequencer.state()
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::from_state(&self.sequencer.state())
    }

    pub fn sequencer(&self) -> &AnimationSequencer {
        &self.sequencer
    }

    /// Current bin with the lid closed.
    pub fn snapshot(&self) -> Frame {
        self.sequencer.render_current()
    }

    /// Starts a drop whose frames the caller pulls and paces itself.
    pub fn begin_drop(&mut self, kind: WasteKind) -> DropSequence<'_> {
        self.sequencer.drop(kind)
    }

    /// Plays `event` into `sink` and returns the resulting status.
    pub fn dispatch(
        &mut self,
        event: ControlEvent,
        sink: &mut dyn FrameSink,
    ) -> Result<StatusReport> {
        match event {
            ControlEvent::Drop(kind) => self.drop_into(kind, sink),
            ControlEvent::Reset => self.reset_into(sink),
        }
    }

    /// Plays a full drop animation into `sink`, commits, then presents the updated
    /// bin. If the sink fails part way the drop is abandoned and nothing is committed.
    pub fn drop_into(&mut self, kind: WasteKind, sink: &mut dyn FrameSink) -> Result<StatusReport> {
        let mut sequence = self.sequencer.drop(kind);
        for frame in sequence.by_ref() {
            if let Err(e) = sink.present(&frame) {
                warn!("abandoning {kind} drop: {e}");
                return Err(e);
            }
        }
        sink.present(&self.sequencer.render_current())?;
        let status = self.status();
        for message in status.messages() {
            warn!("{message}");
        }
        Ok(status)
    }

    /// Empties the bin and presents it. Reset has no animation.
    pub fn reset_into(&mut self, sink: &mut dyn FrameSink) -> Result<StatusReport> {
        self.sequencer.reset();
        sink.present(&self.sequencer.render_current())?;
        info!("bins emptied");
        Ok(self.status())
    }

    /// Empties the bin without presenting anything.
    pub fn reset(&mut self) -> StatusReport {
        self.sequencer.reset();
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::status::FillStatus;

    /// Accepts a fixed number of frames, then fails.
    struct FlakySink {
        remaining: usize,
    }

    impl FrameSink for FlakySink {
        fn present(&mut self, _frame: &Frame) -> Result<()> {
            if self.remaining == 0 {
                return Err(BinError::Sink("display went away".into()));
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    #[test]
    fn drop_presents_animation_then_refreshed_bin() {
        let mut dashboard = BinDashboard::default();
        let mut frames: Vec<Frame> = Vec::new();
        let status = dashboard
            .dispatch(ControlEvent::Drop(WasteKind::Biomedical), &mut frames)
            .unwrap();

        assert_eq!(frames.len(), 22);
        assert_eq!(status.biomedical.level, 20);
        assert_eq!(status.general.level, 0);
        assert_eq!(frames.last(), Some(&dashboard.snapshot()));
    }

    #[test]
    fn five_drops_then_reset() {
        let mut dashboard = BinDashboard::default();
        let mut frames: Vec<Frame> = Vec::new();
        let mut last = None;
        for _ in 0..5 {
            last = Some(dashboard.drop_into(WasteKind::Biomedical, &mut frames).unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.biomedical.level, 100);
        assert_eq!(last.biomedical.status, FillStatus::Alert);
        assert!(last.warning_light);

        frames.clear();
        let status = dashboard.dispatch(ControlEvent::Reset, &mut frames).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(dashboard.state(), BinState::empty());
        assert!(!status.warning_light);
    }

    #[test]
    fn failing_sink_abandons_the_drop() {
        let mut dashboard = BinDashboard::default();
        let mut sink = FlakySink { remaining: 5 };
        let result = dashboard.drop_into(WasteKind::General, &mut sink);
        assert!(matches!(result, Err(BinError::Sink(_))));
        assert_eq!(dashboard.state(), BinState::empty());
    }

    #[test]
    fn control_events_parse_from_text() {
        assert_eq!("reset".parse::<ControlEvent>().unwrap(), ControlEvent::Reset);
        assert_eq!(
            "GENERAL".parse::<ControlEvent>().unwrap(),
            ControlEvent::Drop(WasteKind::General)
        );
        assert!("compost".parse::<ControlEvent>().is_err());
        assert_eq!(ControlEvent::Drop(WasteKind::Biomedical).to_string(), "drop biomedical");
    }
}
