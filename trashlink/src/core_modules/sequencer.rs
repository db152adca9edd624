// THEORY:
// The `sequencer` module owns the only persistent state in the system, the
// `BinState`, and turns one waste-drop event into a lazy stream of frames.
//
// Key architectural principles:
// 1.  **Pull, don't push**: `drop` returns a `DropSequence` iterator. Nothing is
//     rendered until the consumer asks for the next frame, and there is no timing
//     here at all. Pacing is the display sink's business.
// 2.  **Commit on exhaustion**: the new fill level is written only by the `next()`
//     call that returns `None`. A consumer that stops early simply drops the
//     sequence and the bin is left untouched.
// 3.  **Borrow-checked serialisation**: a `DropSequence` holds `&mut` to its
//     sequencer, so a second drop cannot start while one is still in flight.
// 4.  **Stable levels during motion**: every frame of a drop is painted with the
//     levels captured when the drop began. The bump only shows up when the caller
//     asks for `render_current()` afterwards.

use crate::core_modules::bin_state::{BinState, LidState, WasteKind};
use crate::core_modules::choreography::{AnimationConfig, Choreography, FramePlan, Phase};
use crate::core_modules::renderer::{BinRenderer, Frame};
use crate::error::Result;
use log::{debug, info};
use std::iter::FusedIterator;

/// Owns a bin's fill levels and produces its drop animations.
#[derive(Debug, Clone)]
pub struct AnimationSequencer {
    renderer: BinRenderer,
    config: AnimationConfig,
    state: BinState,
}

impl Default for AnimationSequencer {
    fn default() -> Self {
        Self {
            renderer: BinRenderer::default(),
            config: AnimationConfig::default(),
            state: BinState::empty(),
        }
    }
}

impl AnimationSequencer {
    pub fn new(renderer: BinRenderer, config: AnimationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            renderer,
            config,
            state: BinState::empty(),
        })
    }

    /// Restores a previously captured state. Levels are clamped.
    pub fn with_state(mut self, state: BinState) -> Self {
        self.state = BinState::new(state.biomedical_level, state.general_level);
        self
    }

    pub fn state(&self) -> BinState {
        self.state
    }

    pub fn renderer(&self) -> &BinRenderer {
        &self.renderer
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Number of frames every drop produces, whatever the levels.
    pub fn frames_per_drop(&self) -> usize {
        self.config.total_frames() as usize
    }

    /// Starts the drop animation for `kind`. The fill level is committed once the
    /// returned sequence has been pulled to exhaustion.
    pub fn drop(&mut self, kind: WasteKind) -> DropSequence<'_> {
        let choreography = Choreography::new(self.renderer.geometry(), &self.config, kind);
        let levels = self.state;
        debug!("drop started: kind={kind} levels={levels:?}");
        DropSequence {
            sequencer: self,
            choreography,
            levels,
            lid: LidState::closed(),
            phase: None,
            committed: false,
        }
    }

    /// Like [`AnimationSequencer::drop`], for a waste type given by name. Unknown
    /// names are rejected before any frame exists.
    pub fn drop_named(&mut self, name: &str) -> Result<DropSequence<'_>> {
        let kind = name.parse::<WasteKind>()?;
        Ok(self.drop(kind))
    }

    /// Empties both compartments. Produces no frames.
    pub fn reset(&mut self) {
        info!("bin reset from {:?}", self.state);
        self.state = BinState::empty();
    }

    /// The committed state with the lid closed and nothing in flight.
    pub fn render_current(&self) -> Frame {
        self.renderer.render_state(&self.state, LidState::closed(), None)
    }

    fn commit(&mut self, kind: WasteKind, levels: BinState) {
        self.state = levels.incremented(kind, self.config.fill_increment);
        debug!("drop committed: kind={kind} levels={:?}", self.state);
    }
}

/// The frames of one drop, produced on demand.
///
/// Each yielded frame is an owned image; keeping it around does not pin any
/// renderer storage.
pub struct DropSequence<'a> {
    sequencer: &'a mut AnimationSequencer,
    choreography: Choreography,
    levels: BinState,
    lid: LidState,
    phase: Option<Phase>,
    committed: bool,
}

impl<'a> DropSequence<'a> {
    pub fn kind(&self) -> WasteKind {
        self.choreography.kind()
    }

    /// Phase of the most recently yielded frame.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Lid of the most recently yielded frame; closed again once the drop commits.
    pub fn lid(&self) -> LidState {
        self.lid
    }

    /// Levels every frame of this drop is painted with.
    pub fn levels(&self) -> BinState {
        self.levels
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Pulls every remaining frame, discarding them, and returns the committed state.
    pub fn finish(mut self) -> BinState {
        for _ in self.by_ref() {}
        self.sequencer.state
    }

    fn render(&self, plan: &FramePlan) -> Frame {
        self.sequencer
            .renderer
            .render_state(&self.levels, plan.lid, plan.item.as_ref())
    }
}

impl<'a> Iterator for DropSequence<'a> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        match self.choreography.next() {
            Some(plan) => {
                if self.phase != Some(plan.phase) {
                    debug!("drop phase {:?} for {}", plan.phase, self.kind());
                    self.phase = Some(plan.phase);
                }
                self.lid = plan.lid;
                Some(self.render(&plan))
            }
            None => {
                if !self.committed {
                    self.committed = true;
                    self.lid = LidState::closed();
                    let kind = self.kind();
                    self.sequencer.commit(kind, self.levels);
                }
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.choreography.size_hint()
    }
}

impl ExactSizeIterator for DropSequence<'_> {}
impl FusedIterator for DropSequence<'_> {}
