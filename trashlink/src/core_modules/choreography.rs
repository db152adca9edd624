// THEORY:
// The `choreography` module is the timing half of a drop animation, split away from
// the painting half. For a given waste type it describes, frame by frame, where the
// lid is and where the item is. It renders nothing and owns no state beyond a
// cursor, so every property of the motion (frame counts, angle endpoints,
// monotonicity) can be checked without touching a single pixel.
//
// A drop is three fixed-length phases:
// 1. Fall:      the item drops straight down from `fall_start_y` onto the lid.
// 2. Lid open:  the lid swings 0 -> 90 degrees. The item rests on the lid for the
//               first half, then sinks and drifts towards its compartment.
// 3. Lid close: the lid swings 90 -> 0 degrees. The item has landed and is gone.
//
// Both lid phases include their endpoints, so the lid is exactly closed on the
// first and last frames of the motion and exactly open at the phase boundary.

use crate::core_modules::bin_state::{FallingItem, LID_OPEN_DEGREES, LidState, WasteKind};
use crate::core_modules::renderer::BinGeometry;
use crate::error::{BinError, Result};
use std::iter::FusedIterator;

/// Frame counts and motion constants for one drop.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub fall_frames: u32,
    pub lid_open_frames: u32,
    pub lid_close_frames: u32,
    /// Percentage points added to the target compartment once the drop completes.
    pub fill_increment: u8,
    /// Height at which the item appears.
    pub fall_start_y: f64,
    /// How far the item sinks per frame once the lid is half open.
    pub descent_step: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fall_frames: 8,
            lid_open_frames: 8,
            lid_close_frames: 5,
            fill_increment: 20,
            fall_start_y: 50.0,
            descent_step: 30.0,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(BinError::InvalidAnimation(msg.to_string()));
        if self.fall_frames < 1 {
            return invalid("fall phase needs at least one frame");
        }
        // Two frames minimum, so the lid reaches both of its endpoints.
        if self.lid_open_frames < 2 {
            return invalid("lid-open phase needs at least two frames");
        }
        if self.lid_close_frames < 2 {
            return invalid("lid-close phase needs at least two frames");
        }
        if self.fill_increment == 0 || self.fill_increment > 100 {
            return invalid("fill increment must be within 1..=100");
        }
        let total = self
            .fall_frames
            .checked_add(self.lid_open_frames)
            .and_then(|n| n.checked_add(self.lid_close_frames));
        if total.is_none() {
            return invalid("total frame count overflows");
        }
        if !self.fall_start_y.is_finite() || !self.descent_step.is_finite() {
            return invalid("motion constants must be finite");
        }
        Ok(())
    }

    pub fn total_frames(&self) -> u32 {
        self.fall_frames
            .saturating_add(self.lid_open_frames)
            .saturating_add(self.lid_close_frames)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fall,
    LidOpen,
    LidClose,
}

/// The complete visual parameters of one frame, minus the fill levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub phase: Phase,
    pub index_in_phase: u32,
    pub lid: LidState,
    pub item: Option<FallingItem>,
}

/// Linear progress `index / (count - 1)`, pinned to 1.0 for single-frame phases.
fn progress(index: u32, count: u32) -> f64 {
    if count <= 1 {
        1.0
    } else {
        index as f64 / (count - 1) as f64
    }
}

/// Frame-by-frame schedule of one drop. Iterating yields exactly
/// [`AnimationConfig::total_frames`] plans.
#[derive(Debug, Clone)]
pub struct Choreography {
    config: AnimationConfig,
    kind: WasteKind,
    center_x: f64,
    target_x: f64,
    lid_top: f64,
    cursor: u32,
}

impl Choreography {
    pub fn new(geometry: &BinGeometry, config: &AnimationConfig, kind: WasteKind) -> Self {
        Self {
            config: config.clone(),
            kind,
            center_x: geometry.center_x(),
            target_x: geometry.drop_target_x(kind),
            lid_top: geometry.lid().top() as f64,
            cursor: 0,
        }
    }

    pub fn kind(&self) -> WasteKind {
        self.kind
    }

    pub fn total_frames(&self) -> u32 {
        self.config.total_frames()
    }

    /// Plan for absolute frame `index`, or `None` past the end.
    pub fn plan_at(&self, index: u32) -> Option<FramePlan> {
        let c = &self.config;
        if index < c.fall_frames {
            return Some(self.fall(index));
        }
        let index = index - c.fall_frames;
        if index < c.lid_open_frames {
            return Some(self.lid_open(index));
        }
        let index = index - c.lid_open_frames;
        if index < c.lid_close_frames {
            return Some(self.lid_close(index));
        }
        None
    }

    fn item_at(&self, x: f64, y: f64) -> Option<FallingItem> {
        Some(FallingItem {
            kind: self.kind,
            x,
            y,
        })
    }

    fn fall(&self, k: u32) -> FramePlan {
        let start = self.config.fall_start_y;
        let y = start + (self.lid_top - start) * progress(k, self.config.fall_frames);
        FramePlan {
            phase: Phase::Fall,
            index_in_phase: k,
            lid: LidState::closed(),
            item: self.item_at(self.center_x, y),
        }
    }

    fn lid_open(&self, k: u32) -> FramePlan {
        let frames = self.config.lid_open_frames;
        let resting = frames / 2;
        let item = if k < resting {
            self.item_at(self.center_x, self.lid_top)
        } else {
            let step = (k - resting + 1) as f64;
            let drifting = (frames - resting) as f64;
            let x = self.center_x + (self.target_x - self.center_x) * step / drifting;
            let y = self.lid_top + self.config.descent_step * step;
            self.item_at(x, y)
        };
        FramePlan {
            phase: Phase::LidOpen,
            index_in_phase: k,
            lid: LidState::at(LID_OPEN_DEGREES * progress(k, frames)),
            item,
        }
    }

    fn lid_close(&self, k: u32) -> FramePlan {
        let frames = self.config.lid_close_frames;
        FramePlan {
            phase: Phase::LidClose,
            index_in_phase: k,
            lid: LidState::at(LID_OPEN_DEGREES * (1.0 - progress(k, frames))),
            item: None,
        }
    }
}

impl Iterator for Choreography {
    type Item = FramePlan;

    fn next(&mut self) -> Option<FramePlan> {
        let plan = self.plan_at(self.cursor)?;
        self.cursor += 1;
        Some(plan)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_frames().saturating_sub(self.cursor) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Choreography {}
impl FusedIterator for Choreography {}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans(kind: WasteKind) -> Vec<FramePlan> {
        Choreography::new(&BinGeometry::default(), &AnimationConfig::default(), kind).collect()
    }

    fn phase(plans: &[FramePlan], phase: Phase) -> Vec<FramePlan> {
        plans.iter().copied().filter(|p| p.phase == phase).collect()
    }

    #[test]
    fn phase_lengths_match_config() {
        let all = plans(WasteKind::Biomedical);
        assert_eq!(all.len(), 21);
        assert_eq!(phase(&all, Phase::Fall).len(), 8);
        assert_eq!(phase(&all, Phase::LidOpen).len(), 8);
        assert_eq!(phase(&all, Phase::LidClose).len(), 5);
        // Phases are contiguous and ordered.
        assert!(all[..8].iter().all(|p| p.phase == Phase::Fall));
        assert!(all[8..16].iter().all(|p| p.phase == Phase::LidOpen));
        assert!(all[16..].iter().all(|p| p.phase == Phase::LidClose));
    }

    #[test]
    fn fall_descends_from_start_onto_the_lid() {
        let fall = phase(&plans(WasteKind::General), Phase::Fall);
        let first = fall[0].item.unwrap();
        let last = fall[fall.len() - 1].item.unwrap();
        assert_eq!(first.y, 50.0);
        assert_eq!(last.y, 130.0);
        assert!(fall.windows(2).all(|w| w[1].item.unwrap().y > w[0].item.unwrap().y));
        assert!(fall.iter().all(|p| p.lid.is_closed() && p.item.unwrap().x == 200.0));
    }

    #[test]
    fn lid_opens_monotonically_from_zero_to_ninety() {
        let open = phase(&plans(WasteKind::Biomedical), Phase::LidOpen);
        assert_eq!(open[0].lid.angle_degrees, 0.0);
        assert_eq!(open[open.len() - 1].lid.angle_degrees, 90.0);
        assert!(open.windows(2).all(|w| w[1].lid.angle_degrees > w[0].lid.angle_degrees));
    }

    #[test]
    fn lid_closes_monotonically_from_ninety_to_zero() {
        let close = phase(&plans(WasteKind::Biomedical), Phase::LidClose);
        assert_eq!(close[0].lid.angle_degrees, 90.0);
        assert_eq!(close[close.len() - 1].lid.angle_degrees, 0.0);
        assert!(close.windows(2).all(|w| w[1].lid.angle_degrees < w[0].lid.angle_degrees));
        assert!(close.iter().all(|p| p.item.is_none()));
    }

    #[test]
    fn item_rests_on_lid_then_drifts_to_its_compartment() {
        for (kind, target) in [(WasteKind::Biomedical, 100.0), (WasteKind::General, 300.0)] {
            let open = phase(&plans(kind), Phase::LidOpen);
            for plan in &open[..4] {
                let item = plan.item.unwrap();
                assert_eq!((item.x, item.y), (200.0, 130.0));
            }
            let drifting: Vec<FallingItem> = open[4..].iter().map(|p| p.item.unwrap()).collect();
            assert!(drifting.windows(2).all(|w| w[1].y > w[0].y));
            assert!(drifting.windows(2).all(|w| (w[1].x - target).abs() < (w[0].x - target).abs()));
            assert_eq!(drifting.last().unwrap().x, target);
            assert!(drifting.iter().all(|item| item.kind == kind));
        }
    }

    #[test]
    fn custom_frame_counts_keep_endpoints() {
        let config = AnimationConfig {
            fall_frames: 1,
            lid_open_frames: 2,
            lid_close_frames: 3,
            ..AnimationConfig::default()
        };
        config.validate().unwrap();
        let all: Vec<FramePlan> =
            Choreography::new(&BinGeometry::default(), &config, WasteKind::General).collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].item.unwrap().y, 130.0);
        assert_eq!(all[1].lid.angle_degrees, 0.0);
        assert_eq!(all[2].lid.angle_degrees, 90.0);
        assert_eq!(all[3].lid.angle_degrees, 90.0);
        assert_eq!(all[4].lid.angle_degrees, 45.0);
        assert_eq!(all[5].lid.angle_degrees, 0.0);
    }

    #[test]
    fn size_hint_counts_down() {
        let mut choreography = Choreography::new(
            &BinGeometry::default(),
            &AnimationConfig::default(),
            WasteKind::General,
        );
        assert_eq!(choreography.len(), 21);
        choreography.next();
        choreography.next();
        assert_eq!(choreography.len(), 19);
        assert_eq!(choreography.by_ref().count(), 19);
        assert!(choreography.next().is_none());
    }

    #[test]
    fn rejects_degenerate_configs() {
        let bad = [
            AnimationConfig { fall_frames: 0, ..AnimationConfig::default() },
            AnimationConfig { lid_open_frames: 1, ..AnimationConfig::default() },
            AnimationConfig { lid_close_frames: 0, ..AnimationConfig::default() },
            AnimationConfig { fill_increment: 0, ..AnimationConfig::default() },
            AnimationConfig { fill_increment: 101, ..AnimationConfig::default() },
            AnimationConfig { descent_step: f64::NAN, ..AnimationConfig::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(BinError::InvalidAnimation(_))));
        }
        assert!(AnimationConfig::default().validate().is_ok());
    }

    #[test]
    fn frame_count_overflow_is_an_error_not_a_panic() {
        let config = AnimationConfig {
            fall_frames: u32::MAX,
            lid_open_frames: 2,
            lid_close_frames: 2,
            ..AnimationConfig::default()
        };
        assert!(matches!(config.validate(), Err(BinError::InvalidAnimation(_))));
        assert_eq!(config.total_frames(), u32::MAX);
    }
}
