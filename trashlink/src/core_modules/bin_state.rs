// THEORY:
// The `bin_state` module holds the small value types every other module talks in.
// `BinState` is the only piece of persistent state in the whole system: two
// clamped percentages, one per compartment. `LidState` and `FallingItem` are
// transient and only ever live inside a running drop animation.

use crate::error::BinError;
use std::fmt;
use std::str::FromStr;

/// Highest fill level a compartment can reach.
pub const MAX_LEVEL: u8 = 100;

/// Fully open lid, in degrees.
pub const LID_OPEN_DEGREES: f64 = 90.0;

/// The two compartments of the bin. Biomedical sits on the left, general on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "web", serde(rename_all = "lowercase"))]
pub enum WasteKind {
    Biomedical,
    General,
}

impl WasteKind {
    pub const ALL: [WasteKind; 2] = [WasteKind::Biomedical, WasteKind::General];

    /// Colour of a falling item of this kind.
    pub fn color(self) -> [u8; 3] {
        match self {
            WasteKind::Biomedical => [255, 0, 0],
            WasteKind::General => [0, 255, 0],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WasteKind::Biomedical => "biomedical",
            WasteKind::General => "general",
        }
    }

    /// Human readable label used in status messages.
    pub fn label(self) -> &'static str {
        match self {
            WasteKind::Biomedical => "Biomedical",
            WasteKind::General => "General waste",
        }
    }
}

impl fmt::Display for WasteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WasteKind {
    type Err = BinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "biomedical" => Ok(WasteKind::Biomedical),
            "general" => Ok(WasteKind::General),
            _ => Err(BinError::UnknownWasteKind(s.to_string())),
        }
    }
}

/// Fill levels of both compartments, each a percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
pub struct BinState {
    pub biomedical_level: u8,
    pub general_level: u8,
}

impl BinState {
    /// Builds a state, clamping both levels to 100.
    pub fn new(biomedical_level: u8, general_level: u8) -> Self {
        Self {
            biomedical_level: biomedical_level.min(MAX_LEVEL),
            general_level: general_level.min(MAX_LEVEL),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn level(&self, kind: WasteKind) -> u8 {
        match kind {
            WasteKind::Biomedical => self.biomedical_level,
            WasteKind::General => self.general_level,
        }
    }

    /// Returns a copy with `kind` raised by `amount`, saturating at 100.
    pub fn incremented(&self, kind: WasteKind, amount: u8) -> Self {
        let mut next = *self;
        let slot = match kind {
            WasteKind::Biomedical => &mut next.biomedical_level,
            WasteKind::General => &mut next.general_level,
        };
        *slot = slot.saturating_add(amount).min(MAX_LEVEL);
        next
    }
}

/// Rotation of the lid. Zero is closed, 90 is fully open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LidState {
    pub angle_degrees: f64,
}

impl LidState {
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn at(angle_degrees: f64) -> Self {
        Self {
            angle_degrees: angle_degrees.clamp(0.0, LID_OPEN_DEGREES),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.angle_degrees <= 0.0
    }
}

/// An item in flight, positioned in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingItem {
    pub kind: WasteKind,
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_clamps_at_full() {
        let state = BinState::new(70, 85);
        let next = state.incremented(WasteKind::General, 20);
        assert_eq!(next.general_level, 100);
        assert_eq!(next.biomedical_level, 70);

        let saturated = BinState::new(100, 0).incremented(WasteKind::Biomedical, 255);
        assert_eq!(saturated.biomedical_level, 100);
    }

    #[test]
    fn new_clamps_out_of_range_levels() {
        let state = BinState::new(140, 101);
        assert_eq!(state, BinState::new(100, 100));
    }

    #[test]
    fn parses_waste_kinds_case_insensitively() {
        assert_eq!("Biomedical".parse::<WasteKind>().unwrap(), WasteKind::Biomedical);
        assert_eq!(" general ".parse::<WasteKind>().unwrap(), WasteKind::General);
        assert!(matches!(
            "recycling".parse::<WasteKind>(),
            Err(BinError::UnknownWasteKind(name)) if name == "recycling"
        ));
    }

    #[test]
    fn lid_angle_is_clamped() {
        assert_eq!(LidState::at(120.0).angle_degrees, LID_OPEN_DEGREES);
        assert!(LidState::at(-5.0).is_closed());
    }
}
