// THEORY:
// The `status` module is what the display sink reads besides frames: a per
// compartment classification of the fill level (normal, needs emptying, critically
// full) and whether the bin's warning light is on. The light and the alert class
// share one threshold, so the frame and the status text never disagree.

use crate::core_modules::bin_state::{BinState, WasteKind};

/// At or above this level a compartment needs emptying.
pub const WARNING_LEVEL: u8 = 80;
/// At or above this level a compartment is critically full and the warning light is on.
pub const ALERT_LEVEL: u8 = 90;

/// True when either compartment is at or above [`ALERT_LEVEL`].
pub fn warning_light_active(biomedical_level: u8, general_level: u8) -> bool {
    biomedical_level >= ALERT_LEVEL || general_level >= ALERT_LEVEL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "web", serde(rename_all = "lowercase"))]
pub enum FillStatus {
    Normal,
    Warning,
    Alert,
}

impl FillStatus {
    pub fn classify(level: u8) -> Self {
        if level >= ALERT_LEVEL {
            FillStatus::Alert
        } else if level >= WARNING_LEVEL {
            FillStatus::Warning
        } else {
            FillStatus::Normal
        }
    }

    /// The banner text shown for a compartment in this state, if any.
    pub fn message(self, kind: WasteKind) -> Option<String> {
        match self {
            FillStatus::Normal => None,
            FillStatus::Warning => Some(format!("{} bin needs emptying!", kind.label())),
            FillStatus::Alert => Some(format!("ALERT: {} bin critically full!", kind.label())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
pub struct CompartmentStatus {
    pub kind: WasteKind,
    pub level: u8,
    pub status: FillStatus,
    pub message: Option<String>,
}

impl CompartmentStatus {
    fn of(state: &BinState, kind: WasteKind) -> Self {
        let level = state.level(kind);
        let status = FillStatus::classify(level);
        Self {
            kind,
            level,
            status,
            message: status.message(kind),
        }
    }
}

/// Everything the page chrome needs to describe the bin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusReport {
    pub biomedical: CompartmentStatus,
    pub general: CompartmentStatus,
    pub warning_light: bool,
}

impl StatusReport {
    pub fn from_state(state: &BinState) -> Self {
        Self {
            biomedical: CompartmentStatus::of(state, WasteKind::Biomedical),
            general: CompartmentStatus::of(state, WasteKind::General),
            warning_light: warning_light_active(state.biomedical_level, state.general_level),
        }
    }

    pub fn compartment(&self, kind: WasteKind) -> &CompartmentStatus {
        match kind {
            WasteKind::Biomedical => &self.biomedical,
            WasteKind::General => &self.general,
        }
    }

    /// All non-empty banner messages, biomedical first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        [&self.biomedical, &self.general]
            .into_iter()
            .filter_map(|c| c.message.as_deref())
    }
}
