//! Discrete event markers and their resolved musical emissions.

use serde::{Deserialize, Serialize};

/// A discrete event marker, supplied by the caller or derived automatically
/// from the [`crate::plan::SongPlan`] (e.g. a transition into
/// `VOLATILE_SPIKE`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarconEvent {
    pub time_sec: f64,
    pub kind: EarconKind,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarconKind {
    VolatilitySpike,
    MomentumShiftUp,
    MomentumShiftDown,
    SectionStart,
}

impl EarconKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarconKind::VolatilitySpike => "volatility_spike",
            EarconKind::MomentumShiftUp => "momentum_shift_up",
            EarconKind::MomentumShiftDown => "momentum_shift_down",
            EarconKind::SectionStart => "section_start",
        }
    }
}

/// A resolved earcon, scheduled on a reserved channel and snapped to the
/// 16th-note grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarconEmission {
    pub time_sec: f64,
    pub channel: u8,
    pub pitches: Vec<u8>,
    pub duration_beats: f64,
    pub velocity: u8,
}
