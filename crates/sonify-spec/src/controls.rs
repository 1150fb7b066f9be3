//! Derived musical controls and caller overrides.

use serde::{Deserialize, Serialize};

/// Derived musical controls, produced by the Controls Mapper and consumed
/// by every downstream stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub tempo_bpm: i32,
    pub velocity: i32,
    pub transpose: i32,
    pub filter_cc74: i32,
    pub reverb_cc91: i32,
    /// Explicit bar count, if the caller supplied one via override.
    pub bars: Option<i32>,
}

impl Controls {
    pub const TEMPO_RANGE: (i32, i32) = (60, 180);
    pub const VELOCITY_RANGE: (i32, i32) = (1, 127);
    pub const TRANSPOSE_RANGE: (i32, i32) = (-12, 12);
    pub const CC_RANGE: (i32, i32) = (0, 127);
}

fn clamp_range(v: i32, range: (i32, i32)) -> i32 {
    v.clamp(range.0, range.1)
}

impl Controls {
    pub fn clamp_all(mut self) -> Self {
        self.tempo_bpm = clamp_range(self.tempo_bpm, Self::TEMPO_RANGE);
        self.velocity = clamp_range(self.velocity, Self::VELOCITY_RANGE);
        self.transpose = clamp_range(self.transpose, Self::TRANSPOSE_RANGE);
        self.filter_cc74 = clamp_range(self.filter_cc74, Self::CC_RANGE);
        self.reverb_cc91 = clamp_range(self.reverb_cc91, Self::CC_RANGE);
        self
    }
}

/// Caller-supplied overrides, applied after the mapped fields are clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlsOverride {
    pub tempo_bpm: Option<i32>,
    pub velocity: Option<i32>,
    pub transpose: Option<i32>,
    pub bars: Option<i32>,
}

impl ControlsOverride {
    pub fn apply(&self, mut controls: Controls) -> Controls {
        if let Some(t) = self.tempo_bpm {
            controls.tempo_bpm = clamp_range(t, Controls::TEMPO_RANGE);
        }
        if let Some(v) = self.velocity {
            controls.velocity = clamp_range(v, Controls::VELOCITY_RANGE);
        }
        if let Some(tr) = self.transpose {
            controls.transpose = clamp_range(tr, Controls::TRANSPOSE_RANGE);
        }
        if let Some(b) = self.bars {
            controls.bars = Some(b);
        }
        controls
    }
}
