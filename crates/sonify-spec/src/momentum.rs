//! Momentum bands: the series-derived segmentation that drives sectioning.

use crate::label::Label;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumSign {
    Positive,
    Neutral,
    Negative,
}

/// A contiguous time range with a momentum score and a coarse sign.
/// Bands cover `[0, total_duration]` with no gaps or overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumBand {
    pub t0: f64,
    pub t1: f64,
    pub sign: MomentumSign,
    pub score: f64,
}

impl MomentumBand {
    pub fn duration(&self) -> f64 {
        self.t1 - self.t0
    }
}

/// Per-band label derived purely from the momentum score, independent of
/// the primary (metrics-derived) label.
///
/// - `score >= 0.4` => `MOMENTUM_POS`
/// - `score <= -0.4` => `MOMENTUM_NEG`
/// - `|score| > 0.7` and `|score - prev_score| >= 0.6` => `VOLATILE_SPIKE`
/// - otherwise `NEUTRAL`
pub fn band_label(score: f64, prev_score: Option<f64>) -> Label {
    if score.abs() > 0.7 {
        if let Some(prev) = prev_score {
            if (score - prev).abs() >= 0.6 {
                return Label::VolatileSpike;
            }
        }
    }
    if score >= 0.4 {
        Label::MomentumPos
    } else if score <= -0.4 {
        Label::MomentumNeg
    } else {
        Label::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_threshold() {
        assert_eq!(band_label(0.4, None), Label::MomentumPos);
    }

    #[test]
    fn negative_threshold() {
        assert_eq!(band_label(-0.4, None), Label::MomentumNeg);
    }

    #[test]
    fn neutral_band() {
        assert_eq!(band_label(0.1, None), Label::Neutral);
    }

    #[test]
    fn volatile_spike_requires_jump_and_magnitude() {
        assert_eq!(band_label(0.9, Some(0.2)), Label::VolatileSpike);
        // Large magnitude but no jump: not a spike, falls back to momentum sign.
        assert_eq!(band_label(0.9, Some(0.85)), Label::MomentumPos);
        // Big jump but below the 0.7 magnitude gate: not a spike.
        assert_eq!(band_label(0.5, Some(-0.5)), Label::MomentumPos);
    }
}
