//! Band Extractor: derives contiguous [`MomentumBand`]s from the raw
//! series. The series dominates sectioning; metrics dominate tempo and
//! velocity (see [`crate::controls_mapper`]).

use sonify_spec::{band_label, Label, MomentumBand, MomentumSign, Series};

/// Scale factor turning a one-step series delta into a `[-1,1]` momentum
/// score. Chosen so that a delta of 0.25 (a quarter of the full range)
/// saturates the score.
const SCORE_SCALE: f64 = 4.0;

pub struct LabeledBand {
    pub band: MomentumBand,
    pub label: Label,
}

/// Extracts one momentum score per adjacent sample pair, then merges
/// consecutive pairs that carry the same label into a single band. Bands
/// are contiguous over `[0, series.len()-1]` (one time unit per sample
/// step) with no gaps or overlaps.
pub fn extract_bands(series: &Series) -> Vec<LabeledBand> {
    let values = series.as_slice();
    if values.len() < 2 {
        return Vec::new();
    }

    let mut raw: Vec<(f64, f64, f64, Label)> = Vec::with_capacity(values.len() - 1);
    let mut prev_score: Option<f64> = None;
    for i in 0..values.len() - 1 {
        let delta = values[i + 1] - values[i];
        let score = (delta * SCORE_SCALE).clamp(-1.0, 1.0);
        let label = band_label(score, prev_score);
        raw.push((i as f64, (i + 1) as f64, score, label));
        prev_score = Some(score);
    }

    let mut merged: Vec<LabeledBand> = Vec::new();
    for (t0, t1, score, label) in raw {
        if let Some(last) = merged.last_mut() {
            if last.label == label && last.band.t1 == t0 {
                let n = (last.band.t1 - last.band.t0) + (t1 - t0);
                let prev_weight = last.band.t1 - last.band.t0;
                last.band.score = (last.band.score * prev_weight + score * (t1 - t0)) / n;
                last.band.t1 = t1;
                continue;
            }
        }
        merged.push(LabeledBand {
            band: MomentumBand {
                t0,
                t1,
                sign: sign_for(score),
                score,
            },
            label,
        });
    }
    merged
}

fn sign_for(score: f64) -> MomentumSign {
    if score > 0.05 {
        MomentumSign::Positive
    } else if score < -0.05 {
        MomentumSign::Negative
    } else {
        MomentumSign::Neutral
    }
}
