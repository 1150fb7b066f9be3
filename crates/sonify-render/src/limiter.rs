//! A brickwall limiter applied to the synthesized PCM before encoding.

/// Ceiling for the limiter, expressed as a linear amplitude (-1 dBFS).
const CEILING_DBFS: f64 = -1.0;

fn ceiling_linear() -> f32 {
    10f32.powf((CEILING_DBFS / 20.0) as f32)
}

/// Clamps every sample to `+/- ceiling`, in place. A true brickwall: no
/// lookahead or release, matching the renderer's best-effort contract.
pub fn apply_brickwall(samples: &mut [f32]) {
    let ceiling = ceiling_linear();
    for s in samples.iter_mut() {
        *s = s.clamp(-ceiling, ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_peaks_to_ceiling() {
        let mut samples = vec![1.5f32, -1.5, 0.1];
        apply_brickwall(&mut samples);
        let ceiling = ceiling_linear();
        assert!((samples[0] - ceiling).abs() < 1e-6);
        assert!((samples[1] + ceiling).abs() < 1e-6);
        assert_eq!(samples[2], 0.1);
    }
}
