//! Best-effort integrated loudness measurement against the documented
//! -14 LUFS target. A deviation beyond 3 LU only logs a warning; it never
//! fails the render.

use crate::error::{RenderError, RenderResult};

pub const TARGET_LUFS: f64 = -14.0;
pub const MAX_DEVIATION_LU: f64 = 3.0;

/// Measures integrated loudness over interleaved stereo f32 samples and
/// warns (via `tracing`) if it deviates from [`TARGET_LUFS`] by more than
/// [`MAX_DEVIATION_LU`]. Returns the measured value.
pub fn check_loudness(interleaved_stereo: &[f32], sample_rate: u32) -> RenderResult<f64> {
    let mut meter = ebur128::EbuR128::new(2, sample_rate, ebur128::Mode::I)
        .map_err(|e| RenderError::Encoder(format!("loudness meter init failed: {e:?}")))?;
    meter
        .add_frames_f32(interleaved_stereo)
        .map_err(|e| RenderError::Encoder(format!("loudness measurement failed: {e:?}")))?;
    let lufs = meter
        .loudness_global()
        .map_err(|e| RenderError::Encoder(format!("loudness readout failed: {e:?}")))?;

    let deviation = (lufs - TARGET_LUFS).abs();
    if deviation > MAX_DEVIATION_LU {
        tracing::warn!(
            measured_lufs = lufs,
            target_lufs = TARGET_LUFS,
            deviation_lu = deviation,
            "rendered loudness deviates from target beyond tolerance"
        );
    }
    Ok(lufs)
}
