//! Optional MIDI -> MP3 rendering: soundfont synthesis, brickwall limiting,
//! MP3 CBR encoding, and a best-effort loudness check.
//!
//! Disabled or unavailable tools never fail the job: every public entry
//! point returns `Ok(None)` (via [`RenderOutcome::Unavailable`]) rather than
//! propagating the underlying error, consistent with the "job still
//! succeeds with `mp3_url=null`" contract.

pub mod encode;
pub mod error;
pub mod limiter;
pub mod loudness;
pub mod synth;

pub use error::{RenderError, RenderResult};

use std::path::Path;

pub struct RenderOutput {
    pub mp3_bytes: Vec<u8>,
    pub measured_lufs: f64,
    pub duration_sec: f64,
}

pub enum RenderOutcome {
    Rendered(RenderOutput),
    Unavailable { reason: String },
}

/// Renders assembled MIDI bytes to MP3, checking loudness and duration
/// against `expected_duration_sec`. Any failure in soundfont loading or
/// synthesizer init is caught and reported as
/// [`RenderOutcome::Unavailable`]; only encoder-level errors after a
/// successful synth propagate as `Err`.
pub fn render(midi_bytes: &[u8], soundfont_path: &Path, expected_duration_sec: f64) -> RenderResult<RenderOutcome> {
    let pcm = match synth::synthesize(midi_bytes, soundfont_path) {
        Ok(pcm) => pcm,
        Err(RenderError::Unavailable { reason }) => {
            tracing::warn!(reason, "renderer unavailable, job will have no mp3 artifact");
            return Ok(RenderOutcome::Unavailable { reason });
        }
        Err(e) => return Err(e),
    };

    let mut pcm = pcm;
    limiter::apply_brickwall(&mut pcm);

    let measured_lufs = loudness::check_loudness(&pcm, synth::SAMPLE_RATE)?;

    let frames = pcm.len() / 2;
    let duration_sec = frames as f64 / synth::SAMPLE_RATE as f64;
    if (duration_sec - expected_duration_sec).abs() > 0.5 {
        tracing::warn!(
            measured = duration_sec,
            expected = expected_duration_sec,
            "rendered duration outside +/-0.5s tolerance of the song plan"
        );
    }

    let mp3_bytes = encode::encode_mp3(&pcm)?;

    Ok(RenderOutcome::Rendered(RenderOutput {
        mp3_bytes,
        measured_lufs,
        duration_sec,
    }))
}
