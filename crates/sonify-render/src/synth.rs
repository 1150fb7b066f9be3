//! Soundfont synthesis: MIDI bytes -> 44.1kHz stereo PCM, via `rustysynth`.

use crate::error::{RenderError, RenderResult};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const SAMPLE_RATE: u32 = 44_100;

/// Synthesizes the given Standard MIDI File bytes against a soundfont,
/// returning interleaved stereo `f32` PCM.
///
/// Soundfont load failures are surfaced as [`RenderError::Unavailable`] so
/// callers can downgrade the job to `mp3_url=null` rather than fail it.
pub fn synthesize(midi_bytes: &[u8], soundfont_path: &Path) -> RenderResult<Vec<f32>> {
    let mut sf_file = std::fs::File::open(soundfont_path).map_err(|e| RenderError::Unavailable {
        reason: format!("soundfont {} unreadable: {e}", soundfont_path.display()),
    })?;
    let soundfont = Arc::new(
        rustysynth::SoundFont::new(&mut sf_file)
            .map_err(|e| RenderError::Unavailable { reason: format!("invalid soundfont: {e:?}") })?,
    );

    let mut cursor = Cursor::new(midi_bytes);
    let midi_file = Arc::new(
        rustysynth::MidiFile::new(&mut cursor)
            .map_err(|e| RenderError::InvalidMidi(format!("{e:?}")))?,
    );

    let settings = rustysynth::SynthesizerSettings::new(SAMPLE_RATE as i32);
    let synthesizer = rustysynth::Synthesizer::new(&soundfont, &settings)
        .map_err(|e| RenderError::Unavailable { reason: format!("synthesizer init failed: {e:?}") })?;
    let mut sequencer = rustysynth::MidiFileSequencer::new(synthesizer);
    sequencer.play(&midi_file, false);

    let total_frames = (midi_file.get_length() * SAMPLE_RATE as f64).ceil() as usize + SAMPLE_RATE as usize;
    let mut left = vec![0f32; total_frames];
    let mut right = vec![0f32; total_frames];
    sequencer.render(&mut left, &mut right);

    let mut interleaved = Vec::with_capacity(total_frames * 2);
    for (l, r) in left.iter().zip(right.iter()) {
        interleaved.push(*l);
        interleaved.push(*r);
    }
    Ok(interleaved)
}
