//! MP3 CBR encoding via `mp3lame-encoder`.

use crate::error::{RenderError, RenderResult};
use crate::synth::SAMPLE_RATE;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm};

const BITRATE: Bitrate = Bitrate::Kbps192;

/// Encodes interleaved stereo f32 PCM to MP3 CBR 192kbps.
pub fn encode_mp3(interleaved_stereo: &[f32]) -> RenderResult<Vec<u8>> {
    let mut builder = Builder::new().ok_or_else(|| RenderError::Encoder("failed to init lame builder".to_string()))?;
    builder
        .set_num_channels(2)
        .map_err(|e| RenderError::Encoder(format!("set_num_channels: {e:?}")))?;
    builder
        .set_sample_rate(SAMPLE_RATE)
        .map_err(|e| RenderError::Encoder(format!("set_sample_rate: {e:?}")))?;
    builder
        .set_brate(BITRATE)
        .map_err(|e| RenderError::Encoder(format!("set_brate: {e:?}")))?;
    builder
        .set_quality(mp3lame_encoder::Quality::Best)
        .map_err(|e| RenderError::Encoder(format!("set_quality: {e:?}")))?;

    let mut encoder = builder
        .build()
        .map_err(|e| RenderError::Encoder(format!("lame build: {e:?}")))?;

    let input = InterleavedPcm(interleaved_stereo);
    let mut mp3_out = Vec::with_capacity(interleaved_stereo.len() / 2);
    let encoded = encoder
        .encode_to_vec(input, &mut mp3_out)
        .map_err(|e| RenderError::Encoder(format!("encode: {e:?}")))?;
    let _ = encoded;

    encoder
        .flush_to_vec::<FlushNoGap>(&mut mp3_out)
        .map_err(|e| RenderError::Encoder(format!("flush: {e:?}")))?;

    Ok(mp3_out)
}
