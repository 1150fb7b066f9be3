//! Error types for the optional renderer.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The soundfont file could not be loaded. Not fatal to the job: the
    /// caller should downgrade this to `mp3_url=null` and continue.
    #[error("renderer unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("invalid MIDI bytes: {0}")]
    InvalidMidi(String),

    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
