//! Error types shared across the sonification core.
//!
//! Every failure mode named in the core's error handling design is a
//! concrete variant here, not a string. Each variant carries a stable
//! [`ErrorCode`] so collaborators (CLI, job store) can match on it without
//! parsing messages.

use thiserror::Error;

/// Stable error codes, surfaced in job views and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Metric outside `[0,1]` or non-finite.
    InvalidMetric,
    /// Series too short, non-finite, or out of `[0,1]`.
    InvalidSeries,
    /// Palette slug not present in the loaded bundle.
    UnknownPalette,
    /// Label rules file has no trailing default rule.
    MissingRules,
    /// No motifs for a required label and no `NEUTRAL` fallback.
    CatalogEmpty,
    /// MP3 requested but synth/encode tools unavailable (non-fatal).
    RendererUnavailable,
    /// Storage write failed after retries (fatal).
    ArtifactIoError,
    /// Build exceeded its runtime budget.
    Timeout,
    /// Anything else unexpected.
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMetric => "InvalidMetric",
            ErrorCode::InvalidSeries => "InvalidSeries",
            ErrorCode::UnknownPalette => "UnknownPalette",
            ErrorCode::MissingRules => "MissingRules",
            ErrorCode::CatalogEmpty => "CatalogEmpty",
            ErrorCode::RendererUnavailable => "RendererUnavailable",
            ErrorCode::ArtifactIoError => "ArtifactIOError",
            ErrorCode::Timeout => "TimeoutError",
            ErrorCode::Internal => "InternalError",
        }
    }
}

/// The core error type returned by every fallible operation in the pipeline.
#[derive(Debug, Error)]
pub enum SonifyError {
    #[error("invalid metric {name}={value}: must be finite and in [0,1]")]
    InvalidMetric { name: String, value: f64 },

    #[error("invalid series: {reason}")]
    InvalidSeries { reason: String },

    #[error("unknown palette slug: {slug}")]
    UnknownPalette { slug: String },

    #[error("rules file {path} has no trailing default rule")]
    MissingRules { path: String },

    #[error("catalog has no motifs for label {label} and no NEUTRAL fallback")]
    CatalogEmpty { label: String },

    #[error("renderer unavailable: {reason}")]
    RendererUnavailable { reason: String },

    #[error("artifact IO error after {attempts} attempts: {source}")]
    ArtifactIoError {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("build exceeded timeout of {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SonifyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SonifyError::InvalidMetric { .. } => ErrorCode::InvalidMetric,
            SonifyError::InvalidSeries { .. } => ErrorCode::InvalidSeries,
            SonifyError::UnknownPalette { .. } => ErrorCode::UnknownPalette,
            SonifyError::MissingRules { .. } => ErrorCode::MissingRules,
            SonifyError::CatalogEmpty { .. } => ErrorCode::CatalogEmpty,
            SonifyError::RendererUnavailable { .. } => ErrorCode::RendererUnavailable,
            SonifyError::ArtifactIoError { .. } => ErrorCode::ArtifactIoError,
            SonifyError::Timeout { .. } => ErrorCode::Timeout,
            SonifyError::Internal(_) => ErrorCode::Internal,
        }
    }
}

pub type SonifyResult<T> = Result<T, SonifyError>;
