//! Durable output artifacts produced by a job.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Midi,
    Mp3,
    Json,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Midi => "mid",
            ArtifactKind::Mp3 => "mp3",
            ArtifactKind::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub bytes_sha256: String,
    pub size: u64,
    pub created_at: String,
}
