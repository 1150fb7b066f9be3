//! Job request/view types — the public shape submitted to and read back
//! from the job store.

use crate::controls::ControlsOverride;
use crate::series::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The caller-facing submission payload (see `§6.1` of the core design).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub series: Vec<f64>,
    pub metrics: Metrics,
    pub palette_slug: String,
    #[serde(default)]
    pub controls_override: ControlsOverride,
    pub catalog_version: Option<String>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub render_mp3: bool,
}

impl SubmitRequest {
    /// Canonical JSON value used to compute the job fingerprint. Field
    /// order is irrelevant (canonicalization sorts keys); array order
    /// (`series`) is significant.
    pub fn canonical_value(&self) -> serde_json::Value {
        serde_json::json!({
            "series": self.series,
            "metrics": serde_json::to_value(self.metrics).unwrap_or(serde_json::Value::Null),
            "palette_slug": self.palette_slug,
            "controls_override": serde_json::to_value(self.controls_override).unwrap_or(serde_json::Value::Null),
            "catalog_version": self.catalog_version,
            "seed": self.seed,
            "render_mp3": self.render_mp3,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: String,
    pub state: JobState,
    pub fingerprint: String,
    pub artifact_urls: BTreeMap<String, String>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}
