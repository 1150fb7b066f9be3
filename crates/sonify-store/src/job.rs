//! Job state machine: `queued -> running -> succeeded|failed`, with
//! at-most-one concurrent build per fingerprint and a bounded worker pool.

use crate::cache::{artifact_key, ArtifactStore};
use crate::error::{StoreError, StoreResult};
use crate::retry::with_retry;
use sonify_engine::LabelModel;
use sonify_spec::{
    hash::canonical_value_hash, ArtifactKind, CoreServices, JobState, JobView, SubmitRequest,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock, Semaphore};

/// A failed job younger than this is returned as-is on resubmission rather
/// than rebuilt; older than this, resubmission triggers a fresh attempt.
pub const RETRY_WINDOW: Duration = Duration::from_secs(300);

/// Default worker pool size (`W` in the concurrency model).
pub const DEFAULT_WORKERS: usize = 4;

/// Bounded runtime budget for a single build (`T_max`). A build still
/// running past this is aborted and the job is marked `failed` with a
/// `TimeoutError`, rather than left running indefinitely against a stuck
/// renderer or pathological input.
pub const T_MAX: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
struct JobRecord {
    job_id: String,
    fingerprint: String,
    state: JobState,
    attempt: u32,
    created_at_epoch: u64,
    updated_at_epoch: u64,
    artifact_keys: BTreeMap<String, String>,
    error: Option<String>,
    warnings: Vec<String>,
}

fn now_epoch() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn epoch_to_rfc3339(epoch: u64) -> String {
    chrono::DateTime::from_timestamp(epoch as i64, 0)
        .unwrap_or_default()
        .to_rfc3339()
}

pub struct JobStore {
    tenant: String,
    artifacts: Arc<ArtifactStore>,
    services: Arc<CoreServices>,
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
    fingerprint_index: Arc<Mutex<HashMap<String, String>>>,
    worker_pool: Arc<Semaphore>,
    model: Option<Arc<dyn LabelModel + Send + Sync>>,
}

impl JobStore {
    pub fn new(tenant: impl Into<String>, artifacts: ArtifactStore, services: CoreServices) -> Self {
        JobStore {
            tenant: tenant.into(),
            artifacts: Arc::new(artifacts),
            services: Arc::new(services),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            fingerprint_index: Arc::new(Mutex::new(HashMap::new())),
            worker_pool: Arc::new(Semaphore::new(DEFAULT_WORKERS)),
            model: None,
        }
    }

    pub fn with_label_model(mut self, model: Arc<dyn LabelModel + Send + Sync>) -> Self {
        self.model = Some(model);
        self
    }

    fn fingerprint(request: &SubmitRequest) -> String {
        canonical_value_hash(&request.canonical_value())
    }

    /// Submits a job, returning its id. Fingerprint-identical submissions
    /// are deduplicated per the store's cache-hit/at-most-one-running/retry
    /// window contract.
    pub async fn submit(&self, request: SubmitRequest) -> StoreResult<String> {
        let fingerprint = Self::fingerprint(&request);
        let mut index = self.fingerprint_index.lock().await;

        if let Some(existing_id) = index.get(&fingerprint).cloned() {
            let jobs = self.jobs.read().await;
            if let Some(record) = jobs.get(&existing_id) {
                match record.state {
                    JobState::Succeeded if !record.artifact_keys.is_empty() => return Ok(existing_id),
                    JobState::Running | JobState::Queued => return Ok(existing_id),
                    JobState::Failed => {
                        let age = now_epoch().saturating_sub(record.updated_at_epoch);
                        if age < RETRY_WINDOW.as_secs() {
                            return Ok(existing_id);
                        }
                        // Falls through: stale failure, re-run below.
                    }
                    JobState::Succeeded => {
                        // Succeeded with no artifacts recorded is treated as
                        // a data inconsistency; fall through and rebuild.
                    }
                }
            }
        }
        drop(index);

        let job_id = format!("job-{fingerprint}");
        let now = now_epoch();
        let record = JobRecord {
            job_id: job_id.clone(),
            fingerprint: fingerprint.clone(),
            state: JobState::Queued,
            attempt: 0,
            created_at_epoch: now,
            updated_at_epoch: now,
            artifact_keys: BTreeMap::new(),
            error: None,
            warnings: Vec::new(),
        };

        self.jobs.write().await.insert(job_id.clone(), record);
        self.fingerprint_index.lock().await.insert(fingerprint, job_id.clone());

        self.spawn_build(job_id.clone(), request);
        Ok(job_id)
    }

    fn spawn_build(&self, job_id: String, request: SubmitRequest) {
        let jobs = self.jobs.clone();
        let artifacts = self.artifacts.clone();
        let services = self.services.clone();
        let worker_pool = self.worker_pool.clone();
        let tenant = self.tenant.clone();
        let model = self.model.clone();

        tokio::spawn(async move {
            let _permit = worker_pool.acquire().await.expect("semaphore never closed");

            {
                let mut jobs = jobs.write().await;
                if let Some(record) = jobs.get_mut(&job_id) {
                    record.state = JobState::Running;
                    record.attempt += 1;
                    record.updated_at_epoch = now_epoch();
                }
            }

            let build = run_build(&tenant, &job_id, &request, &services, &artifacts, model.as_deref());
            let result = match tokio::time::timeout(T_MAX, build).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Core(sonify_spec::SonifyError::Timeout {
                    limit_ms: T_MAX.as_millis() as u64,
                })),
            };

            let mut jobs = jobs.write().await;
            if let Some(record) = jobs.get_mut(&job_id) {
                record.updated_at_epoch = now_epoch();
                match result {
                    Ok((artifact_keys, warnings)) => {
                        record.state = JobState::Succeeded;
                        record.artifact_keys = artifact_keys;
                        record.warnings = warnings;
                    }
                    Err(e) => {
                        record.state = JobState::Failed;
                        record.error = Some(e.to_string());
                    }
                }
            }
        });
    }

    /// Exposes the shared palette/rules/catalog services, e.g. for a CLI's
    /// `palettes`/`catalog` listing commands that don't need a job.
    pub fn services(&self) -> &CoreServices {
        &self.services
    }

    pub async fn get(&self, job_id: &str) -> StoreResult<JobView> {
        let jobs = self.jobs.read().await;
        let record = jobs.get(job_id).ok_or_else(|| StoreError::JobNotFound {
            job_id: job_id.to_string(),
        })?;

        let mut artifact_urls = BTreeMap::new();
        for (name, key) in &record.artifact_keys {
            artifact_urls.insert(name.clone(), self.artifacts.get_signed_url(key, 3600));
        }

        Ok(JobView {
            job_id: record.job_id.clone(),
            state: record.state,
            fingerprint: record.fingerprint.clone(),
            artifact_urls,
            error: record.error.clone(),
            warnings: record.warnings.clone(),
            created_at: epoch_to_rfc3339(record.created_at_epoch),
            updated_at: epoch_to_rfc3339(record.updated_at_epoch),
        })
    }

    /// Cancels a job still in `queued` state. Once `running`, the build
    /// runs to completion per the cancellation contract.
    pub async fn cancel(&self, job_id: &str) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let record = jobs.get_mut(job_id).ok_or_else(|| StoreError::JobNotFound {
            job_id: job_id.to_string(),
        })?;
        if record.state != JobState::Queued {
            return Err(StoreError::NotCancellable {
                job_id: job_id.to_string(),
                state: record.state,
            });
        }
        record.state = JobState::Failed;
        record.error = Some("cancelled".to_string());
        record.updated_at_epoch = now_epoch();
        Ok(())
    }

    /// Removes failed jobs older than the retry window from the in-memory
    /// table, along with their fingerprint index entries. A maintenance
    /// operation; artifacts already written for a failed job (none, by
    /// construction) are untouched.
    pub async fn prune_failed(&self) -> usize {
        let cutoff = now_epoch().saturating_sub(RETRY_WINDOW.as_secs());
        let mut jobs = self.jobs.write().await;
        let mut index = self.fingerprint_index.lock().await;

        let stale: Vec<String> = jobs
            .values()
            .filter(|r| r.state == JobState::Failed && r.updated_at_epoch < cutoff)
            .map(|r| r.job_id.clone())
            .collect();

        for job_id in &stale {
            if let Some(record) = jobs.remove(job_id) {
                index.remove(&record.fingerprint);
            }
        }
        stale.len()
    }
}

async fn run_build(
    tenant: &str,
    job_id: &str,
    request: &SubmitRequest,
    services: &CoreServices,
    artifacts: &ArtifactStore,
    model: Option<&(dyn LabelModel + Send + Sync)>,
) -> StoreResult<(BTreeMap<String, String>, Vec<String>)> {
    let series = sonify_spec::Series::new(request.series.clone())?;
    let palette = services.palette(&request.palette_slug)?;
    let rules = services.rules()?;
    let catalog = services.catalog(request.catalog_version.as_deref())?;

    let fingerprint = JobStore::fingerprint(request);
    let model_dyn: Option<&dyn LabelModel> = model.map(|m| m as &dyn LabelModel);

    let output = sonify_engine::build_song(
        &series,
        &request.metrics,
        &request.controls_override,
        &palette,
        &rules,
        &catalog,
        model_dyn,
        true,
        &[],
        &fingerprint,
    );

    let mut warnings = Vec::new();
    if let Some(w) = output.model_warning {
        warnings.push(w);
    }

    let mut artifact_keys = BTreeMap::new();
    if let Err(e) = write_artifacts(tenant, job_id, &output, artifacts, request, &mut artifact_keys, &mut warnings).await
    {
        // Roll back every artifact already written under this job's key
        // before the state flip to `failed`, so a mid-build failure never
        // leaves orphaned bytes behind.
        for key in artifact_keys.values() {
            let _ = artifacts.delete(key);
        }
        return Err(e);
    }

    Ok((artifact_keys, warnings))
}

/// Writes every artifact for a completed build, in order, recording each
/// key as it lands so the caller can roll back a partial write set on
/// failure.
async fn write_artifacts(
    tenant: &str,
    job_id: &str,
    output: &sonify_engine::BuildOutput,
    artifacts: &ArtifactStore,
    request: &SubmitRequest,
    artifact_keys: &mut BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> StoreResult<()> {
    let midi_key = artifact_key(tenant, job_id, ArtifactKind::Midi);
    let midi_bytes = output.midi_bytes.clone();
    with_retry(|| {
        let artifacts = artifacts;
        let midi_key = midi_key.clone();
        let midi_bytes = midi_bytes.clone();
        async move { artifacts.put_atomic(&midi_key, &midi_bytes, ArtifactKind::Midi) }
    })
    .await?;
    artifact_keys.insert("midi".to_string(), midi_key);

    let plan_json = serde_json::to_vec_pretty(&output.plan).map_err(|e| {
        StoreError::Core(sonify_spec::SonifyError::Internal(format!("plan serialization failed: {e}")))
    })?;
    let plan_key = artifact_key(tenant, job_id, ArtifactKind::Json);
    with_retry(|| {
        let artifacts = artifacts;
        let plan_key = plan_key.clone();
        let plan_json = plan_json.clone();
        async move { artifacts.put_atomic(&plan_key, &plan_json, ArtifactKind::Json) }
    })
    .await?;
    artifact_keys.insert("plan_json".to_string(), plan_key);

    #[cfg(feature = "render-mp3")]
    if request.render_mp3 {
        render_and_store(tenant, job_id, output, artifacts, artifact_keys, warnings);
    }

    Ok(())
}

/// Renders the assembled MIDI to MP3 and stores it, if the renderer is
/// available. A missing soundfont or synth failure downgrades to a warning
/// rather than failing the job, per the renderer's non-fatal contract.
#[cfg(feature = "render-mp3")]
fn render_and_store(
    tenant: &str,
    job_id: &str,
    output: &sonify_engine::BuildOutput,
    artifacts: &ArtifactStore,
    artifact_keys: &mut BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) {
    let soundfont_path = sonify_spec::config::env_path_or("SONIFY_SOUNDFONT_PATH", "assets/default.sf2");
    let expected_duration_sec = output.plan.total_bars as f64 * 4.0 * 60.0
        / output.plan.sections.first().map(|s| s.tempo).unwrap_or(120) as f64;

    match sonify_render::render(&output.midi_bytes, &soundfont_path, expected_duration_sec) {
        Ok(sonify_render::RenderOutcome::Rendered(rendered)) => {
            let mp3_key = artifact_key(tenant, job_id, ArtifactKind::Mp3);
            if let Err(e) = artifacts.put_atomic(&mp3_key, &rendered.mp3_bytes, ArtifactKind::Mp3) {
                warnings.push(format!("mp3 render succeeded but storage failed: {e}"));
            } else {
                artifact_keys.insert("mp3".to_string(), mp3_key);
            }
        }
        Ok(sonify_render::RenderOutcome::Unavailable { reason }) => {
            warnings.push(format!("renderer unavailable: {reason}"));
        }
        Err(e) => {
            warnings.push(format!("mp3 render failed: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonify_spec::{ControlsOverride, Metrics};
    use tempfile::TempDir;

    fn services_with_fixtures(dir: &std::path::Path) -> CoreServices {
        let palettes_path = dir.join("palettes.yaml");
        std::fs::write(
            &palettes_path,
            r#"
- slug: synthwave
  key: C
  mode: major
  tempo_range: [60, 180]
  default_tempo: 120
  instruments: { lead: 81, pad: 90, bass: 38, perc: [36, 38, 42] }
  earcon_bank: {}
  earcon_patterns: {}
  rhythm_feel: straight
  chord_progression: [0, 4, 5, 3]
"#,
        )
        .unwrap();

        let rules_path = dir.join("rules.yaml");
        std::fs::write(
            &rules_path,
            r#"
rules:
  - when: {}
    choose_label: NEUTRAL
"#,
        )
        .unwrap();

        let catalog_dir = dir.join("catalogs");
        std::fs::create_dir_all(&catalog_dir).unwrap();
        std::fs::write(
            catalog_dir.join("v1.json"),
            r#"{"version":"v1","motifs":[]}"#,
        )
        .unwrap();

        CoreServices::new(palettes_path, rules_path, catalog_dir)
    }

    fn request() -> SubmitRequest {
        SubmitRequest {
            series: vec![0.1, 0.4, 0.7, 0.9],
            metrics: Metrics {
                ctr: Some(0.5),
                impressions: Some(0.5),
                position: Some(0.5),
                clicks: Some(0.5),
                volatility_index: None,
            },
            palette_slug: "synthwave".to_string(),
            controls_override: ControlsOverride::default(),
            catalog_version: Some("v1".to_string()),
            seed: None,
            render_mp3: false,
        }
    }

    #[tokio::test]
    async fn submit_twice_dedupes_to_same_job_id() {
        let dir = TempDir::new().unwrap();
        let services = services_with_fixtures(dir.path());
        let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
        let store = JobStore::new("default", artifacts, services);

        let id1 = store.submit(request()).await.unwrap();
        let id2 = store.submit(request()).await.unwrap();
        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn submitted_job_eventually_succeeds() {
        let dir = TempDir::new().unwrap();
        let services = services_with_fixtures(dir.path());
        let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
        let store = JobStore::new("default", artifacts, services);

        let id = store.submit(request()).await.unwrap();
        for _ in 0..50 {
            let view = store.get(&id).await.unwrap();
            if view.state.is_terminal() {
                assert_eq!(view.state, JobState::Succeeded);
                assert!(view.artifact_urls.contains_key("midi"));
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job did not terminate in time");
    }

    #[tokio::test]
    async fn failed_plan_write_cleans_up_already_written_midi_artifact() {
        let dir = TempDir::new().unwrap();
        let services = services_with_fixtures(dir.path());
        let artifacts_root = dir.path().join("artifacts");
        let artifacts = ArtifactStore::new(&artifacts_root);

        let tenant = "default";
        let req = request();
        let fingerprint = JobStore::fingerprint(&req);
        let job_id = format!("job-{fingerprint}");

        // Pre-create a directory at the plan artifact's path so its write
        // fails with the midi artifact already on disk.
        let plan_key = artifact_key(tenant, &job_id, ArtifactKind::Json);
        std::fs::create_dir_all(artifacts_root.join(&plan_key)).unwrap();

        let result = run_build(tenant, &job_id, &req, &services, &artifacts, None).await;
        assert!(result.is_err());

        let midi_key = artifact_key(tenant, &job_id, ArtifactKind::Midi);
        assert!(!artifacts.exists(&midi_key), "orphaned midi artifact was not cleaned up");
    }

    #[tokio::test]
    async fn unknown_job_id_errors() {
        let dir = TempDir::new().unwrap();
        let services = services_with_fixtures(dir.path());
        let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
        let store = JobStore::new("default", artifacts, services);
        assert!(store.get("nope").await.is_err());
    }
}
