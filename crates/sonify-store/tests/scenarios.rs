//! Store-level scenarios: cache dedupe, catalog-miss fallback via the full
//! submit path, and the renderer-disabled degrade-to-warning contract.

use sonify_spec::{ControlsOverride, CoreServices, JobState, Metrics, SubmitRequest};
use sonify_store::{ArtifactStore, JobStore};
use std::time::Duration;
use tempfile::TempDir;

fn write_fixtures(dir: &std::path::Path) -> CoreServices {
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
    // Only a MOMENTUM_POS motif: any NEUTRAL section must fall back to a
    // synthesized filler.
    std::fs::write(
        catalog_dir.join("v1.json"),
        r#"{"version":"v1","motifs":[{"id":"pos.1","label":"MOMENTUM_POS","bars":4,"tempo_hint":null,"events":[{"t":0.0,"pitch":60,"dur":1.0,"vel":80,"chan":0}]}]}"#,
    )
    .unwrap();

    CoreServices::new(palettes_path, rules_path, catalog_dir)
}

fn request() -> SubmitRequest {
    SubmitRequest {
        series: vec![0.5, 0.5, 0.5, 0.5],
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
        render_mp3: true,
    }
}

#[tokio::test]
async fn catalog_miss_still_succeeds_end_to_end() {
    let dir = TempDir::new().unwrap();
    let services = write_fixtures(dir.path());
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

#[cfg(feature = "render-mp3")]
#[tokio::test]
async fn renderer_unavailable_degrades_to_warning_not_failure() {
    let dir = TempDir::new().unwrap();
    let services = write_fixtures(dir.path());
    let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
    let store = JobStore::new("default", artifacts, services);

    // No SONIFY_SOUNDFONT_PATH is set and no soundfont exists at the
    // default relative path, so the renderer must report Unavailable
    // rather than failing the job.
    let id = store.submit(request()).await.unwrap();
    for _ in 0..50 {
        let view = store.get(&id).await.unwrap();
        if view.state.is_terminal() {
            assert_eq!(view.state, JobState::Succeeded);
            assert!(view.artifact_urls.contains_key("midi"));
            assert!(!view.artifact_urls.contains_key("mp3"));
            assert!(view.warnings.iter().any(|w| w.contains("renderer unavailable")));
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job did not terminate in time");
}
