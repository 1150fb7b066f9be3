//! End-to-end scenarios exercising the full Controls -> Label -> Arranger ->
//! Motif -> Earcon -> MIDI pipeline against literal inputs.

use sonify_engine::build_song;
use sonify_spec::{
    ControlsOverride, Instruments, Label, Metrics, Mode, Motif, MotifCatalog, MotifEvent,
    MotifSource, Palette, Predicate, Rule, RuleSet, Series,
};
use std::collections::HashMap;

fn palette(slug: &str, key: &str, mode: Mode, tempo_range: (i32, i32), default_tempo: i32) -> Palette {
    Palette {
        slug: slug.to_string(),
        key: key.to_string(),
        mode,
        tempo_range,
        default_tempo,
        instruments: Instruments {
            lead: 81,
            pad: 90,
            bass: 38,
            perc: vec![36, 38, 42],
        },
        earcon_bank: HashMap::from([("volatility_spike".to_string(), "jolt".to_string())]),
        earcon_patterns: HashMap::from([(
            "jolt".to_string(),
            sonify_spec::EarconPattern {
                pitches: vec![0, 7],
                duration_beats: 0.5,
                velocity: 100,
                percussive: false,
            },
        )]),
        rhythm_feel: "straight".to_string(),
        chord_progression: vec![0, 4, 5, 3],
    }
}

fn rules() -> RuleSet {
    RuleSet {
        rules: vec![
            Rule {
                when: HashMap::from([("ctr".to_string(), Predicate::Ge { value: 0.6 })]),
                choose_label: Label::MomentumPos,
            },
            Rule {
                when: HashMap::from([("volatility_index".to_string(), Predicate::Ge { value: 0.6 })]),
                choose_label: Label::VolatileSpike,
            },
            Rule {
                when: HashMap::from([("ctr".to_string(), Predicate::Le { value: 0.3 })]),
                choose_label: Label::MomentumNeg,
            },
            Rule {
                when: HashMap::new(),
                choose_label: Label::Neutral,
            },
        ],
    }
}

fn motif(label: Label, id: &str, bars: i32) -> Motif {
    Motif {
        id: id.to_string(),
        label,
        bars,
        tempo_hint: None,
        events: vec![MotifEvent {
            t: 0.0,
            pitch: 60,
            dur: 1.0,
            vel: 80,
            chan: 0,
        }],
    }
}

fn metrics(ctr: f64, impressions: f64, position: f64, clicks: f64, volatility: Option<f64>) -> Metrics {
    Metrics {
        ctr: Some(ctr),
        impressions: Some(impressions),
        position: Some(position),
        clicks: Some(clicks),
        volatility_index: volatility,
    }
}

#[test]
fn positive_ramp_scenario_trends_major_with_clamped_tempo() {
    let series = Series::new(vec![0.1, 0.4, 0.7, 0.9]).unwrap();
    let m = metrics(0.8, 0.7, 0.85, 0.6, Some(0.2));
    let arena_rock = palette("arena_rock", "E", Mode::Major, (120, 140), 128);
    let catalog = MotifCatalog {
        version: "v1".to_string(),
        motifs: vec![motif(Label::MomentumPos, "pos.1", 4), motif(Label::Neutral, "neu.1", 4)],
    };

    let out = build_song(
        &series,
        &m,
        &ControlsOverride::default(),
        &arena_rock,
        &rules(),
        &catalog,
        None,
        false,
        &[],
        "scenario-positive-ramp",
    );

    assert_eq!(out.primary_label, Label::MomentumPos);
    assert_eq!(out.controls.tempo_bpm, 140);
    assert!(out
        .plan
        .sections
        .iter()
        .any(|s| s.mode.is_major_family()));
    assert!(out.plan.is_contiguous());
}

#[test]
fn negative_crash_scenario_keeps_dynamics_subdued() {
    let series = Series::new(vec![0.9, 0.7, 0.4, 0.1]).unwrap();
    let m = metrics(0.2, 0.5, 0.2, 0.5, None);
    let synthwave = palette("synthwave", "C", Mode::Major, (60, 180), 120);
    let catalog = MotifCatalog {
        version: "v1".to_string(),
        motifs: vec![motif(Label::MomentumNeg, "neg.1", 4), motif(Label::Neutral, "neu.1", 4)],
    };

    let out = build_song(
        &series,
        &m,
        &ControlsOverride::default(),
        &synthwave,
        &rules(),
        &catalog,
        None,
        false,
        &[],
        "scenario-negative-crash",
    );

    assert_eq!(out.primary_label, Label::MomentumNeg);
    assert!(out.plan.sections.iter().any(|s| !s.mode.is_major_family()));
    assert!(out.plan.is_contiguous());
}

#[test]
fn catalog_miss_falls_back_to_synthetic_motif() {
    let series = Series::new(vec![0.5, 0.5, 0.5, 0.5]).unwrap();
    let m = metrics(0.5, 0.5, 0.5, 0.5, None);
    let synthwave = palette("synthwave", "C", Mode::Major, (60, 180), 120);
    // Catalog holds only a MOMENTUM_POS motif; a NEUTRAL section has nothing
    // to fall back to, forcing the synthesized filler path.
    let catalog = MotifCatalog {
        version: "v1".to_string(),
        motifs: vec![motif(Label::MomentumPos, "pos.1", 4)],
    };

    let out = build_song(
        &series,
        &m,
        &ControlsOverride::default(),
        &synthwave,
        &rules(),
        &catalog,
        None,
        false,
        &[],
        "scenario-catalog-miss",
    );

    assert!(out
        .motif_choices
        .iter()
        .any(|c| c.source == MotifSource::Synthetic && c.motif_id.starts_with("synthetic:")));
    assert!(out.plan.is_contiguous());
}
