//! The deterministic analysis-to-MIDI pipeline: Controls Mapper -> Label
//! Decider -> Band Extractor -> Motif Selector -> Arranger -> Earcon Engine
//! -> MIDI Assembler.
//!
//! Every stage is a pure function over its inputs plus the job's derived
//! RNG; no component reaches into ambient global state.

pub mod arranger;
pub mod band_extractor;
pub mod controls_mapper;
pub mod earcon_engine;
pub mod harmony;
pub mod label_decider;
pub mod midi;
pub mod motif_selector;
pub mod rng;

pub use arranger::{arrange, ArrangementOutput};
pub use band_extractor::{extract_bands, LabeledBand};
pub use controls_mapper::map_controls;
pub use earcon_engine::{derive_events_from_plan, resolve_earcons};
pub use label_decider::{decide_label, LabelDecision, LabelModel, ModelError};
pub use midi::assemble_midi;
pub use motif_selector::select_motifs;

use sonify_spec::{
    Controls, ControlsOverride, EarconEvent, Label, Metrics, MotifCatalog, MotifChoice, Palette,
    RuleSet, Series, SongPlan,
};

/// Everything produced by a single end-to-end build, handed to the
/// job/cache store for artifact persistence.
pub struct BuildOutput {
    pub controls: Controls,
    pub primary_label: Label,
    pub model_warning: Option<String>,
    pub plan: SongPlan,
    pub section_labels: Vec<Label>,
    pub motif_choices: Vec<MotifChoice>,
    pub midi_bytes: Vec<u8>,
}

/// Runs the full pipeline for one job. `extra_earcon_events` are caller
/// supplied markers layered alongside the ones auto-derived from section
/// transitions; `fingerprint` seeds every deterministic tie-break.
pub fn build_song(
    series: &Series,
    metrics: &Metrics,
    controls_override: &ControlsOverride,
    palette: &Palette,
    rules: &RuleSet,
    catalog: &MotifCatalog,
    model: Option<&dyn LabelModel>,
    allow_ml_override: bool,
    extra_earcon_events: &[EarconEvent],
    fingerprint: &str,
) -> BuildOutput {
    let controls = map_controls(metrics, controls_override);
    let decision = decide_label(rules, metrics, model, allow_ml_override);

    let bands = extract_bands(series);
    let ArrangementOutput { mut plan, section_labels } = arrange(&bands, &controls, palette, series.len());

    let key_root_pitch = harmony::parse_pitch_class(&palette.key) + 60;
    let section_bars: Vec<i32> = plan.sections.iter().map(|s| s.length_bars).collect();
    let (motif_choices, synthetic) = select_motifs(
        &section_labels,
        &section_bars,
        &controls,
        catalog,
        fingerprint,
        key_root_pitch,
    );

    let mut events = derive_events_from_plan(&plan, &section_labels);
    events.extend_from_slice(extra_earcon_events);
    let earcons = resolve_earcons(&events, &plan, palette);

    let motif_ids: Vec<String> = motif_choices.iter().map(|c| c.motif_id.clone()).collect();
    for (section, motif_id) in plan.sections.iter_mut().zip(motif_ids.iter()) {
        section.motif_ids = vec![motif_id.clone()];
    }
    let midi_bytes = assemble_midi(
        &plan,
        &motif_ids,
        &catalog.motifs,
        &synthetic,
        &earcons,
        &controls,
        palette,
    );

    BuildOutput {
        controls,
        primary_label: decision.label,
        model_warning: decision.model_warning,
        plan,
        section_labels,
        motif_choices,
        midi_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonify_spec::{Instruments, Mode, Predicate, Rule};
    use std::collections::HashMap as Map;

    fn palette() -> Palette {
        Palette {
            slug: "synthwave".to_string(),
            key: "C".to_string(),
            mode: Mode::Major,
            tempo_range: (60, 180),
            default_tempo: 120,
            instruments: Instruments {
                lead: 81,
                pad: 90,
                bass: 38,
                perc: vec![36, 38, 42],
            },
            earcon_bank: Map::new(),
            earcon_patterns: Map::new(),
            rhythm_feel: "straight".to_string(),
            chord_progression: vec![0, 4, 5, 3],
        }
    }

    fn rules() -> RuleSet {
        RuleSet {
            rules: vec![
                Rule {
                    when: Map::from([("ctr".to_string(), Predicate::Ge { value: 0.7 })]),
                    choose_label: Label::MomentumPos,
                },
                Rule {
                    when: Map::new(),
                    choose_label: Label::Neutral,
                },
            ],
        }
    }

    fn metrics() -> Metrics {
        Metrics {
            ctr: Some(0.5),
            impressions: Some(0.5),
            position: Some(0.5),
            clicks: Some(0.5),
            volatility_index: None,
        }
    }

    #[test]
    fn end_to_end_build_is_deterministic() {
        let series = Series::new(vec![0.1, 0.4, 0.7, 0.9]).unwrap();
        let catalog = MotifCatalog {
            version: "v1".to_string(),
            motifs: vec![],
        };
        let a = build_song(
            &series,
            &metrics(),
            &ControlsOverride::default(),
            &palette(),
            &rules(),
            &catalog,
            None,
            false,
            &[],
            "fp-abc",
        );
        let b = build_song(
            &series,
            &metrics(),
            &ControlsOverride::default(),
            &palette(),
            &rules(),
            &catalog,
            None,
            false,
            &[],
            "fp-abc",
        );
        assert_eq!(a.midi_bytes, b.midi_bytes);
        assert!(a.plan.is_contiguous());
    }
}
