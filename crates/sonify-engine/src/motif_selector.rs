//! Motif Selector: label + controls -> one motif per section.

use crate::rng::{create_rng, derive_seed, job_seed, stable_tiebreak};
use rand::Rng;
use sonify_spec::{Controls, Label, Motif, MotifCatalog, MotifChoice, MotifEvent, MotifSource};
use std::collections::HashMap;

/// A synthesized pentatonic filler used only when a label has no catalog
/// motifs at all, not even `NEUTRAL`. Five ascending pentatonic steps over
/// the section's bar count, looping if the section is longer, with velocity
/// jitter drawn from the job-local PCG32 so repeated notes aren't identical
/// but stay reproducible for a given fingerprint.
fn synthesize_filler(label: Label, bars: i32, key_root_pitch: u8, fingerprint: &str) -> Motif {
    const PENTATONIC_STEPS: [u8; 5] = [0, 2, 4, 7, 9];
    let beats_per_bar = 4.0;
    let total_beats = bars as f64 * beats_per_bar;
    let note_dur = 1.0;
    let seed = derive_seed(job_seed(fingerprint, None), &format!("filler:{}:{}", label.as_str(), bars));
    let mut rng = create_rng(seed);
    let mut events = Vec::new();
    let mut t = 0.0;
    let mut i = 0usize;
    while t < total_beats {
        let pitch = key_root_pitch.saturating_add(PENTATONIC_STEPS[i % PENTATONIC_STEPS.len()]);
        let vel: u8 = rng.gen_range(68..=76);
        events.push(MotifEvent {
            t,
            pitch: pitch.min(108),
            dur: note_dur,
            vel,
            chan: 0,
        });
        t += note_dur;
        i += 1;
    }
    Motif {
        id: format!("synthetic:{}:{}", label.as_str(), bars),
        label,
        bars,
        events,
        tempo_hint: None,
    }
}

fn tempo_distance(motif: &Motif, requested_tempo: i32) -> f64 {
    match motif.tempo_hint {
        Some(hint) => (hint - requested_tempo).abs() as f64,
        None => f64::MAX / 2.0,
    }
}

fn rank_key(motif: &Motif, requested_tempo: i32, section_bars: i32, fingerprint: &str) -> (u64, i64, u64) {
    let tempo_dist = tempo_distance(motif, requested_tempo) as u64;
    let bars_dist = (motif.bars - section_bars).abs() as i64;
    let tiebreak = stable_tiebreak(&motif.id, fingerprint);
    (tempo_dist, bars_dist, tiebreak)
}

/// Selects one motif per section, returning the ordered choices plus any
/// synthesized filler motifs the MIDI assembler must resolve alongside the
/// catalog (since synthetic motifs never live in the catalog itself).
pub fn select_motifs(
    required_labels: &[Label],
    section_bars: &[i32],
    controls: &Controls,
    catalog: &MotifCatalog,
    fingerprint: &str,
    key_root_pitch: u8,
) -> (Vec<MotifChoice>, HashMap<String, Motif>) {
    let mut choices = Vec::with_capacity(required_labels.len());
    let mut synthetic = HashMap::new();
    let mut last_chosen_id: Option<String> = None;
    // Per effective-label exhaustible pool: selection happens without
    // replacement until the pool empties, then it refills (reuse permitted,
    // but never on two consecutive sections).
    let mut pools: HashMap<Label, Vec<Motif>> = HashMap::new();

    for (i, &label) in required_labels.iter().enumerate() {
        let bars = section_bars[i];
        let (effective_label, source) = resolve_label(catalog, label);

        let full_pool = || -> Vec<Motif> {
            let mut v: Vec<Motif> = catalog.by_label(effective_label).cloned().collect();
            v.sort_by_key(|m| rank_key(m, controls.tempo_bpm, bars, fingerprint));
            v
        };

        if catalog.by_label(effective_label).next().is_none() {
            let filler = synthesize_filler(label, bars, key_root_pitch, fingerprint);
            let id = filler.id.clone();
            synthetic.insert(id.clone(), filler);
            choices.push(MotifChoice {
                motif_id: id.clone(),
                source: MotifSource::Synthetic,
            });
            last_chosen_id = Some(id);
            continue;
        }

        let pool = pools.entry(effective_label).or_insert_with(full_pool);
        if pool.is_empty() {
            *pool = full_pool();
        }

        let pick_idx = if pool.len() > 1 {
            pool.iter()
                .position(|m| Some(&m.id) != last_chosen_id.as_ref())
                .unwrap_or(0)
        } else {
            0
        };
        let pick = pool.remove(pick_idx);

        choices.push(MotifChoice {
            motif_id: pick.id.clone(),
            source,
        });
        last_chosen_id = Some(pick.id);
    }

    (choices, synthetic)
}

fn resolve_label(catalog: &MotifCatalog, label: Label) -> (Label, MotifSource) {
    if catalog.by_label(label).next().is_some() {
        (label, MotifSource::Catalog)
    } else if catalog.by_label(Label::Neutral).next().is_some() {
        (Label::Neutral, MotifSource::Fallback)
    } else {
        (label, MotifSource::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motif(id: &str, label: Label, bars: i32, tempo_hint: Option<i32>) -> Motif {
        Motif {
            id: id.to_string(),
            label,
            bars,
            events: vec![],
            tempo_hint,
        }
    }

    fn controls(tempo: i32) -> Controls {
        Controls {
            tempo_bpm: tempo,
            velocity: 80,
            transpose: 0,
            filter_cc74: 64,
            reverb_cc91: 64,
            bars: None,
        }
    }

    #[test]
    fn catalog_miss_falls_back_to_neutral_then_synthetic() {
        let catalog = MotifCatalog {
            version: "v1".to_string(),
            motifs: vec![motif("n1", Label::Neutral, 4, Some(120))],
        };
        let (choices, synthetic) = select_motifs(
            &[Label::MomentumPos],
            &[4],
            &controls(120),
            &catalog,
            "fp",
            60,
        );
        assert_eq!(choices[0].source, MotifSource::Fallback);
        assert_eq!(choices[0].motif_id, "n1");
        assert!(synthetic.is_empty());
    }

    #[test]
    fn fully_empty_catalog_produces_synthetic_filler() {
        let catalog = MotifCatalog {
            version: "v1".to_string(),
            motifs: vec![],
        };
        let (choices, synthetic) = select_motifs(
            &[Label::MomentumPos],
            &[4],
            &controls(120),
            &catalog,
            "fp",
            60,
        );
        assert_eq!(choices[0].source, MotifSource::Synthetic);
        assert!(choices[0].motif_id.starts_with("synthetic:"));
        assert!(synthetic.contains_key(&choices[0].motif_id));
    }

    #[test]
    fn determinism_same_fingerprint_same_choice() {
        let catalog = MotifCatalog {
            version: "v1".to_string(),
            motifs: vec![
                motif("a", Label::Neutral, 4, Some(100)),
                motif("b", Label::Neutral, 4, Some(140)),
            ],
        };
        let (c1, _) = select_motifs(&[Label::Neutral], &[4], &controls(120), &catalog, "fp-x", 60);
        let (c2, _) = select_motifs(&[Label::Neutral], &[4], &controls(120), &catalog, "fp-x", 60);
        assert_eq!(c1[0].motif_id, c2[0].motif_id);
    }

    #[test]
    fn never_repeats_consecutively_when_pool_has_alternatives() {
        let catalog = MotifCatalog {
            version: "v1".to_string(),
            motifs: vec![
                motif("a", Label::Neutral, 4, Some(120)),
                motif("b", Label::Neutral, 4, Some(120)),
            ],
        };
        let (choices, _) = select_motifs(
            &[Label::Neutral, Label::Neutral, Label::Neutral],
            &[4, 4, 4],
            &controls(120),
            &catalog,
            "fp",
            60,
        );
        for w in choices.windows(2) {
            assert_ne!(w[0].motif_id, w[1].motif_id);
        }
    }
}
