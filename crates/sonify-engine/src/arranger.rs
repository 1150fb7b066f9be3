//! Arranger: momentum bands + controls + palette -> [`SongPlan`].
//!
//! Total bars, sectioning, key/mode per section, tempo, chord grid, and
//! dynamics all follow the contract in the core design. One documented
//! assumption fills a gap the distilled spec leaves open: the series is
//! treated as one sample per second, so `total_duration_sec = series_len - 1`.

use crate::band_extractor::LabeledBand;
use crate::harmony::{choose_inversion, parse_pitch_class, relative_minor_pitch_class};
use sonify_spec::{ChordSymbol, Controls, Dynamics, Label, Mode, Palette, Section, SongPlan};

const MIN_BARS: i32 = 8;
const MAX_BARS: i32 = 64;
const MIN_SECTION_BARS: i32 = 2;

struct RawSection {
    label: Label,
    score: f64,
    weight: f64,
}

pub fn compute_total_bars(controls: &Controls, total_duration_sec: f64) -> i32 {
    if let Some(bars) = controls.bars {
        return bars.clamp(1, MAX_BARS);
    }
    let computed = (total_duration_sec * controls.tempo_bpm as f64 / 60.0 / 4.0).round() as i32;
    computed.max(MIN_BARS).min(MAX_BARS)
}

/// Builds the song plan. `series_len` is the length of the input series,
/// used only to derive `total_duration_sec` when no explicit bar count is
/// supplied.
/// The song plan plus the per-section label that drove its key/mode/chords
/// — needed downstream by the motif selector and earcon engine, which
/// don't otherwise have a way to recover "what label is this section".
pub struct ArrangementOutput {
    pub plan: SongPlan,
    pub section_labels: Vec<Label>,
}

pub fn arrange(
    bands: &[LabeledBand],
    controls: &Controls,
    palette: &Palette,
    series_len: usize,
) -> ArrangementOutput {
    let total_duration_sec = (series_len.saturating_sub(1)).max(1) as f64;
    let total_bars = compute_total_bars(controls, total_duration_sec);

    let raw_sections: Vec<RawSection> = if bands.is_empty() {
        vec![RawSection {
            label: Label::Neutral,
            score: 0.0,
            weight: 1.0,
        }]
    } else {
        bands
            .iter()
            .map(|b| RawSection {
                label: b.label,
                score: b.band.score,
                weight: (b.band.t1 - b.band.t0).max(1e-9),
            })
            .collect()
    };

    let bars_alloc = allocate_bars(&raw_sections, total_bars);
    let merged = merge_short_sections(raw_sections, bars_alloc);

    let key_root_pc = parse_pitch_class(&palette.key);
    let key_root_pitch: i32 = 60 + key_root_pc as i32;

    let mut sections = Vec::with_capacity(merged.len());
    let mut start_bar = 0;
    let mut prev_bass: Option<i32> = None;
    let mut prev_label: Option<Label> = None;

    for (idx, sec) in merged.iter().enumerate() {
        let (key, mode, section_root_pitch) = key_mode_for(sec.label, palette, key_root_pc, key_root_pitch);
        let tempo = palette.clamp_tempo(controls.tempo_bpm + (sec.score * 10.0).round() as i32);
        let dynamics = Dynamics::from_abs_score(sec.score.abs());

        let mut chord_grid = Vec::with_capacity(sec.bars as usize);
        for bar in 0..sec.bars {
            let degree = palette.chord_progression[(bar as usize) % palette.chord_progression.len().max(1)];
            let inversion = choose_inversion(section_root_pitch, degree, prev_bass);
            let chord = ChordSymbol {
                degree,
                inversion,
                borrowed: false,
            };
            prev_bass = Some(crate::harmony::chord_bass_pitch(section_root_pitch, &chord));
            chord_grid.push(chord);
        }

        // Borrowed IV->iv cadence in the last bar of the *outgoing* section
        // when transitioning into a negative section from a positive one.
        if sec.label == Label::MomentumNeg && prev_label == Some(Label::MomentumPos) {
            if let Some(prev_section) = sections.last_mut() {
                let prev_section: &mut Section = prev_section;
                if let Some(last_chord) = prev_section.chord_grid.last_mut() {
                    last_chord.degree = 3;
                    last_chord.borrowed = true;
                }
            }
        }

        sections.push(Section {
            start_bar,
            length_bars: sec.bars,
            key,
            mode,
            tempo,
            chord_grid,
            motif_ids: Vec::new(),
            dynamics,
        });
        start_bar += sec.bars;
        prev_label = Some(sec.label);
        let _ = idx;
    }

    let section_labels = merged.iter().map(|s| s.label).collect();

    ArrangementOutput {
        plan: SongPlan {
            total_bars,
            sections,
        },
        section_labels,
    }
}

fn key_mode_for(label: Label, palette: &Palette, key_root_pc: u8, key_root_pitch: i32) -> (String, Mode, i32) {
    match label {
        Label::MomentumPos => {
            let mode = if palette.mode.is_major_family() {
                palette.mode
            } else {
                Mode::Major
            };
            (palette.key.clone(), mode, key_root_pitch)
        }
        Label::MomentumNeg => {
            let minor_pc = relative_minor_pitch_class(key_root_pc);
            (pitch_class_name(minor_pc), Mode::Minor, 60 + minor_pc as i32)
        }
        Label::Neutral => (palette.key.clone(), palette.mode, key_root_pitch),
        Label::VolatileSpike => (palette.key.clone(), palette.mode.parallel_shift(), key_root_pitch),
    }
}

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

fn pitch_class_name(pc: u8) -> String {
    PITCH_CLASS_NAMES[(pc % 12) as usize].to_string()
}

/// Largest-remainder allocation of `total_bars` across sections weighted by
/// their time-span, guaranteeing the sum equals `total_bars` exactly.
fn allocate_bars(sections: &[RawSection], total_bars: i32) -> Vec<i32> {
    let total_weight: f64 = sections.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 || sections.is_empty() {
        return vec![total_bars.max(1)];
    }
    let raw: Vec<f64> = sections
        .iter()
        .map(|s| s.weight / total_weight * total_bars as f64)
        .collect();
    let mut floors: Vec<i32> = raw.iter().map(|r| r.floor() as i32).collect();
    let mut remainder = total_bars - floors.iter().sum::<i32>();

    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by(|&a, &b| {
        (raw[b] - floors[b] as f64)
            .partial_cmp(&(raw[a] - floors[a] as f64))
            .unwrap()
            .then(a.cmp(&b))
    });
    for &i in order.iter() {
        if remainder <= 0 {
            break;
        }
        floors[i] += 1;
        remainder -= 1;
    }
    // Ensure every section has at least 1 bar.
    for f in floors.iter_mut() {
        if *f < 1 {
            *f = 1;
        }
    }
    floors
}

struct MergedSection {
    label: Label,
    score: f64,
    bars: i32,
}

/// Merges any section shorter than [`MIN_SECTION_BARS`] into a neighbor,
/// preferring one with the same label; falls back to the left neighbor,
/// then the right.
fn merge_short_sections(raw: Vec<RawSection>, bars: Vec<i32>) -> Vec<MergedSection> {
    let mut merged: Vec<MergedSection> = raw
        .into_iter()
        .zip(bars)
        .map(|(r, b)| MergedSection {
            label: r.label,
            score: r.score,
            bars: b,
        })
        .collect();

    loop {
        let Some(idx) = merged.iter().position(|s| s.bars < MIN_SECTION_BARS) else {
            break;
        };
        if merged.len() == 1 {
            break;
        }
        let same_left = idx > 0 && merged[idx - 1].label == merged[idx].label;
        let same_right = idx + 1 < merged.len() && merged[idx + 1].label == merged[idx].label;

        let target = if same_left {
            idx - 1
        } else if same_right {
            idx + 1
        } else if idx > 0 {
            idx - 1
        } else {
            idx + 1
        };

        let removed = merged.remove(idx);
        let target_idx = if target > idx { target - 1 } else { target };
        let t = &mut merged[target_idx];
        let total = t.bars + removed.bars;
        t.score = (t.score * t.bars as f64 + removed.score * removed.bars as f64) / total as f64;
        t.bars = total;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonify_spec::Instruments;
    use std::collections::HashMap;

    fn palette() -> Palette {
        Palette {
            slug: "synthwave".to_string(),
            key: "C".to_string(),
            mode: Mode::Major,
            tempo_range: (100, 120),
            default_tempo: 110,
            instruments: Instruments {
                lead: 81,
                pad: 90,
                bass: 38,
                perc: vec![36, 38, 42],
            },
            earcon_bank: HashMap::new(),
            earcon_patterns: HashMap::new(),
            rhythm_feel: "straight".to_string(),
            chord_progression: vec![0, 4, 5, 3],
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
    fn no_bands_is_one_section() {
        let plan = arrange(&[], &controls(120), &palette(), 4).plan;
        assert_eq!(plan.sections.len(), 1);
        assert!(plan.is_contiguous());
    }

    #[test]
    fn plan_is_always_contiguous() {
        let bands = crate::band_extractor::extract_bands(
            &sonify_spec::Series::new(vec![0.4, 0.45, 0.95, 0.5, 0.5, 0.5]).unwrap(),
        );
        let plan = arrange(&bands, &controls(120), &palette(), 6).plan;
        assert!(plan.is_contiguous());
        assert_eq!(plan.covered_bars(), plan.total_bars);
    }

    #[test]
    fn tempo_stays_within_palette_range() {
        let bands = crate::band_extractor::extract_bands(
            &sonify_spec::Series::new(vec![0.1, 0.4, 0.7, 0.9]).unwrap(),
        );
        let plan = arrange(&bands, &controls(156), &palette(), 4).plan;
        for s in &plan.sections {
            assert!(s.tempo >= palette().tempo_range.0 && s.tempo <= palette().tempo_range.1);
        }
    }

    #[test]
    fn negative_crash_gets_relative_minor_and_cadence() {
        // A positive section followed by a negative one should trigger the
        // borrowed IV->iv cadence in the positive section's last bar.
        let bands = crate::band_extractor::extract_bands(
            &sonify_spec::Series::new(vec![0.2, 0.5, 0.8, 0.6, 0.3, 0.1]).unwrap(),
        );
        let plan = arrange(&bands, &controls(110), &palette(), 6).plan;
        let has_minor_section = plan.sections.iter().any(|s| s.mode == Mode::Minor);
        assert!(has_minor_section || plan.sections.len() == 1);
    }
}
