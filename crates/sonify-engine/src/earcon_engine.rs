//! Earcon Engine: discrete event markers -> scheduled musical emissions,
//! layered on top of the arrangement.

use crate::harmony::parse_pitch_class;
use sonify_spec::{EarconEmission, EarconEvent, EarconKind, Label, Palette, SongPlan};

const PERCUSSION_CHANNEL: u8 = 9;
const MELODIC_CHANNEL: u8 = 15;
const MIN_VELOCITY: u8 = 30;

/// Derives automatic earcon events from the arrangement: a
/// `volatility_spike` the moment a section labeled `VOLATILE_SPIKE` begins.
pub fn derive_events_from_plan(plan: &SongPlan, section_labels: &[Label]) -> Vec<EarconEvent> {
    let mut events = Vec::new();
    let mut elapsed_sec = 0.0;
    for (section, &label) in plan.sections.iter().zip(section_labels) {
        if label == Label::VolatileSpike {
            events.push(EarconEvent {
                time_sec: elapsed_sec,
                kind: EarconKind::VolatilitySpike,
                intensity: 1.0,
            });
        }
        let seconds_per_bar = 4.0 * 60.0 / section.tempo as f64;
        elapsed_sec += seconds_per_bar * section.length_bars as f64;
    }
    events
}

/// Finds the tempo and key in effect at `time_sec` by walking section
/// boundaries in seconds (using each section's steady-state tempo; the
/// tempo ramp synthesized by the MIDI assembler does not affect grid
/// snapping).
fn section_context_at(plan: &SongPlan, time_sec: f64) -> (i32, String) {
    let mut elapsed = 0.0;
    for section in &plan.sections {
        let seconds_per_bar = 4.0 * 60.0 / section.tempo as f64;
        let duration = seconds_per_bar * section.length_bars as f64;
        if time_sec < elapsed + duration || std::ptr::eq(section, plan.sections.last().unwrap()) {
            return (section.tempo, section.key.clone());
        }
        elapsed += duration;
    }
    let last = plan.sections.last().expect("song plan has at least one section");
    (last.tempo, last.key.clone())
}

fn snap_to_sixteenth_grid(time_sec: f64, tempo: i32) -> f64 {
    let grid_sec = 60.0 / tempo as f64 / 4.0;
    (time_sec / grid_sec).round() * grid_sec
}

/// Resolves a list of earcon events (explicit or auto-derived) into
/// scheduled emissions, snapping to the 16th-note grid, resolving pitches
/// against the active section's key, and collapsing same-slot collisions by
/// keeping the higher-intensity emission.
pub fn resolve_earcons(events: &[EarconEvent], plan: &SongPlan, palette: &Palette) -> Vec<EarconEmission> {
    let mut slots: Vec<(u64, EarconEmission, f64)> = Vec::new();

    for event in events {
        let Some(earcon_id) = palette.earcon_bank.get(event.kind.as_str()) else {
            continue;
        };
        let Some(pattern) = palette.earcon_patterns.get(earcon_id) else {
            continue;
        };

        let (tempo, key) = section_context_at(plan, event.time_sec);
        let snapped = snap_to_sixteenth_grid(event.time_sec, tempo);
        let grid_sec = 60.0 / tempo as f64 / 4.0;
        let slot_index = (snapped / grid_sec).round() as u64;

        let root_pc = parse_pitch_class(&key);
        let root_pitch: i32 = 60 + root_pc as i32;
        let pitches: Vec<u8> = pattern
            .pitches
            .iter()
            .map(|offset| (root_pitch + offset).clamp(0, 127) as u8)
            .collect();

        let velocity = ((pattern.velocity as f64 * event.intensity).round() as i32)
            .max(MIN_VELOCITY as i32)
            .min(127) as u8;

        let channel = if pattern.percussive {
            PERCUSSION_CHANNEL
        } else {
            MELODIC_CHANNEL
        };

        let emission = EarconEmission {
            time_sec: snapped,
            channel,
            pitches,
            duration_beats: pattern.duration_beats,
            velocity,
        };

        match slots.iter().position(|(slot, _, _)| *slot == slot_index) {
            Some(existing_idx) => {
                if event.intensity > slots[existing_idx].2 {
                    slots[existing_idx] = (slot_index, emission, event.intensity);
                }
                // Equal intensity: keep the one defined first (already in slots).
            }
            None => slots.push((slot_index, emission, event.intensity)),
        }
    }

    slots.sort_by_key(|(slot, _, _)| *slot);
    slots.into_iter().map(|(_, emission, _)| emission).collect()
}
