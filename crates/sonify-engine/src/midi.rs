//! MIDI Assembler: SongPlan + motifs + earcon emissions + Controls ->
//! Standard MIDI File bytes (format 1, PPQ=480).
//!
//! Byte layout follows the classic SMF writer shape: a track is built as a
//! flat list of `(absolute_tick, event_bytes)` pairs, sorted stably by tick,
//! then delta-encoded on write. No wall-clock input ever enters the byte
//! stream, so identical inputs always produce identical bytes.

use byteorder::{BigEndian, WriteBytesExt};
use sonify_spec::{Controls, EarconEmission, Motif, MotifEvent, Palette, Section, SongPlan};
use std::collections::HashMap;
use std::io::Write;

pub const PPQ: u16 = 480;
const MIN_PITCH: i32 = 21;
const MAX_PITCH: i32 = 108;

const NUM_TRACKS: usize = 5;

/// One scheduled MIDI event at an absolute tick. Ties at the same tick are
/// broken by `order`, which callers set to the emission order so that
/// same-tick note-offs precede note-ons and program/CC changes precede notes.
struct TrackEvent {
    tick: u64,
    order: u32,
    bytes: Vec<u8>,
}

struct TrackBuilder {
    events: Vec<TrackEvent>,
    seq: u32,
}

impl TrackBuilder {
    fn new() -> Self {
        TrackBuilder {
            events: Vec::new(),
            seq: 0,
        }
    }

    fn push(&mut self, tick: u64, bytes: Vec<u8>) {
        self.events.push(TrackEvent {
            tick,
            order: self.seq,
            bytes,
        });
        self.seq += 1;
    }

    fn finish(mut self, track_name: Option<&str>) -> Vec<u8> {
        self.events.sort_by(|a, b| a.tick.cmp(&b.tick).then(a.order.cmp(&b.order)));

        let mut body = Vec::new();
        if let Some(name) = track_name {
            write_meta_event(&mut body, 0, 0x03, name.as_bytes());
        }

        let mut prev_tick = 0u64;
        for ev in &self.events {
            let delta = ev.tick - prev_tick;
            write_varlen(&mut body, delta as u32);
            body.extend_from_slice(&ev.bytes);
            prev_tick = ev.tick;
        }
        // End of track.
        write_varlen(&mut body, 0);
        body.extend_from_slice(&[0xFF, 0x2F, 0x00]);

        let mut chunk = Vec::new();
        chunk.extend_from_slice(b"MTrk");
        chunk.write_u32::<BigEndian>(body.len() as u32).unwrap();
        chunk.extend_from_slice(&body);
        chunk
    }
}

fn write_varlen(out: &mut Vec<u8>, mut value: u32) {
    let mut buf = [0u8; 4];
    let mut i = 4;
    buf[3] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        buf[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    out.extend_from_slice(&buf[i..]);
}

fn write_meta_event(body: &mut Vec<u8>, delta: u32, meta_type: u8, data: &[u8]) {
    write_varlen(body, delta);
    body.push(0xFF);
    body.push(meta_type);
    write_varlen(body, data.len() as u32);
    body.extend_from_slice(data);
}

fn bar_to_tick(bar: i32, beats_per_bar: u32) -> u64 {
    bar as u64 * beats_per_bar as u64 * PPQ as u64
}

fn fold_to_range(pitch: i32) -> u8 {
    let mut p = pitch;
    while p < MIN_PITCH {
        p += 12;
    }
    while p > MAX_PITCH {
        p -= 12;
    }
    p.clamp(0, 127) as u8
}

/// Microseconds per quarter note for a given BPM.
fn tempo_micros(bpm: i32) -> u32 {
    (60_000_000.0 / bpm as f64).round() as u32
}

fn write_tempo_event(track: &mut TrackBuilder, tick: u64, bpm: i32) {
    let micros = tempo_micros(bpm);
    let mut data = Vec::new();
    data.push((micros >> 16) as u8);
    data.push((micros >> 8) as u8);
    data.push(micros as u8);
    let mut bytes = Vec::new();
    bytes.push(0xFF);
    bytes.push(0x51);
    bytes.push(0x03);
    bytes.extend_from_slice(&data);
    track.push(tick, bytes);
}

/// Synthesizes up to 8 intermediate tempo events ramping linearly from
/// `from_bpm` to `to_bpm` over the first half-bar of the section starting at
/// `section_start_tick`.
fn write_tempo_ramp(track: &mut TrackBuilder, section_start_tick: u64, from_bpm: i32, to_bpm: i32, beats_per_bar: u32) {
    if from_bpm == to_bpm {
        write_tempo_event(track, section_start_tick, to_bpm);
        return;
    }
    const STEPS: u64 = 8;
    let half_bar_ticks = (beats_per_bar as u64 * PPQ as u64) / 2;
    for step in 0..=STEPS {
        let frac = step as f64 / STEPS as f64;
        let bpm = (from_bpm as f64 + (to_bpm - from_bpm) as f64 * frac).round() as i32;
        let tick = section_start_tick + (half_bar_ticks * step / STEPS);
        write_tempo_event(track, tick, bpm);
    }
}

fn write_program_change(track: &mut TrackBuilder, tick: u64, channel: u8, program: u8) {
    track.push(tick, vec![0xC0 | (channel & 0x0F), program & 0x7F]);
}

fn write_cc(track: &mut TrackBuilder, tick: u64, channel: u8, controller: u8, value: i32) {
    track.push(tick, vec![0xB0 | (channel & 0x0F), controller, value.clamp(0, 127) as u8]);
}

fn write_note(track: &mut TrackBuilder, tick_on: u64, tick_off: u64, channel: u8, pitch: u8, velocity: u8) {
    track.push(tick_on, vec![0x90 | (channel & 0x0F), pitch, velocity.max(1)]);
    track.push(tick_off, vec![0x80 | (channel & 0x0F), pitch, 0]);
}

fn write_motif_notes(
    track: &mut TrackBuilder,
    motif: &Motif,
    section_start_tick: u64,
    channel: u8,
    transpose: i32,
) {
    for ev in &motif.events {
        let pitch = fold_to_range(ev.pitch as i32 + transpose);
        let tick_on = section_start_tick + (ev.t * PPQ as f64).round() as u64;
        let tick_off = tick_on + (ev.dur * PPQ as f64).round().max(1.0) as u64;
        write_note(track, tick_on, tick_off, channel, pitch, ev.vel.min(127));
    }
}

fn resolve_motif<'a>(id: &str, catalog: &'a [Motif], synthetic: &'a HashMap<String, Motif>) -> Option<&'a Motif> {
    catalog
        .iter()
        .find(|m| m.id == id)
        .or_else(|| synthetic.get(id))
}

/// Assembles a complete Standard MIDI File.
///
/// `section_motifs[i]` is the motif id chosen for `plan.sections[i]`.
pub fn assemble_midi(
    plan: &SongPlan,
    section_motifs: &[String],
    catalog_motifs: &[Motif],
    synthetic_motifs: &HashMap<String, Motif>,
    earcons: &[EarconEmission],
    controls: &Controls,
    palette: &Palette,
) -> Vec<u8> {
    const BEATS_PER_BAR: u32 = 4;

    let mut meta = TrackBuilder::new();
    let mut lead = TrackBuilder::new();
    let mut pad = TrackBuilder::new();
    let mut bass = TrackBuilder::new();
    let mut earcon_track = TrackBuilder::new();

    // Time signature, once, at tick 0.
    write_time_signature(&mut meta, 0);

    let bass_transpose = controls.transpose.clamp(-12, 0);

    let mut prev_tempo: Option<i32> = None;
    let mut prev_lead_program: Option<u8> = None;
    let mut prev_pad_program: Option<u8> = None;
    let mut prev_bass_program: Option<u8> = None;

    write_cc(&mut lead, 0, 0, 74, controls.filter_cc74);
    write_cc(&mut lead, 0, 0, 91, controls.reverb_cc91);

    for (idx, section) in plan.sections.iter().enumerate() {
        let section_tick = bar_to_tick(section.start_bar, BEATS_PER_BAR);

        match prev_tempo {
            None => write_tempo_event(&mut meta, section_tick, section.tempo),
            Some(prev) => write_tempo_ramp(&mut meta, section_tick, prev, section.tempo, BEATS_PER_BAR),
        }
        prev_tempo = Some(section.tempo);

        if prev_lead_program != Some(palette.instruments.lead) {
            write_program_change(&mut lead, section_tick, 0, palette.instruments.lead);
            prev_lead_program = Some(palette.instruments.lead);
        }
        if prev_pad_program != Some(palette.instruments.pad) {
            write_program_change(&mut pad, section_tick, 1, palette.instruments.pad);
            prev_pad_program = Some(palette.instruments.pad);
        }
        if prev_bass_program != Some(palette.instruments.bass) {
            write_program_change(&mut bass, section_tick, 2, palette.instruments.bass);
            prev_bass_program = Some(palette.instruments.bass);
        }

        write_cc(&mut lead, section_tick, 0, 11, section.dynamics.cc11());

        if let Some(motif_id) = section_motifs.get(idx) {
            if let Some(motif) = resolve_motif(motif_id, catalog_motifs, synthetic_motifs) {
                write_motif_notes(&mut lead, motif, section_tick, 0, controls.transpose);
            }
        }

        let key_root_pc = crate::harmony::parse_pitch_class(&section.key);
        let key_root_pitch: i32 = 60 + key_root_pc as i32;

        for (bar_offset, chord) in section.chord_grid.iter().enumerate() {
            let chord_tick = section_tick + bar_to_tick(bar_offset as i32, BEATS_PER_BAR);
            let chord_end_tick = chord_tick + (BEATS_PER_BAR as u64 * PPQ as u64);

            let tones = crate::harmony::chord_tones(key_root_pitch, chord);
            for tone in tones {
                let pitch = fold_to_range(tone + controls.transpose);
                write_note(&mut pad, chord_tick, chord_end_tick, 1, pitch, controls.velocity.clamp(1, 127) as u8);
            }

            let bass_pitch = fold_to_range(crate::harmony::chord_bass_pitch(key_root_pitch, chord) + bass_transpose);
            write_note(&mut bass, chord_tick, chord_end_tick, 2, bass_pitch, controls.velocity.clamp(1, 127) as u8);
        }
    }

    for emission in earcons {
        let tick = (emission.time_sec * section_ticks_per_second(plan, emission.time_sec, BEATS_PER_BAR)).round() as u64;
        let dur_ticks = (emission.duration_beats * PPQ as f64).round().max(1.0) as u64;
        for &pitch in &emission.pitches {
            write_note(&mut earcon_track, tick, tick + dur_ticks, emission.channel, pitch, emission.velocity);
        }
    }

    let track_name = format!("sonify:{}", palette.slug);

    let mut out = Vec::new();
    write_header(&mut out);
    out.extend_from_slice(&meta.finish(Some(&track_name)));
    out.extend_from_slice(&lead.finish(Some("lead")));
    out.extend_from_slice(&pad.finish(Some("pad")));
    out.extend_from_slice(&bass.finish(Some("bass")));
    out.extend_from_slice(&earcon_track.finish(Some("earcons")));
    out
}

fn write_time_signature(track: &mut TrackBuilder, tick: u64) {
    track.push(tick, {
        let mut bytes = vec![0xFF, 0x58, 0x04];
        bytes.extend_from_slice(&[4, 2, 24, 8]);
        bytes
    });
}

/// Ticks-per-second conversion using the tempo of the section active at
/// `time_sec`, matching the earcon engine's own section-lookup logic.
fn section_ticks_per_second(plan: &SongPlan, time_sec: f64, beats_per_bar: u32) -> f64 {
    let mut elapsed = 0.0;
    for section in &plan.sections {
        let seconds_per_bar = beats_per_bar as f64 * 60.0 / section.tempo as f64;
        let duration = seconds_per_bar * section.length_bars as f64;
        if time_sec < elapsed + duration {
            return PPQ as f64 * section.tempo as f64 / 60.0;
        }
        elapsed += duration;
    }
    let last = plan.sections.last().expect("song plan has at least one section");
    PPQ as f64 * last.tempo as f64 / 60.0
}

fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(b"MThd");
    out.write_u32::<BigEndian>(6).unwrap();
    out.write_u16::<BigEndian>(1).unwrap(); // format 1
    out.write_u16::<BigEndian>(NUM_TRACKS as u16).unwrap();
    out.write_u16::<BigEndian>(PPQ).unwrap();
}
