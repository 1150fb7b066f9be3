//! Palette configuration: read-only musical defaults loaded from YAML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Lydian,
    Pentatonic,
    Blues,
}

impl Mode {
    /// Parallel-mode shift used for `VOLATILE_SPIKE` sections.
    pub fn parallel_shift(&self) -> Mode {
        match self {
            Mode::Major => Mode::Dorian,
            Mode::Dorian => Mode::Major,
            Mode::Minor => Mode::Dorian,
            Mode::Lydian => Mode::Major,
            Mode::Pentatonic => Mode::Blues,
            Mode::Blues => Mode::Pentatonic,
        }
    }

    pub fn is_major_family(&self) -> bool {
        matches!(self, Mode::Major | Mode::Lydian | Mode::Pentatonic)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruments {
    pub lead: u8,
    pub pad: u8,
    pub bass: u8,
    pub perc: Vec<u8>,
}

/// A short musical pattern resolved from an earcon id: at most 1.5s and 6
/// notes, expressed as relative-beat pitches off the section root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarconPattern {
    pub pitches: Vec<i32>,
    pub duration_beats: f64,
    pub velocity: u8,
    /// True for percussion-style earcons (channel 9); false for melodic ones
    /// (channel 15).
    pub percussive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub slug: String,
    pub key: String,
    pub mode: Mode,
    pub tempo_range: (i32, i32),
    pub default_tempo: i32,
    pub instruments: Instruments,
    pub earcon_bank: HashMap<String, String>,
    pub earcon_patterns: HashMap<String, EarconPattern>,
    pub rhythm_feel: String,
    /// Chord progression template, as roman-numeral degree indices into the
    /// palette's diatonic scale (0-indexed: I=0, ii=1, ...).
    pub chord_progression: Vec<u8>,
}

impl Palette {
    pub fn clamp_tempo(&self, bpm: i32) -> i32 {
        bpm.clamp(self.tempo_range.0, self.tempo_range.1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteSummary {
    pub slug: String,
    pub key: String,
    pub mode: Mode,
    pub default_tempo: i32,
}

impl From<&Palette> for PaletteSummary {
    fn from(p: &Palette) -> Self {
        PaletteSummary {
            slug: p.slug.clone(),
            key: p.key.clone(),
            mode: p.mode,
            default_tempo: p.default_tempo,
        }
    }
}
