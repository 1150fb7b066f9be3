//! The intermediate representation between analysis and MIDI bytes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamics {
    Pp,
    P,
    Mf,
    F,
    Ff,
}

impl Dynamics {
    /// Maps a mean `|score|` (absolute momentum magnitude) to a dynamics
    /// marking: `0->pp, 0.2->p, 0.4->mf, 0.7->f, 0.9->ff`.
    pub fn from_abs_score(mean_abs_score: f64) -> Dynamics {
        if mean_abs_score >= 0.9 {
            Dynamics::Ff
        } else if mean_abs_score >= 0.7 {
            Dynamics::F
        } else if mean_abs_score >= 0.4 {
            Dynamics::Mf
        } else if mean_abs_score >= 0.2 {
            Dynamics::P
        } else {
            Dynamics::Pp
        }
    }

    /// CC11 expression value used by the MIDI assembler at section starts.
    pub fn cc11(&self) -> i32 {
        match self {
            Dynamics::Pp => 40,
            Dynamics::P => 60,
            Dynamics::Mf => 85,
            Dynamics::F => 105,
            Dynamics::Ff => 120,
        }
    }
}

/// A chord symbol: root scale degree (0-indexed into the section's mode)
/// plus an inversion chosen to minimize bass leap from the previous chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSymbol {
    pub degree: u8,
    pub inversion: u8,
    /// `true` for a borrowed chord (e.g. the IV->iv cadence bar).
    pub borrowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub start_bar: i32,
    pub length_bars: i32,
    pub key: String,
    pub mode: crate::palette::Mode,
    pub tempo: i32,
    pub chord_grid: Vec<ChordSymbol>,
    pub motif_ids: Vec<String>,
    pub dynamics: Dynamics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongPlan {
    pub total_bars: i32,
    pub sections: Vec<Section>,
}

impl SongPlan {
    /// Sum of `length_bars` across sections; must equal `total_bars`.
    pub fn covered_bars(&self) -> i32 {
        self.sections.iter().map(|s| s.length_bars).sum()
    }

    /// Verifies the contiguity invariant: section starts cover
    /// `[0, total_bars)` with no gaps or overlaps.
    pub fn is_contiguous(&self) -> bool {
        if self.covered_bars() != self.total_bars {
            return false;
        }
        let mut expected = 0;
        for s in &self.sections {
            if s.start_bar != expected {
                return false;
            }
            expected += s.length_bars;
        }
        expected == self.total_bars
    }
}
