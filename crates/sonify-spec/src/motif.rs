//! Motif catalog types: short, labeled musical fragments.

use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single note event inside a motif, in beats relative to the motif start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotifEvent {
    pub t: f64,
    pub pitch: u8,
    pub dur: f64,
    pub vel: u8,
    pub chan: u8,
}

/// A short, labeled musical fragment. Content-addressed: `id` is stable
/// across catalog versions only if the content is byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motif {
    pub id: String,
    pub label: Label,
    pub bars: i32,
    pub events: Vec<MotifEvent>,
    pub tempo_hint: Option<i32>,
}

/// A versioned, append-only set of motifs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotifCatalog {
    pub version: String,
    pub motifs: Vec<Motif>,
}

impl MotifCatalog {
    pub fn stats(&self) -> HashMap<Label, usize> {
        let mut stats = HashMap::new();
        for m in &self.motifs {
            *stats.entry(m.label).or_insert(0) += 1;
        }
        stats
    }

    pub fn by_label(&self, label: Label) -> impl Iterator<Item = &Motif> {
        self.motifs.iter().filter(move |m| m.label == label)
    }
}

/// Where a selected motif id actually came from — an explicit result type
/// in place of throwing on a catalog miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotifSource {
    Catalog,
    /// Substituted with `NEUTRAL` because the requested label had no motifs.
    Fallback,
    /// No catalog or `NEUTRAL` motif existed at all; a filler was synthesized.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifChoice {
    pub motif_id: String,
    pub source: MotifSource,
}
