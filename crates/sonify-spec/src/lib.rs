//! Canonical data model, hashing, and configuration loaders for the
//! sonification core.
//!
//! This crate has no algorithmic behavior of its own — [`sonify_engine`]
//! and [`sonify_store`] depend on it for the shared vocabulary (metrics,
//! controls, labels, motifs, palettes, song plans, jobs) and the
//! determinism primitives (canonical hashing, mtime-cached config loading).

pub mod artifact;
pub mod config;
pub mod controls;
pub mod earcon;
pub mod error;
pub mod hash;
pub mod job;
pub mod label;
pub mod momentum;
pub mod motif;
pub mod palette;
pub mod plan;
pub mod rules;
pub mod series;

pub use artifact::{Artifact, ArtifactKind};
pub use config::CoreServices;
pub use controls::{Controls, ControlsOverride};
pub use earcon::{EarconEmission, EarconEvent, EarconKind};
pub use error::{ErrorCode, SonifyError, SonifyResult};
pub use job::{JobState, JobView, SubmitRequest};
pub use label::Label;
pub use momentum::{band_label, MomentumBand, MomentumSign};
pub use motif::{Motif, MotifCatalog, MotifChoice, MotifEvent, MotifSource};
pub use palette::{EarconPattern, Instruments, Mode, Palette, PaletteSummary};
pub use plan::{ChordSymbol, Dynamics, Section, SongPlan};
pub use rules::{Predicate, Rule, RuleSet};
pub use series::{Metrics, Series};
