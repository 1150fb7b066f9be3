//! CLI argument definitions. Keeps `main.rs` focused on dispatch.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sonify")]
#[command(author, version, about = "Deterministic series/metrics-to-MIDI sonification core", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a sonification job from a JSON request file (or stdin)
    Submit {
        /// Path to a JSON file matching `SubmitRequest`; reads stdin if omitted
        #[arg(short, long)]
        input: Option<String>,

        /// Palette slug override
        #[arg(long)]
        palette: Option<String>,

        /// Explicit seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Explicit bar-count override
        #[arg(long)]
        bars: Option<i32>,

        /// Also render an MP3 (requires the `render-mp3` feature)
        #[arg(long)]
        render_mp3: bool,

        /// Block until the job reaches a terminal state
        #[arg(long)]
        wait: bool,
    },

    /// Poll a job's current state and artifact URLs
    Status {
        /// Job id returned by `submit`
        job_id: String,
    },

    /// List configured palettes
    Palettes,

    /// Show the motif catalog summary for a version (defaults to latest)
    Catalog {
        #[arg(long)]
        version: Option<String>,
    },
}
