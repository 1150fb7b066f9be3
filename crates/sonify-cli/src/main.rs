//! `sonify` binary: thin dispatch over the commands in `sonify_cli::commands`.

use clap::Parser;
use std::process::ExitCode;

use sonify_cli::cli_args::{Cli, Commands};
use sonify_cli::{bootstrap, commands};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = bootstrap();

    let result = match cli.command {
        Commands::Submit {
            input,
            palette,
            seed,
            bars,
            render_mp3,
            wait,
        } => {
            commands::submit::run(&store, input.as_deref(), palette, seed, bars, render_mp3, wait)
                .await
        }
        Commands::Status { job_id } => commands::status::run(&store, &job_id).await,
        Commands::Palettes => commands::palettes::run(&store).await,
        Commands::Catalog { version } => commands::catalog::run(&store, version.as_deref()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
