//! # `conveyor-digest`
//!
//! Prints the SHA-256 digest of every regular file below the given roots,
//! sorted by path, hashing files concurrently.
//!
//! ## Usage
//!
//! ```bash
//! conveyor-digest --consumers 8 src/ tests/
//! ```
//!
//! Ctrl+C stops the walk; files already queued are still hashed unless
//! `--cancel-aware` is set.

use clap::Parser;
use conveyor::{RunnerConfig, signal::trap_interrupt};
use conveyor_cli::{
    config::RunnerArgs,
    digest::{DigestSink, digest_runner},
    telemetry::init_tracing,
};
use std::{path::PathBuf, sync::Arc};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "conveyor-digest",
    version,
    about = "Concurrently compute SHA-256 digests of every file below the given roots"
)]
struct CliArgs {
    #[command(flatten)]
    runner: RunnerArgs,

    /// Directories (or files) to digest.
    #[arg(default_value = ".")]
    roots: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunnerConfig::try_from(args.runner)?;

    init_tracing();
    tracing::debug!("Starting digest with config: {config:#?}");

    let sink = Arc::new(DigestSink::default());
    let runner = Arc::new(digest_runner(args.roots, config, Arc::clone(&sink)));
    let trap = trap_interrupt(Arc::clone(&runner))?;

    let summary = runner.run().await?;
    trap.abort();

    let report = sink.take_report(summary);
    for line in report.lines() {
        println!("{line}");
    }

    if report.summary.cancelled {
        tracing::warn!(
            "Interrupted: {} of {} queued files hashed",
            report.summary.consumed,
            report.summary.produced
        );
    }
    if !report.errors.is_empty() {
        tracing::warn!("{} paths could not be digested", report.errors.len());
    }

    Ok(())
}
