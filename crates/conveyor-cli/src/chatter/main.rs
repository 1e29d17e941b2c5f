//! # `conveyor-chatter`
//!
//! Runs a slow, chatty producer/consumer workload and prints every message
//! as it moves through the runner. The run is stopped after `--duration-secs`
//! or on Ctrl+C, whichever comes first.
//!
//! ```bash
//! conveyor-chatter --producers 3 --consumers 2 --duration-secs 4
//! CONVEYOR_CANCEL_AWARE=true conveyor-chatter
//! ```

use clap::Parser;
use conveyor::{RunnerConfig, signal::trap_interrupt};
use conveyor_cli::{
    chatter::{
        ChatterSettings, DEFAULT_CONSUME_PAUSE, DEFAULT_MESSAGES, DEFAULT_PRODUCE_PAUSE,
        DEFAULT_PRODUCERS, Transcript, chatter_runner,
    },
    config::RunnerArgs,
    telemetry::init_tracing,
};
use std::{sync::Arc, time::Duration};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "conveyor-chatter",
    version,
    about = "Watch producers and consumers trade messages until interrupted"
)]
struct CliArgs {
    #[command(flatten)]
    runner: RunnerArgs,

    /// Messages emitted by each producer.
    #[arg(long, env = "CONVEYOR_MESSAGES", default_value_t = DEFAULT_MESSAGES)]
    messages: usize,

    /// Stop the run after this many seconds. `0` waits for Ctrl+C.
    #[arg(long, env = "CONVEYOR_DURATION_SECS", default_value_t = 4)]
    duration_secs: u64,

    /// Pause after each produced message, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PRODUCE_PAUSE.as_millis() as u64)]
    produce_pause_ms: u64,

    /// Pause before each consumed message, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_CONSUME_PAUSE.as_millis() as u64)]
    consume_pause_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunnerConfig::try_from(args.runner.or_producers(DEFAULT_PRODUCERS))?;
    let settings = ChatterSettings {
        messages: args.messages,
        produce_pause: Duration::from_millis(args.produce_pause_ms),
        consume_pause: Duration::from_millis(args.consume_pause_ms),
    };

    init_tracing();
    tracing::debug!("Starting chatter with {config:#?} {settings:#?}");

    let transcript = Arc::new(Transcript::echoing());
    let runner = Arc::new(chatter_runner(config, settings, Arc::clone(&transcript)));
    let trap = trap_interrupt(Arc::clone(&runner))?;

    let timer = (args.duration_secs > 0).then(|| {
        let runner = Arc::clone(&runner);
        let duration = Duration::from_secs(args.duration_secs);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tracing::info!("Time is up after {duration:?}, stopping");
            runner.stop();
        })
    });

    let summary = runner.run().await?;
    trap.abort();
    if let Some(timer) = timer {
        timer.abort();
    }

    tracing::info!(
        "Produced {} and consumed {} messages (cancelled: {})",
        summary.produced,
        summary.consumed,
        summary.cancelled
    );

    Ok(())
}
