use anyhow::bail;
use clap::Args;
use conveyor::{DEFAULT_CONSUMERS, DEFAULT_PRODUCERS, DrainPolicy, RunnerConfig};

/// Runner sizing shared by every `conveyor` binary.
///
/// All values are parsed from CLI arguments or environment variables, so the
/// same binary can be tuned per deployment without rebuilding.
#[derive(Args, Debug, Clone)]
pub struct RunnerArgs {
    /// Number of producer tasks started by the runner. Each binary picks its
    /// own default (`1` unless documented otherwise).
    ///
    /// Environment variable: `CONVEYOR_PRODUCERS`
    #[arg(long, env = "CONVEYOR_PRODUCERS")]
    pub producers: Option<usize>,

    /// Number of consumer tasks started by the runner.
    ///
    /// This is also the capacity of the buffer between producers and
    /// consumers: lower values keep producers closer to consumers, higher
    /// values let them run further ahead.
    ///
    /// Environment variable: `CONVEYOR_CONSUMERS`
    #[arg(long, env = "CONVEYOR_CONSUMERS", default_value_t = DEFAULT_CONSUMERS)]
    pub consumers: usize,

    /// Abandon buffered items on interrupt instead of draining them.
    ///
    /// Environment variable: `CONVEYOR_CANCEL_AWARE`
    #[arg(long, env = "CONVEYOR_CANCEL_AWARE")]
    pub cancel_aware: bool,
}

impl RunnerArgs {
    /// Uses `producers` when no producer count was given.
    pub fn or_producers(mut self, producers: usize) -> Self {
        self.producers.get_or_insert(producers);
        self
    }
}

impl TryFrom<RunnerArgs> for RunnerConfig {
    type Error = anyhow::Error;

    fn try_from(args: RunnerArgs) -> Result<Self, Self::Error> {
        let producers = args.producers.unwrap_or(DEFAULT_PRODUCERS);
        if producers == 0 {
            bail!("CONVEYOR_PRODUCERS must be greater than 0");
        }

        if args.consumers == 0 {
            bail!("CONVEYOR_CONSUMERS must be greater than 0");
        }

        let config = Self {
            producers,
            consumers: args.consumers,
            drain: DrainPolicy::from_consume_all(!args.cancel_aware),
        };
        config.validate()?;
        Ok(config)
    }
}
