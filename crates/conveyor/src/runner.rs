//! Orchestration of one fan-out/fan-in run.
//!
//! A [`Runner`] owns the produce and consume routines, the pool sizes, the
//! drain policy and the logger. Each call to [`Runner::run`] builds a fresh
//! buffer, spawns both pools, and returns once every task has exited.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --run--> Running --stop--> Stopping --all tasks joined--> Stopped
//!                  |                                                ^
//!                  +----------------- all tasks joined -------------+
//! ```
//!
//! `run` always signals cancellation on its way out, so anything still waiting
//! on the run's [`Cancellation`] is released even after a clean finish.
//!
//! Every run observes its own cancellation, created when the run begins. A
//! stop that lands after a run returned is ignored. The exception is a runner
//! that has never run: stopping it signals the cancellation the first run will
//! use, so that run starts already cancelled and ends almost immediately.

use crate::{
    Cancellation, ConsumeContext, DrainPolicy, Error, Logger, ProduceContext, Result,
    RunnerConfig,
    buffer,
    consumer::{ConsumeFn, spawn_consumers},
    context::Tally,
    logger::default_logger,
    producer::{ProduceFn, spawn_producers},
};
use core::fmt;
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Where a [`Runner`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    /// Built, never run.
    Idle,
    /// Pools are running and cancellation has not been requested.
    Running,
    /// Cancellation was requested; tasks are winding down.
    Stopping,
    /// The last run returned.
    Stopped,
}

/// Outcome of a completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items accepted into the buffer.
    pub produced: usize,
    /// Consume routine invocations that ran to completion.
    pub consumed: usize,
    /// Whether the run was cancelled before all of its tasks had finished.
    pub cancelled: bool,
}

struct Lifecycle {
    state: RunnerState,
    /// Cancellation of the run in flight or of the last run. Before the
    /// first run, the one that run will use.
    cancellation: Cancellation,
}

/// Fan-out/fan-in producer-consumer runner.
///
/// Build one with [`Runner::new`], install routines with
/// [`produce_with`](Self::produce_with) and
/// [`consume_with`](Self::consume_with), then call [`run`](Self::run).
/// Share it behind an [`Arc`] to call [`stop`](Self::stop) from other tasks.
///
/// A runner can be run any number of times in sequence. Starting a second
/// run while one is in flight fails with [`Error::AlreadyRunning`].
pub struct Runner<T> {
    produce: Option<ProduceFn<T>>,
    consume: Option<ConsumeFn<T>>,
    config: RunnerConfig,
    logger: Arc<dyn Logger>,
    lifecycle: Mutex<Lifecycle>,
}

impl<T> Default for Runner<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Runner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("produce", &self.produce.is_some())
            .field("consume", &self.consume.is_some())
            .field("config", &self.config)
            .field("state", &self.lifecycle.lock().state)
            .finish_non_exhaustive()
    }
}

impl<T> Runner<T>
where
    T: Send + 'static,
{
    /// Creates a runner with the default configuration: one producer, five
    /// consumers, drain-to-completion, and the default logger.
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            produce: None,
            consume: None,
            config,
            logger: default_logger(),
            lifecycle: Mutex::new(Lifecycle {
                state: RunnerState::Idle,
                cancellation: Cancellation::new(),
            }),
        }
    }

    /// Installs the produce routine, run once by every producer task.
    ///
    /// The routine should stop as soon as [`ProduceContext::emit`] returns
    /// `false`.
    pub fn produce_with<F, Fut>(mut self, produce: F) -> Self
    where
        F: Fn(ProduceContext<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.produce = Some(Arc::new(move |ctx| produce(ctx).boxed()));
        self
    }

    /// Installs the consume routine, run once per item taken from the buffer.
    pub fn consume_with<F, Fut>(mut self, consume: F) -> Self
    where
        F: Fn(T, ConsumeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.consume = Some(Arc::new(move |item, ctx| consume(item, ctx).boxed()));
        self
    }

    pub fn producers(mut self, count: usize) -> Self {
        self.config.producers = count;
        self
    }

    /// Sets the consumer count, which is also the buffer capacity.
    pub fn consumers(mut self, count: usize) -> Self {
        self.config.consumers = count;
        self
    }

    pub fn drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.config.drain = policy;
        self
    }

    /// Shorthand for [`drain_policy`](Self::drain_policy):
    /// `true` drains to completion, `false` is cancel-aware.
    pub fn consume_all_on_cancel(self, consume_all: bool) -> Self {
        self.drain_policy(DrainPolicy::from_consume_all(consume_all))
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Runs both pools to completion.
    ///
    /// Spawns the producer pool feeding a buffer of `consumers` items and the
    /// consumer pool draining it, then waits until every producer and consumer
    /// task has exited. Cancellation is signaled unconditionally before
    /// returning.
    ///
    /// Must be called from within a Tokio runtime; producers and consumers run
    /// in parallel on a multi-threaded one.
    ///
    /// Dropping the returned future before it completes (for example under
    /// `tokio::time::timeout`) stops the run, aborts both pools and leaves the
    /// runner ready for the next `run`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingProduce`] / [`Error::MissingConsume`] when a routine
    ///   is unset. The problem is also reported through [`Logger::fatal`] and
    ///   no routine is ever invoked.
    /// - [`Error::InvalidTaskCount`] when a pool is sized zero.
    /// - [`Error::AlreadyRunning`] when another run is in flight.
    pub async fn run(&self) -> Result<RunSummary> {
        let Some(produce) = self.produce.clone() else {
            return Err(self.fatal(Error::MissingProduce));
        };
        let Some(consume) = self.consume.clone() else {
            return Err(self.fatal(Error::MissingConsume));
        };
        if let Err(e) = self.config.validate() {
            return Err(self.fatal(e));
        }

        let cancellation = self.begin()?;
        let mut active = ActiveRun::new(self);
        self.logger.log("Runner started ...");

        let tally = Arc::new(Tally::default());
        let (inlet, outlet) = buffer::bounded(self.config.buffer_capacity());

        let producers = spawn_producers(
            self.config.producers,
            produce,
            inlet,
            cancellation.clone(),
            Arc::clone(&tally),
            Arc::clone(&self.logger),
        );
        active.track(producers.abort_handle());
        let consumers = spawn_consumers(
            self.config.consumers,
            consume,
            outlet,
            self.config.drain,
            cancellation.clone(),
            Arc::clone(&tally),
            Arc::clone(&self.logger),
        );
        active.track(consumers.abort_handle());

        let (producers, consumers) = tokio::join!(producers, consumers);
        for (pool, joined) in [("Producer", producers), ("Consumer", consumers)] {
            if let Err(e) = joined {
                self.logger
                    .log_fmt(format_args!("{pool} pool supervisor failed: {e}"));
            }
        }

        let summary = RunSummary {
            produced: tally.produced(),
            consumed: tally.consumed(),
            cancelled: cancellation.is_signaled(),
        };

        drop(active);
        self.logger.log("Runner finished.");

        #[cfg(feature = "tracing")]
        tracing::debug!(
            produced = summary.produced,
            consumed = summary.consumed,
            cancelled = summary.cancelled,
            "Run summary"
        );

        Ok(summary)
    }
}

impl<T> Runner<T> {
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn state(&self) -> RunnerState {
        self.lifecycle.lock().state
    }

    /// Signals cancellation to every producer and consumer.
    ///
    /// Idempotent and safe to call from any task or thread, concurrently with
    /// [`run`](Self::run), any number of times. Only the call that actually
    /// transitions the cancellation logs "Runner stopped.".
    ///
    /// On a runner that has never run, the signal carries over to the first
    /// `run`. Once a run has returned, `stop` has no effect until the next
    /// `run` begins.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            RunnerState::Stopped => return,
            RunnerState::Running => lifecycle.state = RunnerState::Stopping,
            RunnerState::Idle | RunnerState::Stopping => {}
        }
        if lifecycle.cancellation.signal() {
            drop(lifecycle);
            self.logger.log("Runner stopped.");
        }
    }

    /// Cancellation of the run in flight or of the last run. Before the first
    /// run, the cancellation that run will use.
    pub fn cancellation(&self) -> Cancellation {
        self.lifecycle.lock().cancellation.clone()
    }

    fn fatal(&self, error: Error) -> Error {
        self.logger.fatal(&error.to_string());
        error
    }

    /// Moves into `Running` and hands out this run's cancellation.
    fn begin(&self) -> Result<Cancellation> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            RunnerState::Running | RunnerState::Stopping => return Err(Error::AlreadyRunning),
            RunnerState::Stopped => lifecycle.cancellation = Cancellation::new(),
            RunnerState::Idle => {}
        }
        lifecycle.state = if lifecycle.cancellation.is_signaled() {
            RunnerState::Stopping
        } else {
            RunnerState::Running
        };
        Ok(lifecycle.cancellation.clone())
    }

    fn finish(&self) {
        self.lifecycle.lock().state = RunnerState::Stopped;
    }
}

/// Ends a run when dropped, whether `run` returned or its future was dropped
/// mid-flight.
struct ActiveRun<'a, T> {
    runner: &'a Runner<T>,
    pools: Vec<AbortHandle>,
}

impl<'a, T> ActiveRun<'a, T> {
    fn new(runner: &'a Runner<T>) -> Self {
        Self {
            runner,
            pools: Vec::with_capacity(2),
        }
    }

    fn track(&mut self, pool: AbortHandle) {
        self.pools.push(pool);
    }
}

impl<T> Drop for ActiveRun<'_, T> {
    fn drop(&mut self) {
        self.runner.stop();
        // No-op for supervisors that already completed.
        for pool in &self.pools {
            pool.abort();
        }
        self.runner.finish();
    }
}
