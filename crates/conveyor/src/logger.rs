//! The logging capability the runner reports its lifecycle through.
//!
//! The runner never writes to stdout or a subscriber directly. It calls a
//! [`Logger`] for every lifecycle event (run started/stopped/finished, task
//! started/finished) and for fatal configuration problems. Any type with the
//! three operations below can be plugged in; [`NoopLogger`] discards
//! everything for silent operation.

use core::fmt;
use std::sync::Arc;

/// Minimal logging capability used by [`Runner`](crate::Runner).
pub trait Logger: Send + Sync {
    /// Logs a formatted lifecycle message.
    fn log_fmt(&self, args: fmt::Arguments<'_>);

    /// Logs a plain lifecycle message.
    fn log(&self, message: &str);

    /// Reports an unrecoverable configuration problem.
    ///
    /// The runner refuses to start after calling this; implementations may
    /// additionally terminate the process.
    fn fatal(&self, message: &str);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log_fmt(&self, args: fmt::Arguments<'_>) {
        (**self).log_fmt(args);
    }

    fn log(&self, message: &str) {
        (**self).log(message);
    }

    fn fatal(&self, message: &str) {
        (**self).fatal(message);
    }
}

/// A [`Logger`] that discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log_fmt(&self, _args: fmt::Arguments<'_>) {}

    fn log(&self, _message: &str) {}

    fn fatal(&self, _message: &str) {}
}

/// A [`Logger`] that forwards to [`tracing`] events under the `conveyor`
/// target.
///
/// Lifecycle messages become `INFO` events and fatal messages `ERROR` events.
/// What is printed, and where, is up to the installed subscriber.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

#[cfg(feature = "tracing")]
impl Logger for TracingLogger {
    fn log_fmt(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "conveyor", "{args}");
    }

    fn log(&self, message: &str) {
        tracing::info!(target: "conveyor", "{message}");
    }

    fn fatal(&self, message: &str) {
        tracing::error!(target: "conveyor", "{message}");
    }
}

/// The logger a freshly built runner uses.
pub(crate) fn default_logger() -> Arc<dyn Logger> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingLogger)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(NoopLogger)
    }
}
