//! Error types for the runner.
//!
//! Every variant describes a configuration problem detected when
//! [`Runner::run`](crate::Runner::run) is entered. Cancellation is never an
//! error; it is a normal way for a run to end.
//!
//! ## Error Cases
//! - `MissingProduce`: no produce routine was installed.
//! - `MissingConsume`: no consume routine was installed.
//! - `InvalidTaskCount`: a producer or consumer count of zero.
//! - `AlreadyRunning`: `run` was entered while another `run` was in flight.

use crate::Role;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the runner.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// `run` was called before a produce routine was set.
    #[error("Please specify a produce routine")]
    MissingProduce,

    /// `run` was called before a consume routine was set.
    #[error("Please specify a consume routine")]
    MissingConsume,

    /// A pool was configured with zero tasks.
    #[error("{role} count must be at least 1 (got {count})")]
    InvalidTaskCount { role: Role, count: usize },

    /// A second `run` was started on a runner that is still running.
    #[error("Runner is already running")]
    AlreadyRunning,
}
