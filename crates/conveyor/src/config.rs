use crate::{Error, Result, Role};

/// Default number of producer tasks.
pub const DEFAULT_PRODUCERS: usize = 1;

/// Default number of consumer tasks. Also the default buffer capacity.
pub const DEFAULT_CONSUMERS: usize = 5;

/// What consumers do with buffered items once the run is cancelled.
///
/// "Finish everything already produced" and "stop as fast as possible" are
/// mutually exclusive under cancellation, so the choice is explicit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Ignore cancellation and keep consuming until the buffer is closed and
    /// empty. Every item accepted before cancellation is processed.
    #[default]
    DrainToCompletion,

    /// Check cancellation before taking and before processing each item; once
    /// signaled, exit and leave the rest of the buffer unprocessed.
    CancelAware,
}

impl DrainPolicy {
    /// Maps the `consume_all_on_cancel` flag onto a policy.
    pub const fn from_consume_all(consume_all_on_cancel: bool) -> Self {
        if consume_all_on_cancel {
            Self::DrainToCompletion
        } else {
            Self::CancelAware
        }
    }

    pub const fn consumes_all(self) -> bool {
        matches!(self, Self::DrainToCompletion)
    }
}

/// Sizing and draining configuration for a [`Runner`](crate::Runner).
///
/// The buffer between the pools holds `consumers` items, trading memory for
/// how far producers may run ahead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Number of concurrent producer tasks. Must be at least 1.
    pub producers: usize,
    /// Number of concurrent consumer tasks. Must be at least 1.
    pub consumers: usize,
    /// Consumer behavior under cancellation.
    pub drain: DrainPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            producers: DEFAULT_PRODUCERS,
            consumers: DEFAULT_CONSUMERS,
            drain: DrainPolicy::default(),
        }
    }
}

impl RunnerConfig {
    /// Capacity of the buffer between producers and consumers.
    pub const fn buffer_capacity(&self) -> usize {
        self.consumers
    }

    /// Checks that both pools have at least one task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTaskCount`] for the first pool sized zero.
    pub fn validate(&self) -> Result<()> {
        if self.producers == 0 {
            return Err(Error::InvalidTaskCount {
                role: Role::Producer,
                count: self.producers,
            });
        }
        if self.consumers == 0 {
            return Err(Error::InvalidTaskCount {
                role: Role::Consumer,
                count: self.consumers,
            });
        }
        Ok(())
    }
}
