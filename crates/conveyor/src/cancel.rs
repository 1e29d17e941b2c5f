//! Single-shot broadcast cancellation.
//!
//! [`Cancellation`] wraps a [`CancellationToken`] with a one-shot transition
//! flag so that exactly one caller of [`Cancellation::signal`] learns it
//! performed the *armed → signaled* transition. Waiters are woken by the
//! token itself; nobody polls.

use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A broadcastable, idempotent stop signal shared by every task of a run.
///
/// Clones observe the same signal. Once signaled it stays signaled.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    fired: AtomicBool,
    token: CancellationToken,
}

impl Cancellation {
    /// Creates a new, armed cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals every observer.
    ///
    /// Returns `true` only for the call that performed the transition; every
    /// later (or concurrently losing) call returns `false`. Either way the
    /// signal is observable by the time this returns.
    pub fn signal(&self) -> bool {
        let first = !self.inner.fired.swap(true, Ordering::AcqRel);
        self.inner.token.cancel();
        first
    }

    /// Returns `true` once the signal has fired. Never blocks.
    pub fn is_signaled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn signaled(&self) {
        self.inner.token.cancelled().await;
    }

    /// The underlying token, for composing with other Tokio code.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }
}
