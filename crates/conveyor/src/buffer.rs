//! The bounded FIFO between producers and consumers.
//!
//! [`bounded`] returns the two halves of the buffer:
//!
//! - [`Inlet`] is shared by every producer. It owns the only long-lived
//!   [`mpsc::Sender`] and can be closed exactly once; after that no new write
//!   can start.
//! - [`Outlet`] is shared by every consumer. The single [`mpsc::Receiver`] is
//!   guarded by an async mutex so consumers take turns waiting for the next
//!   item.
//!
//! Items already buffered when the inlet closes are still delivered; the
//! outlet reports exhaustion only once the buffer is closed *and* empty.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates a buffer holding at most `capacity` items.
///
/// # Panics
///
/// Panics if `capacity` is zero. Callers validate counts before building a
/// buffer.
pub(crate) fn bounded<T>(capacity: usize) -> (Inlet<T>, Outlet<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Inlet {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        Outlet {
            receiver: Arc::new(tokio::sync::Mutex::new(rx)),
        },
    )
}

/// Write side of the buffer.
pub(crate) struct Inlet<T> {
    sender: Arc<Mutex<Option<mpsc::Sender<T>>>>,
}

impl<T> Clone for Inlet<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> Inlet<T> {
    /// Writes `item`, waiting for space if the buffer is full.
    ///
    /// Returns the item back if the inlet is closed or every consumer is gone.
    /// The lock is only held to clone the sender, never across the await.
    pub(crate) async fn send(&self, item: T) -> Result<(), T> {
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => sender.send(item).await.map_err(|e| e.0),
            None => Err(item),
        }
    }

    /// Closes the inlet. Returns `true` for the call that actually closed it.
    ///
    /// Writes already in flight may still land; consumers observe the end of
    /// the stream once those finish and the buffer drains.
    pub(crate) fn close(&self) -> bool {
        self.sender.lock().take().is_some()
    }
}

/// Read side of the buffer.
pub(crate) struct Outlet<T> {
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for Outlet<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
        }
    }
}

impl<T> Outlet<T> {
    /// Takes the next item, waiting while the buffer is empty but open.
    ///
    /// Returns `None` once the buffer is closed and drained. Cancel safe:
    /// dropping the future before it completes loses no item.
    pub(crate) async fn next(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }
}
