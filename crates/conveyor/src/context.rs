//! Per-task handles passed to produce and consume routines.

use crate::{Cancellation, TaskId, buffer::Inlet};
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Running counters shared by every task of one run.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    produced: AtomicUsize,
    consumed: AtomicUsize,
}

impl Tally {
    pub(crate) fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn produced(&self) -> usize {
        self.produced.load(Ordering::Relaxed)
    }

    pub(crate) fn consumed(&self) -> usize {
        self.consumed.load(Ordering::Relaxed)
    }
}

/// Handed to each invocation of the produce routine.
///
/// Gives the routine write access to the shared buffer through
/// [`emit`](Self::emit), read access to the run's [`Cancellation`], and the
/// identity of the task it runs on.
///
/// The context is owned by the producer task. Moving it into a detached task
/// that outlives the routine keeps writes possible only until the pool closes
/// the buffer; later emits are rejected.
pub struct ProduceContext<T> {
    id: TaskId,
    inlet: Inlet<T>,
    cancellation: Cancellation,
    tally: Arc<Tally>,
}

impl<T> ProduceContext<T> {
    pub(crate) fn new(
        id: TaskId,
        inlet: Inlet<T>,
        cancellation: Cancellation,
        tally: Arc<Tally>,
    ) -> Self {
        Self {
            id,
            inlet,
            cancellation,
            tally,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Writes `item` into the buffer, racing the write against cancellation.
    ///
    /// Returns `true` if the item was accepted. Returns `false` if the run was
    /// cancelled before the write completed (including when it already was
    /// before the call), if the buffer is closed, or if every consumer has
    /// exited. On `false` the item is dropped and the routine should return.
    pub async fn emit(&self, item: T) -> bool {
        let accepted = tokio::select! {
            biased;
            () = self.cancellation.signaled() => false,
            sent = self.inlet.send(item) => sent.is_ok(),
        };
        if accepted {
            self.tally.record_produced();
        }
        accepted
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_signaled()
    }

    /// Completes once the run is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.signaled().await;
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

/// Handed to each invocation of the consume routine alongside the item.
#[derive(Clone, Debug)]
pub struct ConsumeContext {
    id: TaskId,
    cancellation: Cancellation,
}

impl ConsumeContext {
    pub(crate) fn new(id: TaskId, cancellation: Cancellation) -> Self {
        Self { id, cancellation }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_signaled()
    }

    /// Completes once the run is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.signaled().await;
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::bounded;
    use core::time::Duration;
    use tokio::time::timeout;

    fn context(capacity: usize) -> (ProduceContext<u32>, crate::buffer::Outlet<u32>) {
        let (inlet, outlet) = bounded(capacity);
        let ctx = ProduceContext::new(
            TaskId::producer(0),
            inlet,
            Cancellation::new(),
            Arc::new(Tally::default()),
        );
        (ctx, outlet)
    }

    #[tokio::test]
    async fn emit_counts_accepted_items() {
        let (ctx, outlet) = context(2);
        assert!(ctx.emit(1).await);
        assert!(ctx.emit(2).await);
        assert_eq!(ctx.tally.produced(), 2);
        assert_eq!(outlet.next().await, Some(1));
    }

    #[tokio::test]
    async fn emit_is_rejected_once_cancelled() {
        let (ctx, _outlet) = context(2);
        ctx.cancellation().signal();
        assert!(ctx.is_cancelled());
        assert!(!ctx.emit(1).await, "cancellation wins even with free space");
        assert_eq!(ctx.tally.produced(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancellation_unblocks_a_full_buffer_write() {
        let (ctx, _outlet) = context(1);
        assert!(ctx.emit(1).await);

        let cancellation = ctx.cancellation().clone();
        let blocked = tokio::spawn(async move { ctx.emit(2).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancellation.signal();

        let accepted = timeout(Duration::from_secs(1), blocked)
            .await
            .expect("emit stayed blocked after cancellation")
            .unwrap();
        assert!(!accepted);
    }

    #[tokio::test]
    async fn consume_context_observes_the_run_cancellation() {
        let cancellation = Cancellation::new();
        let ctx = ConsumeContext::new(TaskId::consumer(3), cancellation.clone());
        assert_eq!(ctx.id(), TaskId::consumer(3));
        assert!(!ctx.is_cancelled());
        cancellation.signal();
        assert!(ctx.is_cancelled());
        timeout(Duration::from_millis(50), ctx.cancelled())
            .await
            .unwrap();
    }
}
