//! Fan-out: the producer pool.
//!
//! [`spawn_producers`] starts one task per producer plus a supervisor. Each
//! producer task runs the produce routine once with its own
//! [`ProduceContext`]. The supervisor is the join barrier of the pool: it
//! waits for every producer task to finish and only then closes the buffer,
//! which tells consumers no more items are coming.

use crate::{
    Cancellation, Logger, ProduceContext, TaskId,
    buffer::Inlet,
    context::Tally,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};

/// Type-erased produce routine as stored by the runner.
pub(crate) type ProduceFn<T> = Arc<dyn Fn(ProduceContext<T>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Spawns `count` producer tasks and the supervisor that closes `inlet`.
///
/// The returned handle completes once every producer task has exited and the
/// buffer has been closed. Routine outcomes are not inspected: a producer that
/// returns, observes cancellation, or panics has finished all the same.
pub(crate) fn spawn_producers<T>(
    count: usize,
    produce: ProduceFn<T>,
    inlet: Inlet<T>,
    cancellation: Cancellation,
    tally: Arc<Tally>,
    logger: Arc<dyn Logger>,
) -> JoinHandle<()>
where
    T: Send + 'static,
{
    let mut producers = JoinSet::new();

    for index in 0..count {
        let id = TaskId::producer(index);
        let ctx = ProduceContext::new(
            id,
            inlet.clone(),
            cancellation.clone(),
            Arc::clone(&tally),
        );
        let produce = Arc::clone(&produce);
        let logger = Arc::clone(&logger);

        producers.spawn(async move {
            logger.log_fmt(format_args!("{id} started."));
            produce(ctx).await;
            logger.log_fmt(format_args!("{id} finished."));
        });
    }

    tokio::spawn(async move {
        while let Some(joined) = producers.join_next().await {
            if let Err(e) = joined {
                logger.log_fmt(format_args!("Producer task aborted: {e}"));
            }
        }

        let _closed = inlet.close();
        #[cfg(feature = "tracing")]
        tracing::debug!(closed = _closed, "All producers finished, buffer closed");
    })
}
