//! Fan-in: the consumer pool.
//!
//! Every consumer task loops over the shared [`Outlet`], invoking the consume
//! routine once per item, until the buffer is closed and drained. Under
//! [`DrainPolicy::CancelAware`] a consumer also gives up as soon as the run is
//! cancelled, both while waiting for an item and right before processing one.

use crate::{
    Cancellation, ConsumeContext, DrainPolicy, Logger, TaskId,
    buffer::Outlet,
    context::Tally,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};

/// Type-erased consume routine as stored by the runner.
pub(crate) type ConsumeFn<T> =
    Arc<dyn Fn(T, ConsumeContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// Spawns `count` consumer tasks draining `outlet`.
///
/// The returned handle completes once every consumer task has exited.
pub(crate) fn spawn_consumers<T>(
    count: usize,
    consume: ConsumeFn<T>,
    outlet: Outlet<T>,
    policy: DrainPolicy,
    cancellation: Cancellation,
    tally: Arc<Tally>,
    logger: Arc<dyn Logger>,
) -> JoinHandle<()>
where
    T: Send + 'static,
{
    let mut consumers = JoinSet::new();

    for index in 0..count {
        let id = TaskId::consumer(index);
        let ctx = ConsumeContext::new(id, cancellation.clone());
        let consume = Arc::clone(&consume);
        let outlet = outlet.clone();
        let tally = Arc::clone(&tally);
        let logger = Arc::clone(&logger);

        consumers.spawn(async move {
            logger.log_fmt(format_args!("{id} started."));
            consumer_loop(&consume, &outlet, policy, &ctx, &tally).await;
            logger.log_fmt(format_args!("{id} finished."));
        });
    }
    // Consumers hold the only outlets now; once they are all gone the buffer
    // and anything left in it are dropped.
    drop(outlet);

    tokio::spawn(async move {
        while let Some(joined) = consumers.join_next().await {
            if let Err(e) = joined {
                logger.log_fmt(format_args!("Consumer task aborted: {e}"));
            }
        }
    })
}

async fn consumer_loop<T>(
    consume: &ConsumeFn<T>,
    outlet: &Outlet<T>,
    policy: DrainPolicy,
    ctx: &ConsumeContext,
    tally: &Tally,
) {
    loop {
        let next = match policy {
            DrainPolicy::DrainToCompletion => outlet.next().await,
            DrainPolicy::CancelAware => {
                tokio::select! {
                    biased;
                    () = ctx.cancelled() => None,
                    item = outlet.next() => item,
                }
            }
        };

        let Some(item) = next else {
            break;
        };

        if policy == DrainPolicy::CancelAware && ctx.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::trace!("{} abandoning buffered items", ctx.id());
            break;
        }

        consume(item, ctx.clone()).await;
        tally.record_consumed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoopLogger, buffer::bounded};
    use core::time::Duration;
    use futures::FutureExt;
    use parking_lot::Mutex;
    use tokio::time::timeout;

    fn routine<T, F, Fut>(f: F) -> ConsumeFn<T>
    where
        F: Fn(T, ConsumeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Arc::new(move |item, ctx| f(item, ctx).boxed())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn drains_everything_then_exits() {
        let (inlet, outlet) = bounded(3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tally = Arc::new(Tally::default());

        let sink = Arc::clone(&seen);
        let pool = spawn_consumers(
            3,
            routine(move |item: u32, _ctx| {
                let sink = Arc::clone(&sink);
                async move { sink.lock().push(item) }
            }),
            outlet,
            DrainPolicy::DrainToCompletion,
            Cancellation::new(),
            Arc::clone(&tally),
            Arc::new(NoopLogger),
        );

        for i in 0..30 {
            inlet.send(i).await.unwrap();
        }
        inlet.close();
        timeout(Duration::from_secs(5), pool).await.unwrap().unwrap();

        let mut seen = seen.lock().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..30).collect::<Vec<_>>());
        assert_eq!(tally.consumed(), 30);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn drain_policy_ignores_cancellation() {
        let (inlet, outlet) = bounded(4);
        let cancellation = Cancellation::new();
        let tally = Arc::new(Tally::default());

        for i in 0..4 {
            inlet.send(i).await.unwrap();
        }
        cancellation.signal();
        inlet.close();

        let pool = spawn_consumers(
            2,
            routine(|_item: u8, _ctx| async {}),
            outlet,
            DrainPolicy::DrainToCompletion,
            cancellation,
            Arc::clone(&tally),
            Arc::new(NoopLogger),
        );
        pool.await.unwrap();
        assert_eq!(tally.consumed(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_aware_policy_abandons_the_buffer() {
        let (inlet, outlet) = bounded(4);
        let cancellation = Cancellation::new();
        let tally = Arc::new(Tally::default());

        for i in 0..4 {
            inlet.send(i).await.unwrap();
        }
        cancellation.signal();

        // The inlet is still open: only cancellation can end these consumers.
        let pool = spawn_consumers(
            2,
            routine(|_item: u8, _ctx| async {}),
            outlet,
            DrainPolicy::CancelAware,
            cancellation,
            Arc::clone(&tally),
            Arc::new(NoopLogger),
        );
        timeout(Duration::from_secs(1), pool).await.unwrap().unwrap();
        assert_eq!(tally.consumed(), 0);
        drop(inlet);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_aware_consumer_waiting_on_empty_buffer_wakes_up() {
        let (inlet, outlet) = bounded::<u8>(1);
        let cancellation = Cancellation::new();

        let pool = spawn_consumers(
            1,
            routine(|_item, _ctx| async {}),
            outlet,
            DrainPolicy::CancelAware,
            cancellation.clone(),
            Arc::new(Tally::default()),
            Arc::new(NoopLogger),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancellation.signal();

        timeout(Duration::from_secs(1), pool).await.unwrap().unwrap();
        drop(inlet);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_consumer_does_not_stall_the_pool() {
        let (inlet, outlet) = bounded(2);
        let tally = Arc::new(Tally::default());

        let pool = spawn_consumers(
            2,
            routine(|item: u8, _ctx| async move {
                if item == 0 {
                    panic!("consumer failure");
                }
            }),
            outlet,
            DrainPolicy::DrainToCompletion,
            Cancellation::new(),
            Arc::clone(&tally),
            Arc::new(NoopLogger),
        );

        inlet.send(0).await.unwrap();
        inlet.send(1).await.unwrap();
        inlet.send(2).await.unwrap();
        inlet.close();

        timeout(Duration::from_secs(1), pool).await.unwrap().unwrap();
        assert_eq!(tally.consumed(), 2);
    }
}
