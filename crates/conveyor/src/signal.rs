//! Process interrupt integration.
//!
//! The runner knows nothing about OS signals; it only exposes
//! [`Runner::stop`](crate::Runner::stop). [`trap_interrupt`] bridges the two:
//! it listens for SIGINT (Ctrl+C), and SIGTERM on unix, and calls
//! [`Stoppable::stop`] once per delivered signal.

use crate::Runner;
use futures::{Stream, StreamExt, stream};
use std::{io, sync::Arc};
use tokio::task::JoinHandle;

/// Anything that can be asked to stop.
pub trait Stoppable: Send + Sync + 'static {
    fn stop(&self);
}

impl<T> Stoppable for Runner<T>
where
    T: Send + 'static,
{
    fn stop(&self) {
        Runner::stop(self);
    }
}

impl<S: Stoppable + ?Sized> Stoppable for Arc<S> {
    fn stop(&self) {
        (**self).stop();
    }
}

/// Installs interrupt handlers that forward every signal to `target`.
///
/// The returned task runs until aborted or until the signal streams end.
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub fn trap_interrupt<S: Stoppable>(target: S) -> io::Result<JoinHandle<()>> {
    let signals = interrupts()?;
    Ok(tokio::spawn(forward(signals, target)))
}

#[cfg(unix)]
fn interrupts() -> io::Result<impl Stream<Item = ()> + Send + Unpin + 'static> {
    use tokio::signal::unix::{SignalKind, signal};
    use tokio_stream::wrappers::SignalStream;

    let interrupt = SignalStream::new(signal(SignalKind::interrupt())?);
    let terminate = SignalStream::new(signal(SignalKind::terminate())?);
    Ok(stream::select(interrupt, terminate).boxed())
}

#[cfg(not(unix))]
fn interrupts() -> io::Result<impl Stream<Item = ()> + Send + Unpin + 'static> {
    Ok(stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
    })
    .boxed())
}

/// Calls `target.stop()` once per item of `signals`.
async fn forward<St, S>(mut signals: St, target: S)
where
    St: Stream<Item = ()> + Unpin,
    S: Stoppable,
{
    while signals.next().await.is_some() {
        #[cfg(feature = "tracing")]
        tracing::info!("Interrupt received, stopping");
        target.stop();
    }
}
