//! A chatty demonstration workload.
//!
//! Every producer emits `messages` numbered lines (`"<id> - <n>"`), pausing
//! between each; consumers print what they receive after a longer pause.
//! Consumers are slower than producers, so the buffer fills up and the
//! producers visibly wait for room. Interrupting the run shows the selected
//! drain policy at work.

use conveyor::{Runner, RunnerConfig};
use parking_lot::Mutex;
use std::{mem, sync::Arc, time::Duration};

pub const DEFAULT_PRODUCERS: usize = 2;
pub const DEFAULT_MESSAGES: usize = 99;
pub const DEFAULT_PRODUCE_PAUSE: Duration = Duration::from_millis(100);
pub const DEFAULT_CONSUME_PAUSE: Duration = Duration::from_millis(800);

/// Workload shape for [`chatter_runner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatterSettings {
    /// Messages emitted by each producer.
    pub messages: usize,
    /// Pause after each emitted message.
    pub produce_pause: Duration,
    /// Pause before each consumed message is recorded.
    pub consume_pause: Duration,
}

impl Default for ChatterSettings {
    fn default() -> Self {
        Self {
            messages: DEFAULT_MESSAGES,
            produce_pause: DEFAULT_PRODUCE_PAUSE,
            consume_pause: DEFAULT_CONSUME_PAUSE,
        }
    }
}

/// Ordered record of everything produced and consumed.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Mutex<Vec<String>>,
    echo: bool,
}

impl Transcript {
    /// A transcript that also prints every line to stdout.
    pub fn echoing() -> Self {
        Self {
            lines: Mutex::default(),
            echo: true,
        }
    }

    fn push(&self, line: String) {
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().push(line);
    }

    pub fn take(&self) -> Vec<String> {
        mem::take(&mut *self.lines.lock())
    }
}

pub fn message(producer: usize, n: usize) -> String {
    format!("{producer:02} - {n:02}")
}

/// Builds the chatter runner. Every line lands in `transcript`.
pub fn chatter_runner(
    config: RunnerConfig,
    settings: ChatterSettings,
    transcript: Arc<Transcript>,
) -> Runner<String> {
    let produced = Arc::clone(&transcript);

    Runner::with_config(config)
        .produce_with(move |ctx| {
            let transcript = Arc::clone(&produced);
            async move {
                let id = ctx.id().index();
                for n in 0..settings.messages {
                    let msg = message(id, n);
                    let line = format!("Produce - {id:02}: {msg}");
                    if !ctx.emit(msg).await {
                        return;
                    }
                    transcript.push(line);
                    tokio::time::sleep(settings.produce_pause).await;
                }
            }
        })
        .consume_with(move |msg: String, ctx| {
            let transcript = Arc::clone(&transcript);
            async move {
                tokio::time::sleep(settings.consume_pause).await;
                let id = ctx.id().index();
                transcript.push(format!("Consume - {id:02}:        {msg}"));
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor::{DrainPolicy, NoopLogger};

    fn quick(messages: usize) -> ChatterSettings {
        ChatterSettings {
            messages,
            produce_pause: Duration::from_millis(1),
            consume_pause: Duration::from_millis(1),
        }
    }

    fn config(producers: usize, consumers: usize, drain: DrainPolicy) -> RunnerConfig {
        RunnerConfig {
            producers,
            consumers,
            drain,
        }
    }

    #[test]
    fn messages_are_zero_padded() {
        assert_eq!(message(0, 7), "00 - 07");
        assert_eq!(message(12, 98), "12 - 98");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_message_is_produced_and_consumed() {
        let transcript = Arc::new(Transcript::default());
        let runner = chatter_runner(
            config(3, 2, DrainPolicy::DrainToCompletion),
            quick(5),
            Arc::clone(&transcript),
        )
        .logger(Arc::new(NoopLogger));

        let summary = runner.run().await.unwrap();
        assert_eq!(summary.produced, 15);
        assert_eq!(summary.consumed, 15);

        let lines = transcript.take();
        let produced = lines.iter().filter(|l| l.starts_with("Produce - ")).count();
        let consumed = lines.iter().filter(|l| l.starts_with("Consume - ")).count();
        assert_eq!(produced, 15);
        assert_eq!(consumed, 15);
        assert!(lines.iter().any(|l| l == "Produce - 02: 02 - 04"));
        assert!(lines.iter().any(|l| l.ends_with(" 02 - 04") && l.starts_with("Consume")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_messages_are_not_reported_as_produced() {
        let transcript = Arc::new(Transcript::default());
        let runner = chatter_runner(
            config(DEFAULT_PRODUCERS, 2, DrainPolicy::CancelAware),
            quick(5),
            Arc::clone(&transcript),
        )
        .logger(Arc::new(NoopLogger));

        runner.stop();
        let summary = runner.run().await.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.produced, 0);
        assert!(transcript.take().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stop_cuts_the_chatter_short() {
        let transcript = Arc::new(Transcript::default());
        let settings = ChatterSettings {
            messages: DEFAULT_MESSAGES,
            produce_pause: Duration::from_millis(5),
            consume_pause: Duration::from_millis(20),
        };
        let runner = Arc::new(
            chatter_runner(
                config(2, 2, DrainPolicy::CancelAware),
                settings,
                Arc::clone(&transcript),
            )
            .logger(Arc::new(NoopLogger)),
        );

        let stopper = Arc::clone(&runner);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stopper.stop();
        });

        let summary = runner.run().await.unwrap();
        assert!(summary.cancelled);
        assert!(summary.produced < 2 * DEFAULT_MESSAGES);
        assert!(summary.consumed <= summary.produced);

        let produced = transcript
            .take()
            .iter()
            .filter(|l| l.starts_with("Produce - "))
            .count();
        assert_eq!(produced, summary.produced);
    }
}
