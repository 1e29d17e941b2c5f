//! Concurrent file digests.
//!
//! Producers walk the configured roots and emit the path of every regular
//! file; consumers read each file and record its SHA-256 digest. Roots are
//! split across producers by task index, so `--producers 4` walks up to four
//! roots at once.
//!
//! Directory walking is blocking I/O, so each producer walks on Tokio's
//! blocking pool and hands paths back to the runner with
//! [`Handle::block_on`].

use conveyor::{ProduceContext, RunSummary, Runner, RunnerConfig};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    mem,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::runtime::Handle;
use walkdir::WalkDir;

/// A SHA-256 digest.
pub type Sha256Digest = [u8; 32];

/// Collects results from every consumer and errors from every producer.
#[derive(Debug, Default)]
pub struct DigestSink {
    digests: Mutex<BTreeMap<PathBuf, Sha256Digest>>,
    errors: Mutex<Vec<String>>,
}

impl DigestSink {
    fn record_digest(&self, path: PathBuf, digest: Sha256Digest) {
        self.digests.lock().insert(path, digest);
    }

    fn record_error(&self, error: String) {
        tracing::warn!("{error}");
        self.errors.lock().push(error);
    }

    /// Takes everything collected so far.
    pub fn take_report(&self, summary: RunSummary) -> DigestReport {
        DigestReport {
            digests: mem::take(&mut *self.digests.lock()),
            errors: mem::take(&mut *self.errors.lock()),
            summary,
        }
    }
}

/// Result of a digest run.
#[derive(Debug)]
pub struct DigestReport {
    /// Digest of every file that could be read, ordered by path.
    pub digests: BTreeMap<PathBuf, Sha256Digest>,
    /// Walk failures, read failures and cancelled walks.
    pub errors: Vec<String>,
    pub summary: RunSummary,
}

impl DigestReport {
    /// `sha256sum`-style output lines: `<hex digest>  <path>`.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.digests
            .iter()
            .map(|(path, digest)| format!("{}  {}", hex::encode(digest), path.display()))
    }
}

/// Builds a runner that digests every regular file below `roots`.
pub fn digest_runner(
    roots: Vec<PathBuf>,
    config: RunnerConfig,
    sink: Arc<DigestSink>,
) -> Runner<PathBuf> {
    let roots = Arc::new(roots);
    let producers = config.producers;
    let walk_sink = Arc::clone(&sink);

    Runner::with_config(config)
        .produce_with(move |ctx| {
            let roots = Arc::clone(&roots);
            let sink = Arc::clone(&walk_sink);
            async move {
                let handle = Handle::current();
                let walked = tokio::task::spawn_blocking(move || {
                    let mine = roots.iter().skip(ctx.id().index()).step_by(producers);
                    for root in mine {
                        if let Err(e) = walk_files(&handle, &ctx, root) {
                            sink.record_error(e);
                        }
                    }
                })
                .await;
                if let Err(e) = walked {
                    tracing::error!("Walker task failed: {e}");
                }
            }
        })
        .consume_with(move |path: PathBuf, _ctx| {
            let sink = Arc::clone(&sink);
            async move {
                match tokio::fs::read(&path).await {
                    Ok(data) => sink.record_digest(path, sha256(&data)),
                    Err(e) => sink.record_error(format!("{}: {e}", path.display())),
                }
            }
        })
}

/// Emits every regular file below `root`. Stops at the first walk error or
/// once the run is cancelled.
fn walk_files(
    handle: &Handle,
    ctx: &ProduceContext<PathBuf>,
    root: &Path,
) -> Result<(), String> {
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| format!("{}: {e}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !handle.block_on(ctx.emit(entry.into_path())) {
            return Err(format!("{}: walk canceled", root.display()));
        }
    }
    Ok(())
}

pub fn sha256(data: &[u8]) -> Sha256Digest {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor::NoopLogger;
    use std::fs;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("empty.bin"), b"").unwrap();
        fs::write(dir.path().join("nested").join("other.txt"), b"other").unwrap();
        dir
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(hex::encode(sha256(b"hello")), HELLO_SHA256);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn digests_every_regular_file() {
        let dir = tree();
        let sink = Arc::new(DigestSink::default());
        let runner = digest_runner(
            vec![dir.path().to_path_buf()],
            RunnerConfig::default(),
            Arc::clone(&sink),
        )
        .logger(Arc::new(NoopLogger));

        let summary = runner.run().await.unwrap();
        let report = sink.take_report(summary);

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.summary.produced, 3);
        assert_eq!(report.digests.len(), 3);
        assert_eq!(
            report.digests[&dir.path().join("hello.txt")],
            sha256(b"hello")
        );

        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(HELLO_SHA256), "sorted by path: {lines:?}");
        assert!(lines[0].ends_with("hello.txt"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn roots_are_split_across_producers() {
        let first = tree();
        let second = tree();
        let sink = Arc::new(DigestSink::default());
        let config = RunnerConfig {
            producers: 2,
            consumers: 2,
            ..Default::default()
        };
        let runner = digest_runner(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            config,
            Arc::clone(&sink),
        )
        .logger(Arc::new(NoopLogger));

        let report = sink.take_report(runner.run().await.unwrap());
        assert_eq!(report.digests.len(), 6);
        assert_eq!(report.summary.consumed, 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn missing_root_is_reported() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(DigestSink::default());
        let runner = digest_runner(
            vec![dir.path().join("does-not-exist")],
            RunnerConfig::default(),
            Arc::clone(&sink),
        )
        .logger(Arc::new(NoopLogger));

        let report = sink.take_report(runner.run().await.unwrap());
        assert!(report.digests.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_walk_is_reported() {
        let dir = tree();
        let sink = Arc::new(DigestSink::default());
        let runner = digest_runner(
            vec![dir.path().to_path_buf()],
            RunnerConfig::default(),
            Arc::clone(&sink),
        )
        .logger(Arc::new(NoopLogger));

        runner.stop();
        let report = sink.take_report(runner.run().await.unwrap());
        assert!(report.summary.cancelled);
        assert!(report.digests.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].ends_with("walk canceled"));
    }
}
