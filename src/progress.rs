use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Progress tracking and reporting.
///
/// Workers never write to the console themselves. They send events to a
/// single writer task, so lines from different workers never interleave.

/// A single console line produced during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A worker claimed an item: `[<done>/<total>] <name>`.
    Claimed {
        done: usize,
        total: usize,
        name: String,
    },
    /// Retrieval or write of one item failed.
    FetchFailed { path: PathBuf, message: String },
    /// Anything else that went wrong while processing an item.
    Unexpected { message: String },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Claimed { done, total, name } => write!(f, "[{done}/{total}] {name}"),
            ProgressEvent::FetchFailed { path, message } => {
                write!(f, "Could not download file {} ({message})", path.display())
            }
            ProgressEvent::Unexpected { message } => write!(f, "Error: {message}"),
        }
    }
}

/// Cloneable handle workers use to report progress.
///
/// A silent reporter discards every event.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn silent() -> Self {
        Self { tx: None }
    }

    /// Starts the writer task and returns the handle feeding it.
    ///
    /// The task ends once every clone of the reporter has been dropped and
    /// hands the writer back, which lets tests inspect what was written.
    pub fn spawn<W>(mut writer: W) -> (Self, JoinHandle<W>)
    where
        W: Write + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let handle = tokio::task::spawn_blocking(move || {
            while let Some(event) = rx.blocking_recv() {
                if let Err(e) = writeln!(writer, "{event}").and_then(|_| writer.flush()) {
                    tracing::debug!("Progress output failed: {}", e);
                }
            }
            writer
        });
        (Self { tx: Some(tx) }, handle)
    }

    pub fn stdout() -> (Self, JoinHandle<std::io::Stdout>) {
        Self::spawn(std::io::stdout())
    }

    pub fn report(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // The writer only goes away after all senders are dropped.
            let _ = tx.send(event);
        }
    }
}

/// Outcome counters shared by all workers of one run.
#[derive(Default)]
pub struct DownloadTally {
    fetched: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadTally {
    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self, total: usize, start_time: Instant) -> DownloadSummary {
        DownloadSummary {
            total,
            fetched: self.fetched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed: start_time.elapsed(),
        }
    }
}

/// Final statistics of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl DownloadSummary {
    /// Items that reached a terminal state.
    pub fn completed(&self) -> usize {
        self.fetched + self.skipped + self.failed
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} strips in {:.1}s: {} downloaded, {} already present, {} failed",
            self.total,
            self.elapsed.as_secs_f64(),
            self.fetched,
            self.skipped,
            self.failed
        )
    }
}
