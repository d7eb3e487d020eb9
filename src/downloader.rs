use crate::progress::{DownloadSummary, DownloadTally, ProgressEvent, ProgressReporter};
use crate::queue::WorkQueue;
use crate::target::FetchTarget;
use crate::{
    config::Config,
    error::{AppError, Result},
};
use futures::future::join_all;
use futures::FutureExt;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// What happened to a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already existed; no request was made.
    Skipped,
    /// The resource was retrieved and written.
    Fetched { bytes: usize },
}

/// Creates the output directory and any missing parents.
///
/// # Errors
/// * If the directory cannot be created
pub async fn ensure_output_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

/// Downloads `target` into `output_dir` unless the file is already there.
///
/// The local name is the final path segment of the remote address. The whole
/// body is read before the destination is created, so a failed transfer
/// leaves nothing behind. An existing file is never inspected: a truncated
/// leftover from an interrupted write is skipped like a complete one.
///
/// # Errors
/// * `AppError::Fetch` if the request fails or the host answers with an error status
/// * `AppError::Write` if the file cannot be written
/// * Any error deriving the file name or checking the destination
#[instrument(skip(client, target, output_dir), fields(url = target.url()))]
pub async fn fetch_or_skip(
    client: &reqwest::Client,
    target: &FetchTarget,
    output_dir: &Path,
) -> Result<FetchOutcome> {
    let destination = output_dir.join(target.file_name()?);
    if tokio::fs::try_exists(&destination).await? {
        debug!("{} already exists, skipping", destination.display());
        return Ok(FetchOutcome::Skipped);
    }

    let fetch_error = |source| AppError::Fetch {
        path: destination.clone(),
        source,
    };

    let response = client
        .get(target.url())
        .send()
        .await
        .map_err(fetch_error)?
        .error_for_status()
        .map_err(fetch_error)?;
    let body = response.bytes().await.map_err(fetch_error)?;

    tokio::fs::write(&destination, &body)
        .await
        .map_err(|source| AppError::Write {
            path: destination.clone(),
            source,
        })?;

    debug!("Wrote {} bytes to {}", body.len(), destination.display());
    Ok(FetchOutcome::Fetched { bytes: body.len() })
}

/// Download engine: a fixed pool of workers draining one shared queue.
///
/// # Fields
/// * `client` - HTTP client shared by all workers
/// * `config` - Run configuration
pub struct Downloader {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl Downloader {
    /// Creates a new `Downloader` from a validated configuration.
    ///
    /// The output directory is expected to exist already, see
    /// [`ensure_output_dir`].
    ///
    /// # Errors
    /// * If the configuration is invalid
    /// * If the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config: Arc::new(config),
        })
    }

    /// Targets implied by the configured date range.
    pub fn targets(&self) -> Vec<FetchTarget> {
        crate::target::generate_targets(
            &self.config.base_url,
            self.config.start_date,
            self.config.end_date,
        )
    }

    /// Processes every target and returns once all of them are completed.
    ///
    /// Progress and failure lines go to stdout unless the run is quiet.
    pub async fn run(&self, targets: Vec<FetchTarget>) -> DownloadSummary {
        if self.config.quiet {
            return self
                .run_with_reporter(targets, ProgressReporter::silent())
                .await;
        }

        let (reporter, writer) = ProgressReporter::stdout();
        let summary = self.run_with_reporter(targets, reporter).await;
        if let Err(e) = writer.await {
            warn!("Progress writer stopped unexpectedly: {}", e);
        }
        summary
    }

    /// Same as [`Downloader::run`], reporting through `reporter`.
    ///
    /// # Details
    /// * All targets are enqueued before any worker starts
    /// * `config.workers` tasks claim items until the queue is empty
    /// * Failures are reported and counted; they never stop the run
    /// * Returns after the queue join and after every worker has exited
    #[instrument(skip_all, fields(total = targets.len(), workers = self.config.workers))]
    pub async fn run_with_reporter(
        &self,
        targets: Vec<FetchTarget>,
        reporter: ProgressReporter,
    ) -> DownloadSummary {
        let start_time = Instant::now();
        let queue = WorkQueue::new(targets);
        let total = queue.total();
        let tally = Arc::new(DownloadTally::default());
        let output_dir = Arc::new(self.config.output_dir.clone());

        let handles: Vec<_> = (0..self.config.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    total,
                    queue: Arc::clone(&queue),
                    client: self.client.clone(),
                    output_dir: Arc::clone(&output_dir),
                    reporter: reporter.clone(),
                    tally: Arc::clone(&tally),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(reporter);

        queue.join().await;

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Worker task failed: {}", e);
            }
        }

        let summary = tally.summary(total, start_time);
        debug!("{}", summary);
        summary
    }

    /// Returns a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// One member of the worker pool.
///
/// `total` is fixed at construction and only used for progress lines.
struct Worker {
    id: usize,
    total: usize,
    queue: Arc<WorkQueue>,
    client: reqwest::Client,
    output_dir: Arc<PathBuf>,
    reporter: ProgressReporter,
    tally: Arc<DownloadTally>,
}

impl Worker {
    async fn run(self) {
        while let Some(claim) = self.queue.claim().await {
            let target = claim.target();
            let name = target
                .file_name()
                .unwrap_or_else(|_| target.url().to_string());
            self.reporter.report(ProgressEvent::Claimed {
                done: claim.done(),
                total: self.total,
                name,
            });

            let result = AssertUnwindSafe(fetch_or_skip(&self.client, target, &self.output_dir))
                .catch_unwind()
                .await;
            self.record(result);

            claim.complete();
        }
        debug!(worker = self.id, "Queue drained, worker exiting");
    }

    fn record(&self, result: std::thread::Result<Result<FetchOutcome>>) {
        match result {
            Ok(Ok(FetchOutcome::Skipped)) => self.tally.record_skipped(),
            Ok(Ok(FetchOutcome::Fetched { .. })) => self.tally.record_fetched(),
            Ok(Err(e)) => {
                self.tally.record_failure();
                match e.destination() {
                    Some(path) => {
                        warn!(worker = self.id, "{}", e);
                        self.reporter.report(ProgressEvent::FetchFailed {
                            path: path.to_path_buf(),
                            message: e.cause_message(),
                        });
                    }
                    None => {
                        warn!(worker = self.id, "Error: {}", e);
                        self.reporter.report(ProgressEvent::Unexpected {
                            message: e.to_string(),
                        });
                    }
                }
            }
            Err(payload) => {
                self.tally.record_failure();
                let message = panic_message(payload.as_ref());
                error!(worker = self.id, "Panic while processing item: {}", message);
                self.reporter.report(ProgressEvent::Unexpected { message });
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
