/// A concurrent downloader for a date-indexed series of comic strips.
///
/// A date range is turned into one remote address per day, and a small pool
/// of workers fetches each address into the output directory, skipping files
/// that are already there.
///
/// # Architecture
///
/// - `Config` / `Args`: run configuration and its command-line surface
/// - `FetchTarget` / `generate_targets`: the URL generator
/// - `WorkQueue`: shared queue with claim, complete and join
/// - `Downloader`: the worker pool and the fetch-or-skip operation
/// - `ProgressReporter`: single-writer console output
///
/// # Example
/// ```no_run
/// use usacres::{Config, Downloader};
///
/// async fn example() {
///     let config = Config::default();
///     usacres::ensure_output_dir(&config.output_dir).await.unwrap();
///     let downloader = Downloader::new(config).unwrap();
///     let summary = downloader.run(downloader.targets()).await;
///     println!("{}", summary);
/// }
/// ```
pub mod cli;
pub mod config;
pub mod dates;
pub mod downloader;
pub mod error;
pub mod progress;
pub mod queue;
pub mod target;

// Re-export commonly used items
pub use cli::Args;
pub use config::Config;
pub use downloader::{ensure_output_dir, fetch_or_skip, Downloader, FetchOutcome};
pub use error::AppError;
pub use progress::{DownloadSummary, ProgressEvent, ProgressReporter};
pub use queue::WorkQueue;
pub use target::{generate_targets, FetchTarget};
