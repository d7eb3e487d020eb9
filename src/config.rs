use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Remote prefix every strip address is built on.
pub const DEFAULT_BASE_URL: &str = "https://d1ejxu6vysztl5.cloudfront.net/comics/usacres";

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration for a download run.
///
/// Built once by the driver before the engine starts and read-only
/// afterwards. The default date range covers the full run of the series.
///
/// # Examples
///
/// ```
/// use usacres::Config;
///
/// let config = Config::default();
/// assert_eq!(config.workers, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub quiet: bool,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn default_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(1986, 3, 3).expect("valid literal date")
    }

    pub fn default_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(1989, 5, 7).expect("valid literal date")
    }

    /// Checks the invariants the engine relies on.
    ///
    /// # Errors
    /// * `AppError::Config` if `workers` is zero
    /// * `AppError::UrlParse` if `base_url` is not an absolute URL
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(AppError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        Url::parse(&self.base_url)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_date: Self::default_start(),
            end_date: Self::default_end(),
            output_dir: PathBuf::from("./usacres"),
            workers: DEFAULT_WORKERS,
            quiet: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}
