use crate::config::{Config, DEFAULT_BASE_URL, DEFAULT_WORKERS};
use crate::dates::parse_date_argument;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Downloads the daily U.S. Acres strips for a range of dates.
///
/// Files already present in the output directory are left untouched, so an
/// interrupted run can simply be started again.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Date of the first strip. Defaults to 19860303.
    #[arg(short, long, value_name = "YYYY[MM[DD]]")]
    pub start: Option<String>,

    /// Date of the last strip. Defaults to 19890507.
    #[arg(short, long, value_name = "YYYY[MM[DD]]")]
    pub end: Option<String>,

    /// Output directory.
    #[arg(short, long, value_name = "DIR", default_value = "./usacres")]
    pub output: PathBuf,

    /// Number of connections to use when downloading files.
    #[arg(short = 'x', long, default_value_t = DEFAULT_WORKERS)]
    pub connections: usize,

    /// Do not output anything to the console.
    #[arg(short, long)]
    pub quiet: bool,

    /// Give up on a single file after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print debug logging to stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(long, hide = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

impl Args {
    /// Turns the raw arguments into a validated [`Config`].
    ///
    /// # Errors
    /// * If a date argument is malformed
    /// * If the resulting configuration is invalid
    pub fn into_config(self) -> Result<Config> {
        let start_date = match &self.start {
            Some(s) => parse_date_argument(s)?,
            None => Config::default_start(),
        };
        let end_date = match &self.end {
            Some(s) => parse_date_argument(s)?,
            None => Config::default_end(),
        };

        let config = Config {
            start_date,
            end_date,
            output_dir: self.output,
            workers: self.connections,
            quiet: self.quiet,
            base_url: self.base_url,
            timeout: self.timeout.map(Duration::from_secs),
        };
        config.validate()?;
        Ok(config)
    }
}
