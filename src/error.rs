use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for the downloader.
///
/// Covers:
/// - IO operations on the output directory
/// - Network requests against the remote host
/// - URL and date-argument parsing
/// - Configuration validation

/// Represents all possible errors that can occur in the application.
///
/// # Error Categories
///
/// - Fetch / Write: a single target could not be stored at its destination
/// - Config / InvalidDate: rejected before the engine starts
/// - InvalidTarget: a remote address with no usable file name
/// - IO, Request, UrlParse: wrapped library errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Could not download file {}: {source}", path.display())]
    Fetch {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not write file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date '{0}', expected YYYY[MM[DD]]")]
    InvalidDate(String),

    #[error("Invalid target address: {0}")]
    InvalidTarget(String),
}

impl AppError {
    /// Destination path of a failed download, if this error belongs to one.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            AppError::Fetch { path, .. } | AppError::Write { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }

    /// Message of the underlying cause, without the path prefix.
    pub fn cause_message(&self) -> String {
        match self {
            AppError::Fetch { source, .. } => source.to_string(),
            AppError::Write { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
