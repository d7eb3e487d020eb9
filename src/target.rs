use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate};
use url::Url;

/// A single strip to fetch: its remote address and the day it belongs to.
///
/// The address is the identity of the target. It is used as the work item
/// and to derive the local file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    url: String,
    date: NaiveDate,
}

impl FetchTarget {
    /// Builds the target for `date` under `base_url`.
    ///
    /// Layout: `<base_url>/<year>/usa<year>-<MM>-<DD>.gif`.
    pub fn for_date(base_url: &str, date: NaiveDate) -> Self {
        let base = base_url.trim_end_matches('/');
        let url = format!(
            "{base}/{year}/usa{year}-{month:02}-{day:02}.gif",
            year = date.year(),
            month = date.month(),
            day = date.day(),
        );
        Self { url, date }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Final path segment of the remote address.
    ///
    /// # Errors
    /// * `AppError::UrlParse` if the address is not a valid URL
    /// * `AppError::InvalidTarget` if it has no non-empty final segment
    pub fn file_name(&self) -> Result<String> {
        let url = Url::parse(&self.url)?;
        url.path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidTarget(self.url.clone()))
    }
}

/// Generates one target per day from `start` to `end`, both inclusive.
///
/// Returns an empty list when `end` is before `start`.
pub fn generate_targets(base_url: &str, start: NaiveDate, end: NaiveDate) -> Vec<FetchTarget> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| FetchTarget::for_date(base_url, date))
        .collect()
}
