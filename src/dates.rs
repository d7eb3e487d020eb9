use crate::error::{AppError, Result};
use chrono::NaiveDate;

/// Parses a date argument of the form `YYYY`, `YYYYMM` or `YYYYMMDD`.
///
/// Missing month or day components default to the first of the period, so
/// `1987` is January 1st 1987 and `198706` is June 1st 1987.
///
/// # Errors
/// Returns `AppError::InvalidDate` for any other length, for non-digit
/// input, and for dates that do not exist on the calendar.
pub fn parse_date_argument(input: &str) -> Result<NaiveDate> {
    let invalid = || AppError::InvalidDate(input.to_string());

    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let field = |range: std::ops::Range<usize>| -> Result<u32> {
        input[range].parse::<u32>().map_err(|_| invalid())
    };

    let (year, month, day) = match input.len() {
        4 => (field(0..4)?, 1, 1),
        6 => (field(0..4)?, field(4..6)?, 1),
        8 => (field(0..4)?, field(4..6)?, field(6..8)?),
        _ => return Err(invalid()),
    };

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)
}
