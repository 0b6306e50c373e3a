//! Lenient date parsing for import tooling.
//!
//! Entry dates are `chrono::NaiveDate` throughout. Importers get dates in
//! many spellings, so this accepts the common ones and drops any time part.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// The input matched none of the accepted date spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized date: {0:?}")]
pub struct DateParseError(pub String);

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y %m %d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%a %b %d, %Y",
    "%A %b %d, %Y",
    "%a %B %d, %Y",
    "%A %B %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %I:%M %p",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
];

/// Parses a date written in any of the supported spellings.
///
/// ```
/// use chrono::NaiveDate;
/// use tally_shared::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(2023, 7, 23).unwrap();
/// assert_eq!(parse_date("2023/07/23").unwrap(), expected);
/// assert_eq!(parse_date("July 23, 2023").unwrap(), expected);
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| DateParseError(input.to_string()))
}
