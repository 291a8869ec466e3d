pub mod digits;
pub mod jalali;

pub use digits::normalize_digits;
pub use jalali::{DateError, JalaliDate};

use crate::parsers::Document;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown when a page carries no usable publication date
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Publication date of a matched page, in the Gregorian calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishedDate {
    /// The page's date marker was read and converted
    Gregorian(NaiveDate),
    /// No marker, or a marker that did not hold a valid Jalali date
    Unknown,
}

impl PublishedDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            PublishedDate::Gregorian(date) => Some(*date),
            PublishedDate::Unknown => None,
        }
    }
}

impl fmt::Display for PublishedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishedDate::Gregorian(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PublishedDate::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

/// Returns the trimmed text of the page's post date marker, if it has one
pub fn extract_date(doc: &Document) -> Option<String> {
    let raw = doc.date_marker_text()?;
    ::log::debug!("Extracted Jalali date: {}", raw);
    Some(raw)
}

/// Reads a `YYYY/MM/DD` Jalali date written in Persian or Western digits
pub fn parse_jalali(raw: &str) -> Result<JalaliDate, DateError> {
    normalize_digits(raw).parse()
}

/// Converts a raw Jalali date string straight to Gregorian
pub fn convert(raw: &str) -> Result<NaiveDate, DateError> {
    parse_jalali(raw)?.to_gregorian()
}

/// Converts an optional raw marker text, degrading every failure to [`PublishedDate::Unknown`]
pub fn to_gregorian(raw: Option<&str>) -> PublishedDate {
    let Some(raw) = raw else {
        return PublishedDate::Unknown;
    };

    match convert(raw) {
        Ok(date) => PublishedDate::Gregorian(date),
        Err(e) => {
            ::log::debug!("Ignoring unreadable post date {:?}: {}", raw, e);
            PublishedDate::Unknown
        }
    }
}
