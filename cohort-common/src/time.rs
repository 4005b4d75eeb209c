//! Timestamp utilities
//!
//! Meeting exports carry join/leave times in whatever format the
//! conferencing tool (or the spreadsheet program that re-saved the file)
//! chose. [`parse_report_timestamp`] accepts the formats seen in practice and
//! returns `None` for anything else.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Formats tried in order. Two-digit-year variants come first: `%Y` would
/// otherwise accept `26` as the year 26.
const REPORT_FORMATS: &[&str] = &[
    "%m/%d/%y, %I:%M:%S %p",
    "%m/%d/%y %I:%M:%S %p",
    "%m/%d/%y, %I:%M %p",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a join/leave timestamp from a report cell
///
/// RFC 3339 values with an offset are converted to UTC; everything else is
/// taken as naive wall-clock time.
pub fn parse_report_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    REPORT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Convert a spreadsheet serial date (days since 1899-12-30) to a timestamp
///
/// Returns `None` outside the range spreadsheet programs can represent.
pub fn from_spreadsheet_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
