//! Human-readable duration formatting
//!
//! Renders minute totals in the same `1h 27m 29s` shape meeting tools use in
//! their exports, so values written back out (CSV exports, log lines) read the
//! same way as the reports they came from.

/// Format a minute total as `Hh Mm Ss`, dropping leading zero units.
///
/// Rounds to the nearest second. Negative values are prefixed with `-`.
///
/// # Examples
///
/// ```
/// use cohort_common::human_time::format_minutes;
///
/// assert_eq!(format_minutes(87.0 + 29.0 / 60.0), "1h 27m 29s");
/// assert_eq!(format_minutes(46.0 + 5.0 / 60.0), "46m 5s");
/// assert_eq!(format_minutes(0.5), "30s");
/// assert_eq!(format_minutes(0.0), "0s");
/// ```
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() {
        return "0s".to_string();
    }

    let is_negative = minutes < 0.0;
    let total_seconds = (minutes.abs() * 60.0).round() as i64;

    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    let formatted = if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    };

    if is_negative && total_seconds > 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}
