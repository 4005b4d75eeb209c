//! Free-text duration parsing
//!
//! Conferencing exports write durations as `"1h 27m 29s"`, `"46m 5s"`,
//! `"01:12:45"` or bare minute counts. Parsing never fails: anything that
//! cannot be read is 0.0 minutes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::cell::CellValue;

static HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*h").expect("hours pattern"));
static MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*m").expect("minutes pattern"));
static SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*s").expect("seconds pattern"));

/// Convert one duration cell into minutes
///
/// Rules, first applicable wins:
/// 1. numeric cells are already minutes
/// 2. `h`/`m`/`s` units, each optional: `hours*60 + minutes + seconds/60`
/// 3. `h:m:s` or `m:s`
/// 4. digits and dots left after stripping everything else
///
/// The result is never negative or non-finite.
pub fn parse_duration(cell: &CellValue) -> f64 {
    let minutes = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(text) => parse_duration_text(text),
        CellValue::Empty => 0.0,
    };

    if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        0.0
    }
}

/// Text form of [`parse_duration`]
pub fn parse_duration_text(raw: &str) -> f64 {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return 0.0;
    }

    if text.contains(['h', 'm', 's']) {
        let total = unit_value(&HOURS, &text) * 60.0
            + unit_value(&MINUTES, &text)
            + unit_value(&SECONDS, &text) / 60.0;
        if total > 0.0 {
            return total;
        }
    }

    if text.contains(':') {
        if let Some(total) = parse_clock(&text) {
            return total;
        }
    }

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().unwrap_or(0.0)
}

fn unit_value(pattern: &Regex, text: &str) -> f64 {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// `h:m:s` or `m:s`; other shapes and non-integer parts fall through
fn parse_clock(text: &str) -> Option<f64> {
    let parts = text
        .split(':')
        .map(|part| part.trim().parse::<u32>().map(f64::from))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    match parts.as_slice() {
        [h, m, s] => Some(h * 60.0 + m + s / 60.0),
        [m, s] => Some(m + s / 60.0),
        _ => None,
    }
}
