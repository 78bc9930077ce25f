//! Field normalization for call-center exports
//!
//! Pure, total conversions from heterogeneous raw cell values into canonical
//! typed values. None of these functions fail: input that cannot be read
//! yields a documented default so a single odd cell never costs a whole row.

use crate::constants::{ANSWERED_STATUS_TOKENS, RATING_SCALE_FIVE_MAX, RATING_SCALE_TEN_MAX};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// `H:MM:SS` / `HH:MM:SS` or `MM:SS`, with optional fractional seconds
static CLOCK_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{1,2})(?::(\d{1,2}(?:[.,]\d+)?))?$").expect("valid duration regex")
});

/// Date-time layouts tried in order; naive values are read as UTC
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Date-only layouts (midnight UTC)
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date in ISO-like or day/month/year form
///
/// Returns `None` when no layout matches; the date is informational and its
/// absence never rejects a row.
pub fn normalize_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    None
}

/// Convert a duration to minutes
///
/// Accepts `HH:MM:SS`, `MM:SS`, or a plain number already in minutes.
/// Unparseable or negative input yields `0.0`.
pub fn normalize_duration(raw: &str) -> f64 {
    let value = raw.trim();
    if value.is_empty() {
        return 0.0;
    }

    if let Some(captures) = CLOCK_DURATION.captures(value) {
        let first = parse_number(&captures[1]).unwrap_or(0.0);
        let second = parse_number(&captures[2]).unwrap_or(0.0);

        let minutes = match captures.get(3) {
            // HH:MM:SS
            Some(seconds) => {
                let seconds = parse_number(seconds.as_str()).unwrap_or(0.0);
                first * 60.0 + second + seconds / 60.0
            }
            // MM:SS
            None => first + second / 60.0,
        };
        return minutes;
    }

    match parse_number(value) {
        Some(minutes) if minutes.is_finite() && minutes >= 0.0 => minutes,
        _ => 0.0,
    }
}

/// Convert a duration to minutes, keeping an explicit leading minus sign
///
/// Used ahead of validation so that negative inputs can be rejected instead
/// of silently counted as zero.
pub fn normalize_signed_duration(raw: &str) -> f64 {
    match raw.trim().strip_prefix('-') {
        Some(magnitude) => -normalize_duration(magnitude),
        None => normalize_duration(raw),
    }
}

/// Normalize a satisfaction rating to the 0–5 scale
///
/// Values outside [0, 10] are discarded; values above 5 are read as a 0–10
/// score and halved. Values already within [1, 5] are returned unchanged.
pub fn normalize_rating(raw: &str) -> Option<f64> {
    let value = parse_number(raw.trim())?;
    if !value.is_finite() || !(0.0..=RATING_SCALE_TEN_MAX).contains(&value) {
        return None;
    }

    if value > RATING_SCALE_FIVE_MAX {
        Some(value / 2.0)
    } else {
        Some(value)
    }
}

/// Read a call count from a numeric cell or a call-status token
///
/// Answered-status tokens count as one call; other tokens and unparseable
/// or negative values count as zero.
pub fn normalize_call_count(raw: &str) -> u64 {
    let value = raw.trim();
    let lowered = value.to_lowercase();
    if ANSWERED_STATUS_TOKENS.contains(&lowered.as_str()) {
        return 1;
    }

    if let Ok(count) = value.parse::<u64>() {
        return count;
    }

    // Spreadsheet cells often carry integers as floats ("3.0")
    match parse_number(value) {
        Some(count) if count.is_finite() && count >= 0.0 && count.fract() == 0.0 => count as u64,
        _ => 0,
    }
}

/// Trim an operator name and collapse runs of internal whitespace
pub fn normalize_operator(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a decimal number accepting either `.` or `,` as the separator
fn parse_number(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    if let Ok(number) = value.parse::<f64>() {
        return Some(number);
    }
    if value.contains(',') && !value.contains('.') {
        return value.replacen(',', ".", 1).parse::<f64>().ok();
    }
    None
}
