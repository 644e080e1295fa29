//! Timestamp parsing and self-scaling datetime matching.
//!
//! Relative datetime tolerance is a fraction of the smaller of the two
//! columns' time spans, so it follows the data's own temporal spread.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::matcher::{Matcher, nearest_within};

/// Parse a textual timestamp into a naive instant.
///
/// Accepts RFC 3339 (converted to UTC), common datetime and date layouts,
/// and partial `YYYY-MM` / `YYYY` values, which resolve to their first day.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    try_parse_datetime(trimmed)
        .or_else(|| try_parse_date(trimmed).map(|d| d.and_time(NaiveTime::MIN)))
        .or_else(|| try_parse_partial(trimmed).map(|d| d.and_time(NaiveTime::MIN)))
}

fn try_parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d-%b-%Y %H:%M:%S", // 15-Jan-2024 10:30:00
        "%m/%d/%Y %H:%M:%S", // US
        "%m/%d/%Y %H:%M",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%b-%Y", // 15-Jan-2024
        "%m/%d/%Y", // US: 01/15/2024
        "%d.%m.%Y", // German: 15.01.2024
        "%Y%m%d",   // Compact: 20240115
        "%b %d, %Y",
        "%B %d, %Y",
        "%d %b %Y",
        "%d %B %Y",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn try_parse_partial(value: &str) -> Option<NaiveDate> {
    // YYYY-MM
    if value.len() == 7 && value.as_bytes()[4] == b'-' {
        let year = value[0..4].parse::<i32>().ok()?;
        let month = value[5..7].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    // YYYY
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// `max - min` over the values, or `None` when there are none.
pub fn time_span(values: &[NaiveDateTime]) -> Option<TimeDelta> {
    let min = values.iter().min()?;
    let max = values.iter().max()?;
    Some(*max - *min)
}

/// A duration as fractional seconds.
pub fn seconds(delta: TimeDelta) -> f64 {
    let delta = delta.abs();
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Matches timestamps within a window in seconds.
#[derive(Debug, Clone, Copy)]
pub struct DatetimeMatcher {
    tolerance_seconds: f64,
}

impl DatetimeMatcher {
    /// A fixed window in seconds.
    pub fn absolute(seconds: f64) -> Self {
        Self {
            tolerance_seconds: seconds,
        }
    }

    /// A window of `(1 - accuracy)` times the smaller of the two spans.
    ///
    /// When either side has no timestamps the window is zero.
    pub fn relative(accuracy: f64, left: &[NaiveDateTime], right: &[NaiveDateTime]) -> Self {
        let range = match (time_span(left), time_span(right)) {
            (Some(l), Some(r)) => seconds(l.min(r)),
            _ => 0.0,
        };
        Self {
            tolerance_seconds: (1.0 - accuracy) * range,
        }
    }

    pub fn new(accuracy: f64, absolute: bool, left: &[NaiveDateTime], right: &[NaiveDateTime]) -> Self {
        if absolute {
            Self::absolute(accuracy)
        } else {
            Self::relative(accuracy, left, right)
        }
    }

    pub fn tolerance_seconds(&self) -> f64 {
        self.tolerance_seconds
    }
}

impl Matcher for DatetimeMatcher {
    type Value = NaiveDateTime;

    fn best_match(&self, value: &NaiveDateTime, candidates: &[NaiveDateTime]) -> Option<NaiveDateTime> {
        nearest_within(value, candidates, self.tolerance_seconds, |a, b| {
            seconds(*a - *b)
        })
        .copied()
    }
}
