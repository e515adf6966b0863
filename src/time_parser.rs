// src/time_parser.rs
//! Clock-time parsing for timeclock exports and schedule rules.
//!
//! Schedule rules are written as `"9:00 AM"`, device exports as `"09:15"`, and report
//! cells can hold several timestamps glued together (`"08:0212:0117:58"`).

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static CLOCK_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}):(\d{2})(?::\d{2})?\s*(AM|PM)?$").expect("valid clock-time regex")
});

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}:\d{2}").expect("valid timestamp regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("'{0}' is not a clock time")]
    Unrecognized(String),
    #[error("'{0}' is outside 00:00-23:59")]
    OutOfRange(String),
}

/// Converts a clock-time string to minutes since midnight.
///
/// Without an AM/PM suffix the value is taken as 24-hour time. With a suffix,
/// 12 AM becomes hour 0 and 1-11 PM gain twelve hours; anything else passes through.
pub fn parse_minute_of_day(text: &str) -> Result<u32, TimeParseError> {
    let trimmed = text.trim();
    let caps = CLOCK_TIME_RE
        .captures(trimmed)
        .ok_or_else(|| TimeParseError::Unrecognized(trimmed.to_string()))?;

    // Both groups are ASCII digits of bounded width, parse cannot overflow.
    let hour: u32 = caps[1]
        .parse()
        .map_err(|_| TimeParseError::Unrecognized(trimmed.to_string()))?;
    let minute: u32 = caps[2]
        .parse()
        .map_err(|_| TimeParseError::Unrecognized(trimmed.to_string()))?;

    let hour = match caps.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(ref meridiem) if meridiem == "AM" && hour == 12 => 0,
        Some(ref meridiem) if meridiem == "PM" && (1..=11).contains(&hour) => hour + 12,
        _ => hour,
    };

    if hour > 23 || minute > 59 {
        return Err(TimeParseError::OutOfRange(trimmed.to_string()));
    }
    Ok(hour * 60 + minute)
}

/// Every `HH:MM` substring of `text`, in order of appearance.
pub fn extract_timestamps(text: &str) -> Vec<&str> {
    TIMESTAMP_RE.find_iter(text).map(|m| m.as_str()).collect()
}
