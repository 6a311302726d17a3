//! Human-readable duration parsing.
//!
//! Timeouts are usually written the way people say them:
//!
//! - Spelled out: "5 seconds", "1 minute 30 seconds", "2 hours"
//! - Compact: "30s", "5m", "1h30m", "250ms"
//! - Fractional: "1.5s", "0.5 minutes"
//! - A bare number is read as seconds: "10"
//!
//! # Examples
//!
//! ```
//! use command_exec::duration::parse_duration;
//! use std::time::Duration;
//!
//! assert_eq!(parse_duration("5 seconds").unwrap(), Duration::from_secs(5));
//! assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
//! assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
//! ```

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when parsing durations.
#[derive(Debug, Error, PartialEq)]
pub enum DurationParseError {
    /// Empty duration string.
    #[error("empty duration string")]
    Empty,

    /// Invalid format.
    #[error("invalid duration format: {0}")]
    InvalidFormat(String),

    /// Invalid numeric value.
    #[error("invalid numeric value: {0}")]
    InvalidNumber(String),

    /// Unknown unit.
    #[error("unknown time unit: {0}")]
    UnknownUnit(String),
}

fn unit_seconds(unit: &str) -> Option<f64> {
    let secs = match unit.to_ascii_lowercase().as_str() {
        "ms" | "millisecond" | "milliseconds" => 0.001,
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hour" | "hours" => 3600.0,
        "d" | "day" | "days" => 86400.0,
        _ => return None,
    };
    Some(secs)
}

/// Parse a human-readable duration string into a `Duration`.
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let mut total_secs = 0f64;
    let mut components = 0usize;
    let mut chars = s.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if !(ch.is_ascii_digit() || ch == '.') {
            if ch.is_alphabetic() {
                return Err(DurationParseError::InvalidFormat(
                    "unit without preceding number".into(),
                ));
            }
            return Err(DurationParseError::InvalidFormat(format!(
                "unexpected character: {}",
                ch
            )));
        }

        let mut number = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                chars.next();
            } else {
                break;
            }
        }
        let value: f64 = number
            .parse()
            .map_err(|_| DurationParseError::InvalidNumber(number.clone()))?;

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut unit = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphabetic() {
                unit.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if unit.is_empty() {
            // "10" on its own means ten seconds; "1h 30" is ambiguous.
            if components == 0 && chars.peek().is_none() {
                total_secs += value;
                components += 1;
                continue;
            }
            return Err(DurationParseError::InvalidFormat(
                "number without unit".into(),
            ));
        }

        let multiplier =
            unit_seconds(&unit).ok_or_else(|| DurationParseError::UnknownUnit(unit.clone()))?;
        total_secs += value * multiplier;
        components += 1;
    }

    Duration::try_from_secs_f64(total_secs)
        .map_err(|_| DurationParseError::InvalidNumber(s.to_string()))
}

/// Render a duration as the seconds argument of the `timeout` utility.
///
/// Whole seconds render without a decimal point.
pub fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}", duration.as_secs_f64())
    }
}
