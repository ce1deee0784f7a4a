use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

use crate::error::ReadingError;

fn reading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("reading pattern is valid"))
}

/// Concatenates recognized digits, inserting `.` before the 1-based
/// `decimal_digit`.
pub fn join_digits(digits: &[char], decimal_digit: usize) -> String {
    let mut text = String::with_capacity(digits.len() + 1);
    for (i, c) in digits.iter().enumerate() {
        if i + 1 == decimal_digit {
            text.push('.');
        }
        text.push(*c);
    }
    text
}

/// Removes every trailing `0` of the whole string, then a dangling point.
///
/// The point is not special-cased, so a whole reading ending in zero loses
/// magnitude: `12340.00` becomes `1234`. Calibration has to be revisited
/// before this rule changes.
pub fn trim_trailing_zeros(text: &str) -> &str {
    let trimmed = text.trim_end_matches('0');
    trimmed.strip_suffix('.').unwrap_or(trimmed)
}

/// Leading zeros of the integer part removed, keeping at least one digit.
fn canonical_form(text: &str) -> String {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (text, None),
    };
    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        rest => rest,
    };
    match frac_part {
        Some(frac) => format!("{int_part}.{frac}"),
        None => int_part.to_string(),
    }
}

/// Parses a trimmed reading, requiring that formatting the number gives the
/// same text back.
pub fn parse_reading(text: &str) -> Result<f64, ReadingError> {
    let format_error = |formatted: String| ReadingError::ReadingFormat {
        text: text.to_string(),
        formatted,
    };

    if !reading_pattern().is_match(text) {
        return Err(format_error(String::new()));
    }
    let value: f64 = text.parse().map_err(|_| format_error(String::new()))?;

    let formatted = value.to_string();
    if formatted != canonical_form(text) {
        return Err(format_error(formatted));
    }
    Ok(value)
}

/// Builds the meter value from the recognized digits in meter order.
pub fn assemble_reading(digits: &[char], decimal_digit: usize) -> Result<f64, ReadingError> {
    let joined = join_digits(digits, decimal_digit);
    let trimmed = trim_trailing_zeros(&joined);

    let value = parse_reading(trimmed)?;
    info!("Current meter reading: {value} (digits '{joined}')");
    Ok(value)
}
