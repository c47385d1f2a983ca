//! Conversion between SRT time codes (`HH:MM:SS,mmm`) and milliseconds.

use crate::error::TimeCodeError;

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1000;

/// Parse `HH:MM:SS,mmm` into milliseconds.
///
/// Minutes and seconds must be exactly two digits and milliseconds exactly
/// three. Hours need at least one digit and may run past two. Field ranges
/// are not checked, so `00:75:00,000` is 75 minutes.
pub fn parse_time_code(text: &str) -> Result<u64, TimeCodeError> {
    let (clock, millis) = text
        .split_once(',')
        .ok_or_else(|| TimeCodeError::new(text, "missing ',' before milliseconds"))?;
    let mut fields = clock.split(':');
    let (Some(h), Some(m), Some(s), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(TimeCodeError::new(text, "expected HH:MM:SS"));
    };
    if h.is_empty() {
        return Err(TimeCodeError::new(text, "empty hours field"));
    }
    let h = digits(text, h, None)?;
    let m = digits(text, m, Some(2))?;
    let s = digits(text, s, Some(2))?;
    let ms = digits(text, millis, Some(3))?;
    h.checked_mul(MS_PER_HOUR)
        .and_then(|total| total.checked_add(m * MS_PER_MINUTE + s * MS_PER_SECOND + ms))
        .ok_or_else(|| TimeCodeError::new(text, "out of range"))
}

/// Format milliseconds as `HH:MM:SS,mmm`.
/// Hours widen past two digits instead of wrapping.
pub fn format_time_code(ms: u64) -> String {
    let h = ms / MS_PER_HOUR;
    let m = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let s = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let ms = ms % MS_PER_SECOND;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

fn digits(text: &str, field: &str, width: Option<usize>) -> Result<u64, TimeCodeError> {
    if let Some(width) = width {
        if field.len() != width {
            return Err(TimeCodeError::new(text, "wrong field width"));
        }
    }
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeCodeError::new(text, "non-digit in field"));
    }
    field
        .parse()
        .map_err(|_| TimeCodeError::new(text, "out of range"))
}
