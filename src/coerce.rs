//! Input-to-target conversion for scalar schemas.
//!
//! Each function accepts the value's native kind unconditionally and the
//! foreign kinds only when [`Options::coerce`] is enabled. A failure says
//! whether the kind was wrong ([`CoerceError::Type`]) or the content could
//! not be converted ([`CoerceError::Invalid`]).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

use crate::options::Options;
use crate::value::Value;

/// Unix timestamps at or above this magnitude are read as milliseconds.
pub const UNIX_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceError {
    /// The value has the wrong kind.
    Type,
    /// The kind is right but the content cannot be converted.
    Invalid,
}

/// True for decimal text: optional sign, digits with an optional fraction,
/// optional exponent.
pub fn is_numeric_text(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

/// Normalizes a numeric string under the trim and underscore sub-flags.
fn numeric_string(s: &str, options: &Options) -> Result<String, CoerceError> {
    let mut text = if options.coerce_trim_space {
        s.trim().to_string()
    } else {
        s.to_string()
    };
    if options.coerce_number_underscore {
        text = strip_underscores(&text).ok_or(CoerceError::Invalid)?;
    }
    if is_numeric_text(&text) {
        Ok(text)
    } else {
        Err(CoerceError::Invalid)
    }
}

/// Removes `_` separators, which may only sit between two digits.
fn strip_underscores(s: &str) -> Option<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == '_' {
            let before = i.checked_sub(1).and_then(|j| chars.get(j));
            let after = chars.get(i + 1);
            if !matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit()) {
                return None;
            }
        } else {
            out.push(*c);
        }
    }
    Some(out)
}

/// Decimal text of a number input.
pub fn number_text(value: &Value, options: &Options) -> Result<String, CoerceError> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) if options.coerce => numeric_string(s, options),
        _ => Err(CoerceError::Type),
    }
}

pub fn text(value: &Value, options: &Options) -> Result<String, CoerceError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if options.coerce => Ok(n.clone()),
        Value::Boolean(b) if options.coerce => Ok(b.to_string()),
        _ => Err(CoerceError::Type),
    }
}

/// Booleans, plus `"true"`/`"false"` and `0`/`1` under coercion.
pub fn boolean(value: &Value, options: &Options) -> Result<bool, CoerceError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::String(s) if options.coerce => {
            let s = if options.coerce_trim_space { s.trim() } else { s.as_str() };
            match s {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(CoerceError::Invalid),
            }
        }
        Value::Number(n) if options.coerce => match n.trim().parse::<f64>() {
            Ok(f) if f == 0.0 => Ok(false),
            Ok(f) if f == 1.0 => Ok(true),
            _ => Err(CoerceError::Invalid),
        },
        _ => Err(CoerceError::Type),
    }
}

/// Picks the unit of a bare number: an explicit sub-flag wins, otherwise
/// (neither or both set) the magnitude decides.
fn is_millis(magnitude: f64, seconds_flag: bool, millis_flag: bool) -> bool {
    match (seconds_flag, millis_flag) {
        (true, false) => false,
        (false, true) => true,
        _ => magnitude.abs() >= UNIX_MILLIS_THRESHOLD,
    }
}

/// Dates from strings in the configured layouts, or unix timestamps under
/// coercion.
pub fn date(value: &Value, options: &Options) -> Result<DateTime<FixedOffset>, CoerceError> {
    match value {
        Value::String(s) => match parse_date(s, options) {
            Some(dt) => Ok(dt),
            None if options.coerce => {
                let text = numeric_string(s, options)?;
                unix_date(&text, options)
            }
            None => Err(CoerceError::Invalid),
        },
        Value::Number(n) if options.coerce => unix_date(n, options),
        _ => Err(CoerceError::Type),
    }
}

/// Tries every layout in order. `%+` is RFC 3339; layouts without an offset
/// are read in the configured time zone and date-only layouts yield
/// midnight.
pub fn parse_date(s: &str, options: &Options) -> Option<DateTime<FixedOffset>> {
    let tz = options.time_zone;
    options.date_layouts.iter().find_map(|layout| {
        if layout == "%+" {
            return DateTime::parse_from_rfc3339(s).ok();
        }
        if let Ok(dt) = DateTime::parse_from_str(s, layout) {
            return Some(dt);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return tz.from_local_datetime(&naive).single();
        }
        NaiveDate::parse_from_str(s, layout)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|naive| tz.from_local_datetime(&naive).single())
    })
}

fn unix_date(text: &str, options: &Options) -> Result<DateTime<FixedOffset>, CoerceError> {
    let raw: f64 = text.trim().parse().map_err(|_| CoerceError::Invalid)?;
    if !raw.is_finite() {
        return Err(CoerceError::Invalid);
    }
    let millis = is_millis(
        raw,
        options.coerce_date_unix_seconds,
        options.coerce_date_unix_millis,
    );
    let utc = match text.trim().parse::<i64>() {
        Ok(whole) if millis => DateTime::from_timestamp_millis(whole),
        Ok(whole) => DateTime::from_timestamp(whole, 0),
        Err(_) => {
            let seconds = if millis { raw / 1000.0 } else { raw };
            let whole = seconds.floor();
            let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }
    };
    utc.map(|dt| dt.with_timezone(&options.time_zone))
        .ok_or(CoerceError::Invalid)
}

/// Durations from unit strings (`1h30m`), or numbers read as nanoseconds.
/// Under coercion numeric strings are accepted and the seconds/millis
/// sub-flags change the unit of bare numbers.
pub fn duration(value: &Value, options: &Options) -> Result<TimeDelta, CoerceError> {
    match value {
        Value::String(s) => match parse_duration(s.trim()) {
            Some(d) => Ok(d),
            None if options.coerce => {
                let text = numeric_string(s, options)?;
                numeric_duration(&text, options)
            }
            None => Err(CoerceError::Invalid),
        },
        Value::Number(n) => numeric_duration(n, options),
        _ => Err(CoerceError::Type),
    }
}

fn numeric_duration(text: &str, options: &Options) -> Result<TimeDelta, CoerceError> {
    let raw: f64 = text.trim().parse().map_err(|_| CoerceError::Invalid)?;
    if !raw.is_finite() {
        return Err(CoerceError::Invalid);
    }
    let seconds_flag = options.coerce && options.coerce_duration_seconds;
    let millis_flag = options.coerce && options.coerce_duration_millis;
    let nanos_per_unit: f64 = if !seconds_flag && !millis_flag {
        1.0
    } else if is_millis(raw, seconds_flag, millis_flag) {
        1e6
    } else {
        1e9
    };
    if nanos_per_unit == 1.0 {
        if let Ok(ns) = text.trim().parse::<i64>() {
            return Ok(TimeDelta::nanoseconds(ns));
        }
    }
    let total = raw * nanos_per_unit;
    if total.abs() > i64::MAX as f64 {
        return Err(CoerceError::Invalid);
    }
    Ok(TimeDelta::nanoseconds(total.round() as i64))
}

fn unit_nanos(unit: &str) -> Option<i128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    })
}

/// Parses `[-+]?(<decimal><unit>)+` such as `72h3m0.5s` or `-1.5h`. A bare
/// `0` is also accepted.
pub fn parse_duration(s: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }
    let mut total: i128 = 0;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..num_end];
        if number.is_empty() || number == "." {
            return None;
        }
        rest = &rest[num_end..];
        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = unit_nanos(&rest[..unit_end])?;
        rest = &rest[unit_end..];

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut part = whole.checked_mul(scale)?;
        if !frac.is_empty() {
            let digits: i128 = frac.parse().ok()?;
            let denom = 10i128.checked_pow(frac.len() as u32)?;
            part = part.checked_add(digits.checked_mul(scale)? / denom)?;
        }
        total = total.checked_add(part)?;
    }
    let total = if negative { -total } else { total };
    i64::try_from(total).ok().map(TimeDelta::nanoseconds)
}
