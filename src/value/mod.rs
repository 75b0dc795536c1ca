//! The intermediate value model every input is normalized into.
//!
//! A [`Value`] carries both presence (missing key, explicit null, real value)
//! and the structural kind of the data. Numbers are kept as their decimal
//! text so nothing is lost before a schema asks for a concrete numeric type.
//! Containers are reference counted, so cloning a `Value` is shallow.

mod hash;
mod json;
mod query;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta};
use indexmap::IndexMap;

pub use hash::ContentHash;
pub use json::FromValue;
pub(crate) use json::project_native;
pub use query::{compare_values, values_equal, QueryPath, QuerySegment, Relation};

/// Ordered map used for object values.
pub type ValueMap = IndexMap<String, Value>;

/// Tri-state presence of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// The key was absent.
    Missing,
    /// The key was present with an explicit null.
    Null,
    /// A real value.
    Present,
}

/// Structural kind of a value. Missing and null values are `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Invalid,
}

/// A normalized input value.
///
/// # Example
///
/// ```rust
/// use sluice::{Kind, Presence, Value};
/// use serde_json::json;
///
/// let value = Value::from(json!({"id": 7, "tags": ["a"]}));
/// assert_eq!(value.kind(), Kind::Object);
/// assert_eq!(value.get("id").as_number_text(), Some("7"));
/// assert_eq!(value.get("nope").presence(), Presence::Missing);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Missing,
    Null,
    String(String),
    /// Decimal text of the number, exactly as received.
    Number(String),
    Boolean(bool),
    Array(Arc<Vec<Value>>),
    Object(Arc<ValueMap>),
}

static MISSING: Value = Value::Missing;

impl Value {
    pub fn missing() -> Self {
        Value::Missing
    }

    pub fn null() -> Self {
        Value::Null
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Creates a number from its decimal text.
    pub fn number(text: impl Into<String>) -> Self {
        Value::Number(text.into())
    }

    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    pub fn object(entries: ValueMap) -> Self {
        Value::Object(Arc::new(entries))
    }

    pub fn presence(&self) -> Presence {
        match self {
            Value::Missing => Presence::Missing,
            Value::Null => Presence::Null,
            _ => Presence::Present,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Missing | Value::Null => Kind::Invalid,
            Value::String(_) => Kind::String,
            Value::Number(_) => Kind::Number,
            Value::Boolean(_) => Kind::Boolean,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Human readable kind, used in `{expected, actual}` issue metadata.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Missing | Value::Null)
    }

    /// Copies the top-level value. Containers share their children.
    pub fn shallow_clone(&self) -> Self {
        self.clone()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number_text(&self) -> Option<&str> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the entry for `key`, or a missing value when this is not an
    /// object or the key is absent.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Object(entries) => entries.get(key).unwrap_or(&MISSING),
            _ => &MISSING,
        }
    }

    /// Returns the item at `index`, or a missing value.
    pub fn at(&self, index: usize) -> &Value {
        match self {
            Value::Array(items) => items.get(index).unwrap_or(&MISSING),
            _ => &MISSING,
        }
    }

    /// Parses the number text as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number_text().and_then(|n| n.trim().parse::<f64>().ok())
    }
}

/// Normalizes numeric text so that `"1.0"`, `"1"` and `"1e0"` agree.
///
/// Works on the decimal digits directly, so integers beyond 2^53 keep
/// their identity. Text that is not a decimal number is returned trimmed.
pub(crate) fn canonical_number(text: &str) -> String {
    let trimmed = text.trim();
    match decimal_parts(trimmed) {
        Some((negative, digits, exponent)) => render_decimal(negative, &digits, exponent),
        None => trimmed.to_string(),
    }
}

/// Splits decimal text into sign, significant digits and a power of ten,
/// with leading and trailing zeros removed. Zero has no digits.
fn decimal_parts(text: &str) -> Option<(bool, String, i64)> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(at) => (&rest[..at], rest[at + 1..].parse::<i64>().ok()?),
        None => (rest, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let frac_len = i64::try_from(frac_part.len()).ok()?;
    let mut exponent = exponent.checked_sub(frac_len)?;
    let all = format!("{}{}", int_part, frac_part);
    let significant = all.trim_start_matches('0');
    let stripped = significant.trim_end_matches('0');
    let trailing = i64::try_from(significant.len() - stripped.len()).ok()?;
    exponent = exponent.checked_add(trailing)?;
    if stripped.is_empty() {
        return Some((false, String::new(), 0));
    }
    Some((negative, stripped.to_string(), exponent))
}

/// Renders the parts positionally, switching to `<digits>e<exp>` when the
/// positional form would need more than 64 padding zeros.
fn render_decimal(negative: bool, digits: &str, exponent: i64) -> String {
    if digits.is_empty() {
        return "0".to_string();
    }
    let sign = if negative { "-" } else { "" };
    let len = digits.len() as i64;
    if exponent >= 0 {
        if exponent > 64 {
            return format!("{}{}e{}", sign, digits, exponent);
        }
        return format!("{}{}{}", sign, digits, "0".repeat(exponent as usize));
    }
    let point = len + exponent;
    if point > 0 {
        let (whole, frac) = digits.split_at(point as usize);
        format!("{}{}.{}", sign, whole, frac)
    } else if -point <= 64 {
        format!("{}0.{}{}", sign, "0".repeat((-point) as usize), digits)
    } else {
        format!("{}{}e{}", sign, digits, exponent)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n.to_string())
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        if f.is_finite() {
            Value::Number(format!("{}", f))
        } else {
            Value::Null
        }
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::from(f as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<ValueMap> for Value {
    fn from(entries: ValueMap) -> Self {
        Value::object(entries)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Converts a schema output back into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

macro_rules! number_to_value {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

number_to_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl ToValue for DateTime<FixedOffset> {
    fn to_value(&self) -> Value {
        Value::String(self.to_rfc3339())
    }
}

/// Durations project to their nanosecond count.
impl ToValue for TimeDelta {
    fn to_value(&self) -> Value {
        match self.num_nanoseconds() {
            Some(ns) => Value::from(ns),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for IndexMap<String, T> {
    fn to_value(&self) -> Value {
        Value::object(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_and_kind() {
        assert_eq!(Value::missing().presence(), Presence::Missing);
        assert_eq!(Value::null().presence(), Presence::Null);
        assert_eq!(Value::missing().kind(), Kind::Invalid);
        assert_eq!(Value::null().kind(), Kind::Invalid);
        assert_eq!(Value::from("x").kind(), Kind::String);
        assert_eq!(Value::from(3).kind(), Kind::Number);
        assert!(Value::from(false).is_present());
    }

    #[test]
    fn test_shallow_clone_shares_children() {
        let value = Value::array(vec![Value::from(1), Value::from(2)]);
        let copy = value.shallow_clone();
        match (&value, &copy) {
            (Value::Array(a), Value::Array(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected arrays"),
        }
    }

    #[test]
    fn test_get_and_at_fall_back_to_missing() {
        let mut entries = ValueMap::new();
        entries.insert("a".to_string(), Value::array(vec![Value::from("x")]));
        let value = Value::object(entries);

        assert_eq!(value.get("a").at(0), &Value::from("x"));
        assert!(value.get("a").at(5).is_missing());
        assert!(value.get("b").is_missing());
        assert!(Value::from(1).get("a").is_missing());
    }

    #[test]
    fn test_canonical_number() {
        assert_eq!(canonical_number("1.0"), "1");
        assert_eq!(canonical_number("1e2"), "100");
        assert_eq!(canonical_number(" 2.50 "), "2.5");
        assert_eq!(canonical_number("abc"), "abc");
        assert_eq!(canonical_number("-0.0"), "0");
        assert_eq!(canonical_number("0.050"), "0.05");
        assert_eq!(canonical_number("-12.5E-1"), "-1.25");
        assert_eq!(canonical_number("1e100"), "1e100");
    }

    #[test]
    fn test_canonical_number_keeps_large_integers_exact() {
        assert_eq!(canonical_number("9007199254740993"), "9007199254740993");
        assert_ne!(
            canonical_number("9007199254740992"),
            canonical_number("9007199254740993")
        );
        assert_eq!(
            canonical_number("18446744073709551615.0"),
            "18446744073709551615"
        );
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert_eq!(Value::from(1.5f64), Value::number("1.5"));
    }

    #[test]
    fn test_to_value_for_duration() {
        assert_eq!(TimeDelta::milliseconds(2).to_value(), Value::number("2000000"));
    }
}
