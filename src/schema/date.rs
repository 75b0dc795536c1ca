//! Date schema validation.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::json;

use crate::coerce;
use crate::defaults::DefaultProvider;
use crate::rule::{Rule, Stage};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::{meta, ScalarCore};
use super::traits::SchemaLike;

/// A schema for validating timestamps.
///
/// Strings are parsed with [`Options::date_layouts`](crate::Options::date_layouts)
/// in order. Under coercion unix timestamps (seconds or milliseconds) are
/// accepted too. The zero value is the unix epoch in UTC.
///
/// ```rust
/// use chrono::DateTime;
/// use sluice::{Schema, SchemaLike, Value};
///
/// let launch = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
/// let schema = Schema::date().min(launch);
///
/// assert!(schema.validate(&Value::from("2024-06-01")).is_success());
/// assert!(schema.validate(&Value::from("2023-12-31T23:59:59Z")).is_failure());
/// ```
#[derive(Clone)]
pub struct DateSchema {
    core: ScalarCore<DateTime<FixedOffset>>,
}

fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::default().fixed_offset()
}

impl DateSchema {
    pub fn new() -> Self {
        Self {
            core: ScalarCore::new("date", "date", epoch()),
        }
    }

    pub fn required(mut self) -> Self {
        self.core.set_required();
        self
    }

    pub fn default_value(mut self, value: DateTime<FixedOffset>) -> Self {
        self.core.set_default(DefaultProvider::Fixed(value));
        self
    }

    /// Computes the default when it is needed, e.g. "now".
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> DateTime<FixedOffset> + Send + Sync + 'static,
    {
        self.core.set_default(DefaultProvider::factory(factory));
        self
    }

    /// Not earlier than `min`.
    pub fn min(mut self, min: DateTime<FixedOffset>) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "min",
            format!("must not be before {}", min.to_rfc3339()),
            meta([("min", json!(min.to_rfc3339()))]),
            move |d: &DateTime<FixedOffset>| *d >= min,
        );
        self
    }

    /// Not later than `max`.
    pub fn max(mut self, max: DateTime<FixedOffset>) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "max",
            format!("must not be after {}", max.to_rfc3339()),
            meta([("max", json!(max.to_rfc3339()))]),
            move |d: &DateTime<FixedOffset>| *d <= max,
        );
        self
    }

    /// Strictly later than `instant`.
    pub fn after(mut self, instant: DateTime<FixedOffset>) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "after",
            format!("must be after {}", instant.to_rfc3339()),
            meta([("after", json!(instant.to_rfc3339()))]),
            move |d: &DateTime<FixedOffset>| *d > instant,
        );
        self
    }

    /// Strictly earlier than `instant`.
    pub fn before(mut self, instant: DateTime<FixedOffset>) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "before",
            format!("must be before {}", instant.to_rfc3339()),
            meta([("before", json!(instant.to_rfc3339()))]),
            move |d: &DateTime<FixedOffset>| *d < instant,
        );
        self
    }

    /// The same instant as `other`, whatever the offset.
    pub fn eq(mut self, other: DateTime<FixedOffset>) -> Self {
        self.core.constrain(
            Stage::Relational,
            "eq",
            format!("must be {}", other.to_rfc3339()),
            meta([("value", json!(other.to_rfc3339()))]),
            move |d: &DateTime<FixedOffset>| *d == other,
        );
        self
    }

    pub fn ne(mut self, other: DateTime<FixedOffset>) -> Self {
        self.core.constrain(
            Stage::Relational,
            "ne",
            format!("must not be {}", other.to_rfc3339()),
            meta([("value", json!(other.to_rfc3339()))]),
            move |d: &DateTime<FixedOffset>| *d != other,
        );
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&DateTime<FixedOffset>, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.core.put(Stage::Custom, Rule::check(check));
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.core.set_message(message.into());
        self
    }
}

impl Default for DateSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLike for DateSchema {
    type Output = DateTime<FixedOffset>;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Self::Output, Flow) {
        self.core.run(value, ctx, coerce::date)
    }

    fn is_required(&self) -> bool {
        self.core.is_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_zero_value_is_epoch() {
        let out = DateSchema::new().validate(&Value::missing()).into_result().unwrap();
        assert_eq!(out.timestamp(), 0);
    }

    #[test]
    fn test_type_and_invalid() {
        let schema = DateSchema::new();
        let error = schema.validate(&Value::from(true)).into_result().unwrap_err();
        assert_eq!(error.first().code(), "date.type");
        let error = schema.validate(&Value::from("soon")).into_result().unwrap_err();
        assert_eq!(error.first().code(), "date.invalid");
        assert_eq!(error.first().meta().get("value"), Some(&json!("soon")));
    }

    #[test]
    fn test_numbers_need_coercion() {
        let schema = DateSchema::new();
        assert!(schema.validate(&Value::from(1_700_000_000)).is_failure());
        let options = Options::default().coerce(true);
        let out = schema
            .validate_with(&Value::from(1_700_000_000), &options)
            .into_result()
            .unwrap();
        assert_eq!(out.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_bounds_and_equality() {
        let schema = DateSchema::new()
            .after(at("2024-01-01T00:00:00Z"))
            .before(at("2025-01-01T00:00:00Z"));
        assert!(schema.validate(&Value::from("2024-05-05T12:00:00+02:00")).is_success());
        let error = schema
            .validate(&Value::from("2024-01-01T00:00:00Z"))
            .into_result()
            .unwrap_err();
        assert_eq!(error.first().code(), "date.after");

        let schema = DateSchema::new().eq(at("2024-01-01T01:00:00+01:00"));
        assert!(schema.validate(&Value::from("2024-01-01T00:00:00Z")).is_success());
    }

    #[test]
    fn test_custom_layouts() {
        let options = Options::default().date_layouts(["%d/%m/%Y"]);
        let out = DateSchema::new()
            .validate_with(&Value::from("31/12/2024"), &options)
            .into_result()
            .unwrap();
        assert_eq!(out, at("2024-12-31T00:00:00Z"));
    }
}
