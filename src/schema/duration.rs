//! Duration schema validation.

use chrono::TimeDelta;
use serde_json::json;

use crate::coerce;
use crate::defaults::DefaultProvider;
use crate::rule::{Rule, Stage};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::{meta, ScalarCore};
use super::traits::SchemaLike;

/// Human form used in messages, e.g. `1m30s`.
fn describe(d: TimeDelta) -> String {
    let mut out = String::new();
    let mut ns = d.num_nanoseconds().map(i128::from).unwrap_or_else(|| {
        i128::from(d.num_seconds()) * 1_000_000_000
    });
    if ns == 0 {
        return "0s".to_string();
    }
    if ns < 0 {
        out.push('-');
        ns = -ns;
    }
    let hours = ns / 3_600_000_000_000;
    ns %= 3_600_000_000_000;
    let minutes = ns / 60_000_000_000;
    ns %= 60_000_000_000;
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if ns > 0 {
        let secs = ns as f64 / 1e9;
        out.push_str(&format!("{}s", secs));
    }
    out
}

fn nanos_json(d: TimeDelta) -> serde_json::Value {
    match d.num_nanoseconds() {
        Some(ns) => json!(ns),
        None => json!(describe(d)),
    }
}

/// A schema for validating durations.
///
/// Strings use the unit grammar `72h3m0.5s` (`ns`, `us`, `ms`, `s`, `m`,
/// `h`); numbers are nanoseconds unless a seconds or milliseconds coercion
/// flag says otherwise.
///
/// ```rust
/// use chrono::TimeDelta;
/// use sluice::{Schema, SchemaLike, Value};
///
/// let schema = Schema::duration().max(TimeDelta::hours(1));
/// let out = schema.validate(&Value::from("1m30s")).into_result().unwrap();
/// assert_eq!(out, TimeDelta::seconds(90));
///
/// assert!(schema.validate(&Value::from("2h")).is_failure());
/// ```
#[derive(Clone)]
pub struct DurationSchema {
    core: ScalarCore<TimeDelta>,
}

impl DurationSchema {
    pub fn new() -> Self {
        Self {
            core: ScalarCore::new("duration", "duration", TimeDelta::zero()),
        }
    }

    pub fn required(mut self) -> Self {
        self.core.set_required();
        self
    }

    pub fn default_value(mut self, value: TimeDelta) -> Self {
        self.core.set_default(DefaultProvider::Fixed(value));
        self
    }

    pub fn min(mut self, min: TimeDelta) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "min",
            format!("must be at least {}", describe(min)),
            meta([("min", nanos_json(min))]),
            move |d: &TimeDelta| *d >= min,
        );
        self
    }

    pub fn max(mut self, max: TimeDelta) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "max",
            format!("must be at most {}", describe(max)),
            meta([("max", nanos_json(max))]),
            move |d: &TimeDelta| *d <= max,
        );
        self
    }

    pub fn positive(mut self) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "positive",
            "must be positive",
            meta([]),
            |d: &TimeDelta| *d > TimeDelta::zero(),
        );
        self
    }

    pub fn eq(mut self, other: TimeDelta) -> Self {
        self.core.constrain(
            Stage::Relational,
            "eq",
            format!("must be {}", describe(other)),
            meta([("value", nanos_json(other))]),
            move |d: &TimeDelta| *d == other,
        );
        self
    }

    pub fn ne(mut self, other: TimeDelta) -> Self {
        self.core.constrain(
            Stage::Relational,
            "ne",
            format!("must not be {}", describe(other)),
            meta([("value", nanos_json(other))]),
            move |d: &TimeDelta| *d != other,
        );
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&TimeDelta, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.core.put(Stage::Custom, Rule::check(check));
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.core.set_message(message.into());
        self
    }
}

impl Default for DurationSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLike for DurationSchema {
    type Output = TimeDelta;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (TimeDelta, Flow) {
        self.core.run(value, ctx, coerce::duration)
    }

    fn is_required(&self) -> bool {
        self.core.is_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_describe() {
        assert_eq!(describe(TimeDelta::seconds(90)), "1m30s");
        assert_eq!(describe(TimeDelta::milliseconds(-1500)), "-1.5s");
        assert_eq!(describe(TimeDelta::hours(2)), "2h");
        assert_eq!(describe(TimeDelta::zero()), "0s");
    }

    #[test]
    fn test_numbers_are_nanoseconds() {
        let out = DurationSchema::new().validate(&Value::from(2_000)).into_result().unwrap();
        assert_eq!(out, TimeDelta::microseconds(2));
    }

    #[test]
    fn test_seconds_flag() {
        let options = Options::default().coerce(true).coerce_duration_seconds(true);
        let out = DurationSchema::new()
            .validate_with(&Value::from(30), &options)
            .into_result()
            .unwrap();
        assert_eq!(out, TimeDelta::seconds(30));
    }

    #[test]
    fn test_invalid_and_type() {
        let schema = DurationSchema::new();
        let error = schema.validate(&Value::from("3 days")).into_result().unwrap_err();
        assert_eq!(error.first().code(), "duration.invalid");
        let error = schema.validate(&Value::from(false)).into_result().unwrap_err();
        assert_eq!(error.first().code(), "duration.type");
    }

    #[test]
    fn test_rules() {
        let schema = DurationSchema::new().positive().ne(TimeDelta::seconds(5));
        assert!(schema.validate(&Value::from("1s")).is_success());
        let error = schema.validate(&Value::from("-1s")).into_result().unwrap_err();
        assert_eq!(error.first().code(), "duration.positive");
        let error = schema.validate(&Value::from("5s")).into_result().unwrap_err();
        assert_eq!(error.first().code(), "duration.ne");
        assert_eq!(error.first().meta().get("value"), Some(&json!(5_000_000_000i64)));
    }
}
