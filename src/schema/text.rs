//! Text schema validation.
//!
//! This module provides [`TextSchema`] for validating string values with
//! transforms, length bounds, membership, comparison and pattern rules.

use regex::Regex;
use serde_json::json;

use crate::coerce;
use crate::defaults::DefaultProvider;
use crate::error::BuildError;
use crate::rule::{Rule, Stage};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::{meta, ScalarCore};
use super::traits::SchemaLike;

/// A schema for validating text.
///
/// Lengths count Unicode scalar values. Rules run stage by stage:
/// transforms, membership, length bounds, comparisons, format checks and
/// finally custom rules. Calling a rule method twice replaces the earlier
/// rule in place.
///
/// # Example
///
/// ```rust
/// use sluice::{Schema, SchemaLike, Value};
///
/// let schema = Schema::text()
///     .trim()
///     .min_len(3)
///     .max_len(20)
///     .pattern(r"^[a-z]+$")
///     .unwrap();
///
/// let result = schema.validate(&Value::from("  alice "));
/// assert_eq!(result.into_result().unwrap(), "alice");
///
/// // Both the length and the pattern violation are reported.
/// let result = schema.validate(&Value::from("AB"));
/// assert_eq!(result.into_result().unwrap_err().len(), 2);
/// ```
#[derive(Clone)]
pub struct TextSchema {
    core: ScalarCore<String>,
}

impl TextSchema {
    /// Creates a new text schema with no rules.
    pub fn new() -> Self {
        Self {
            core: ScalarCore::new("text", "string", String::new()),
        }
    }

    /// Reports missing and null values as `text.required`.
    pub fn required(mut self) -> Self {
        self.core.set_required();
        self
    }

    /// Uses `value` when the input is missing (or null, see
    /// [`Options::default_on_null`](crate::Options::default_on_null)).
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.core.set_default(DefaultProvider::Fixed(value.into()));
        self
    }

    /// Like [`default_value`](Self::default_value) with a factory.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.core.set_default(DefaultProvider::factory(factory));
        self
    }

    /// Strips leading and trailing whitespace before other rules run.
    pub fn trim(mut self) -> Self {
        self.core.put(
            Stage::Transform,
            Rule::keyed("trim", |s: String, _| (s.trim().to_string(), Flow::Continue)),
        );
        self
    }

    pub fn to_lowercase(mut self) -> Self {
        self.core.put(
            Stage::Transform,
            Rule::keyed("case", |s: String, _| (s.to_lowercase(), Flow::Continue)),
        );
        self
    }

    pub fn to_uppercase(mut self) -> Self {
        self.core.put(
            Stage::Transform,
            Rule::keyed("case", |s: String, _| (s.to_uppercase(), Flow::Continue)),
        );
        self
    }

    /// The value must be one of `allowed`.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::text().one_of(["red", "green"]);
    /// assert!(schema.validate(&Value::from("red")).is_success());
    ///
    /// let error = schema.validate(&Value::from("blue")).into_result().unwrap_err();
    /// assert_eq!(error.first().code(), "text.one_of");
    /// ```
    pub fn one_of<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
        let message = format!("must be one of: {}", allowed.join(", "));
        let meta = meta([("values", json!(allowed))]);
        self.core.constrain(Stage::ValueSet, "one_of", message, meta, move |s: &String| {
            allowed.contains(s)
        });
        self
    }

    /// At least `min` characters.
    pub fn min_len(mut self, min: usize) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "min_length",
            format!("length must be at least {}", min),
            meta([("min", json!(min))]),
            move |s: &String| s.chars().count() >= min,
        );
        self
    }

    /// At most `max` characters.
    pub fn max_len(mut self, max: usize) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "max_length",
            format!("length must be at most {}", max),
            meta([("max", json!(max))]),
            move |s: &String| s.chars().count() <= max,
        );
        self
    }

    /// Exactly `len` characters.
    pub fn len(mut self, len: usize) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "length",
            format!("length must be exactly {}", len),
            meta([("length", json!(len))]),
            move |s: &String| s.chars().count() == len,
        );
        self
    }

    /// Shorthand for `min_len(1)`.
    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    pub fn eq(mut self, expected: impl Into<String>) -> Self {
        let expected = expected.into();
        self.core.constrain(
            Stage::Relational,
            "eq",
            format!("must equal '{}'", expected),
            meta([("value", json!(expected))]),
            move |s: &String| *s == expected,
        );
        self
    }

    pub fn ne(mut self, unexpected: impl Into<String>) -> Self {
        let unexpected = unexpected.into();
        self.core.constrain(
            Stage::Relational,
            "ne",
            format!("must not equal '{}'", unexpected),
            meta([("value", json!(unexpected))]),
            move |s: &String| *s != unexpected,
        );
        self
    }

    /// The value must match the regular expression `pattern`.
    ///
    /// Returns [`BuildError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, BuildError> {
        let regex = Regex::new(pattern).map_err(|e| BuildError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.core.constrain(
            Stage::Format,
            "pattern",
            format!("must match pattern '{}'", pattern),
            meta([("pattern", json!(pattern))]),
            move |s: &String| regex.is_match(s),
        );
        Ok(self)
    }

    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.core.constrain(
            Stage::Format,
            "starts_with",
            format!("must start with '{}'", prefix),
            meta([("prefix", json!(prefix))]),
            move |s: &String| s.starts_with(prefix.as_str()),
        );
        self
    }

    pub fn ends_with(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.core.constrain(
            Stage::Format,
            "ends_with",
            format!("must end with '{}'", suffix),
            meta([("suffix", json!(suffix))]),
            move |s: &String| s.ends_with(suffix.as_str()),
        );
        self
    }

    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.core.constrain(
            Stage::Format,
            "contains",
            format!("must contain '{}'", needle),
            meta([("substring", json!(needle))]),
            move |s: &String| s.contains(needle.as_str()),
        );
        self
    }

    /// Adds a custom check, run after every built-in rule.
    ///
    /// ```rust
    /// use sluice::{Flow, Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::text().custom(|s, ctx| {
    ///     if s.contains(' ') {
    ///         ctx.add_issue("text.no_spaces", "must not contain spaces")
    ///     } else {
    ///         Flow::Continue
    ///     }
    /// });
    /// assert!(schema.validate(&Value::from("a b")).is_failure());
    /// ```
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&String, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.core.put(Stage::Custom, Rule::check(check));
        self
    }

    /// Adds an arbitrary rule to the custom stage.
    pub fn rule(mut self, rule: Rule<String>) -> Self {
        self.core.put(Stage::Custom, rule);
        self
    }

    /// Sets a custom message for the most recent rule.
    ///
    /// Before any rule is added this sets the type mismatch message.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::text().min_len(5).error("username too short");
    /// let error = schema.validate(&Value::from("ab")).into_result().unwrap_err();
    /// assert_eq!(error.first().message(), "username too short");
    /// ```
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.core.set_message(message.into());
        self
    }
}

impl Default for TextSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLike for TextSchema {
    type Output = String;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (String, Flow) {
        self.core.run(value, ctx, coerce::text)
    }

    fn is_required(&self) -> bool {
        self.core.is_required()
    }
}
