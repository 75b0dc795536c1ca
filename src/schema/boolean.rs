//! Boolean schema validation.

use serde_json::json;

use crate::coerce;
use crate::defaults::DefaultProvider;
use crate::rule::{Rule, Stage};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::{meta, ScalarCore};
use super::traits::SchemaLike;

/// A schema for validating booleans.
///
/// Under coercion the strings `"true"`/`"false"` and the numbers `0`/`1`
/// are accepted.
///
/// ```rust
/// use sluice::{Options, Schema, SchemaLike, Value};
///
/// let schema = Schema::boolean().must_be(true);
/// let options = Options::default().coerce(true);
///
/// assert!(schema.validate_with(&Value::from("true"), &options).is_success());
/// assert!(schema.validate_with(&Value::from(0), &options).is_failure());
/// ```
#[derive(Clone)]
pub struct BoolSchema {
    core: ScalarCore<bool>,
}

impl BoolSchema {
    pub fn new() -> Self {
        Self {
            core: ScalarCore::new("boolean", "boolean", false),
        }
    }

    pub fn required(mut self) -> Self {
        self.core.set_required();
        self
    }

    pub fn default_value(mut self, value: bool) -> Self {
        self.core.set_default(DefaultProvider::Fixed(value));
        self
    }

    /// The value must be exactly `expected` (code `boolean.eq`).
    pub fn must_be(mut self, expected: bool) -> Self {
        self.core.constrain(
            Stage::Relational,
            "eq",
            format!("must be {}", expected),
            meta([("value", json!(expected))]),
            move |b: &bool| *b == expected,
        );
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&bool, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.core.put(Stage::Custom, Rule::check(check));
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.core.set_message(message.into());
        self
    }
}

impl Default for BoolSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLike for BoolSchema {
    type Output = bool;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (bool, Flow) {
        self.core.run(value, ctx, coerce::boolean)
    }

    fn is_required(&self) -> bool {
        self.core.is_required()
    }
}
