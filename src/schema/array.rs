//! Array schema validation.
//!
//! This module provides [`ArraySchema`] for validating arrays with item schemas,
//! length constraints, and uniqueness requirements.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::path::PathSegment;
use crate::rule::{Rule, RuleSet};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::meta;
use super::traits::SchemaLike;

type Equality = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// How duplicate items are detected.
#[derive(Clone)]
enum Uniqueness {
    /// Content hash with a seen-set.
    Hash,
    /// Caller supplied equality, pairwise.
    By(Equality),
}

/// A schema for validating arrays.
///
/// Items are validated with the item schema at `[index]` paths and all item
/// issues are accumulated unless fail-fast or the issue cap stops
/// validation. Only present, non-null items take part in uniqueness checks;
/// the first duplicate is reported at its own index with the index of the
/// earlier occurrence in `first`.
///
/// # Example
///
/// ```rust
/// use sluice::{Schema, SchemaLike, Value};
/// use serde_json::json;
///
/// let schema = Schema::array(Schema::text().min_len(1))
///     .non_empty()
///     .max_len(10)
///     .unique();
///
/// assert!(schema.validate(&Value::from(json!(["a", "b"]))).is_success());
///
/// let error = schema.validate(&Value::from(json!(["a", "b", "a"]))).into_result().unwrap_err();
/// assert_eq!(error.first().path(), "[2]");
/// assert_eq!(error.first().code(), "array.unique");
/// ```
pub struct ArraySchema<S: SchemaLike> {
    items: S,
    required: bool,
    allow_single: bool,
    length: RuleSet<usize>,
    uniqueness: Option<Uniqueness>,
    custom: RuleSet<Vec<S::Output>>,
    type_message: Option<String>,
}

impl<S: SchemaLike + Clone> Clone for ArraySchema<S> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            required: self.required,
            allow_single: self.allow_single,
            length: self.length.clone(),
            uniqueness: self.uniqueness.clone(),
            custom: self.custom.clone(),
            type_message: self.type_message.clone(),
        }
    }
}

impl<S: SchemaLike> ArraySchema<S> {
    /// Creates a new array schema validating every item with `items`.
    pub fn new(items: S) -> Self {
        Self {
            items,
            required: false,
            allow_single: false,
            length: RuleSet::new(),
            uniqueness: None,
            custom: RuleSet::new(),
            type_message: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Wraps a single non-array value into a one-item array.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::array(Schema::text()).allow_single();
    /// let out = schema.validate(&Value::from("solo")).into_result().unwrap();
    /// assert_eq!(out, vec!["solo".to_string()]);
    /// ```
    pub fn allow_single(mut self) -> Self {
        self.allow_single = true;
        self
    }

    /// At least `min` items.
    pub fn min_len(mut self, min: usize) -> Self {
        self.length.put(Rule::constraint(
            "min_length",
            "array.min_length",
            format!("must have at least {} items", min),
            meta([("min", json!(min))]),
            move |n: &usize| *n >= min,
        ));
        self
    }

    /// At most `max` items.
    pub fn max_len(mut self, max: usize) -> Self {
        self.length.put(Rule::constraint(
            "max_length",
            "array.max_length",
            format!("must have at most {} items", max),
            meta([("max", json!(max))]),
            move |n: &usize| *n <= max,
        ));
        self
    }

    /// Exactly `len` items.
    pub fn len(mut self, len: usize) -> Self {
        self.length.put(Rule::constraint(
            "length",
            "array.length",
            format!("must have exactly {} items", len),
            meta([("length", json!(len))]),
            move |n: &usize| *n == len,
        ));
        self
    }

    /// Shorthand for `min_len(1)`.
    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    /// Items must be distinct by content.
    pub fn unique(mut self) -> Self {
        self.uniqueness = Some(Uniqueness::Hash);
        self
    }

    /// Items must be distinct according to `eq`.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    /// use serde_json::json;
    ///
    /// let schema = Schema::array(Schema::text())
    ///     .unique_by(|a, b| a.as_str().map(str::to_lowercase) == b.as_str().map(str::to_lowercase));
    ///
    /// assert!(schema.validate(&Value::from(json!(["a", "A"]))).is_failure());
    /// ```
    pub fn unique_by<F>(mut self, eq: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.uniqueness = Some(Uniqueness::By(Arc::new(eq)));
        self
    }

    /// Adds a custom check on the validated items.
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&Vec<S::Output>, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.custom.put(Rule::check(check));
        self
    }

    /// Sets the message used when the value is not an array.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.type_message = Some(message.into());
        self
    }

    /// Index of the first duplicate and of its earlier occurrence.
    fn find_duplicate(&self, items: &[Value]) -> Option<(usize, usize)> {
        match self.uniqueness.as_ref()? {
            Uniqueness::Hash => {
                let mut seen = HashMap::new();
                for (i, item) in items.iter().enumerate() {
                    if !item.is_present() {
                        continue;
                    }
                    if let Some(first) = seen.insert(item.content_hash(), i) {
                        return Some((i, first));
                    }
                }
                None
            }
            Uniqueness::By(eq) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_present() {
                        continue;
                    }
                    let earlier = items[..i]
                        .iter()
                        .position(|other| other.is_present() && eq(other, item));
                    if let Some(first) = earlier {
                        return Some((i, first));
                    }
                }
                None
            }
        }
    }
}

impl<S: SchemaLike> SchemaLike for ArraySchema<S> {
    type Output = Vec<S::Output>;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Self::Output, Flow) {
        if !value.is_present() {
            if self.required {
                return (Vec::new(), ctx.add_issue("array.required", "value is required"));
            }
            return (Vec::new(), Flow::Continue);
        }

        let single;
        let items: &[Value] = match value {
            Value::Array(items) => items.as_slice(),
            other if self.allow_single => {
                single = [other.clone()];
                &single
            }
            other => {
                let message = self
                    .type_message
                    .clone()
                    .unwrap_or_else(|| format!("expected array, got {}", other.kind_name()));
                let flow = ctx.add_issue_with(
                    "array.type",
                    message,
                    meta([("expected", json!("array")), ("actual", json!(other.kind_name()))]),
                );
                return (Vec::new(), flow);
            }
        };

        let (_, flow) = self.length.apply_all(items.len(), ctx);
        if flow.is_stop() {
            return (Vec::new(), Flow::Stop);
        }

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let (validated, flow) =
                ctx.nested(PathSegment::index(i), |ctx| self.items.check(item, ctx));
            out.push(validated);
            if flow.is_stop() {
                return (out, Flow::Stop);
            }
        }

        if let Some((duplicate, first)) = self.find_duplicate(items) {
            let flow = ctx.nested(PathSegment::index(duplicate), |ctx| {
                ctx.add_issue_with(
                    "array.unique",
                    format!("duplicate of item {}", first),
                    meta([("first", json!(first))]),
                )
            });
            if flow.is_stop() {
                return (out, Flow::Stop);
            }
        }

        self.custom.apply_all(out, ctx)
    }

    fn is_required(&self) -> bool {
        self.required
    }
}
