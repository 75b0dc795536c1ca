//! Record (string-keyed map) schema validation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::json;

use crate::path::PathSegment;
use crate::rule::{Rule, RuleSet};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::meta;
use super::text::TextSchema;
use super::traits::SchemaLike;

/// A schema for objects used as maps: any keys, one value schema.
///
/// Keys may be validated (and normalized) by a [`TextSchema`]; key issues
/// are reported at the key's own path. Values are validated at the key's
/// path as well. When two keys normalize to the same output key, the later
/// one is reported as `record.key_collision` and the first entry is kept.
/// Only the first duplicate value is reported by `unique_values`.
///
/// # Example
///
/// ```rust
/// use sluice::{Schema, SchemaLike, Value};
/// use serde_json::json;
///
/// let schema = Schema::record(Schema::number::<u32>())
///     .keys(Schema::text().pattern("^[a-z]+$").unwrap())
///     .max_len(3);
///
/// let error = schema
///     .validate(&Value::from(json!({"ok": 1, "Bad": 2})))
///     .into_result()
///     .unwrap_err();
/// assert_eq!(error.first().path(), "Bad");
/// assert_eq!(error.first().code(), "text.pattern");
/// ```
pub struct RecordSchema<V: SchemaLike> {
    keys: Option<TextSchema>,
    values: V,
    required: bool,
    length: RuleSet<usize>,
    unique_values: bool,
    custom: RuleSet<IndexMap<String, V::Output>>,
}

impl<V: SchemaLike + Clone> Clone for RecordSchema<V> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            values: self.values.clone(),
            required: self.required,
            length: self.length.clone(),
            unique_values: self.unique_values,
            custom: self.custom.clone(),
        }
    }
}

impl<V: SchemaLike> RecordSchema<V> {
    pub fn new(values: V) -> Self {
        Self {
            keys: None,
            values,
            required: false,
            length: RuleSet::new(),
            unique_values: false,
            custom: RuleSet::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Validates every key with `keys`. Its output replaces the key.
    pub fn keys(mut self, keys: TextSchema) -> Self {
        self.keys = Some(keys);
        self
    }

    /// At least `min` entries.
    pub fn min_len(mut self, min: usize) -> Self {
        self.length.put(Rule::constraint(
            "min_length",
            "record.min_length",
            format!("must have at least {} entries", min),
            meta([("min", json!(min))]),
            move |n: &usize| *n >= min,
        ));
        self
    }

    /// At most `max` entries.
    pub fn max_len(mut self, max: usize) -> Self {
        self.length.put(Rule::constraint(
            "max_length",
            "record.max_length",
            format!("must have at most {} entries", max),
            meta([("max", json!(max))]),
            move |n: &usize| *n <= max,
        ));
        self
    }

    /// No two present values may have the same content.
    pub fn unique_values(mut self) -> Self {
        self.unique_values = true;
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&IndexMap<String, V::Output>, &mut ValidationContext<'_>) -> Flow
            + Send
            + Sync
            + 'static,
    {
        self.custom.put(Rule::check(check));
        self
    }

    /// Validates one key speculatively and commits its issues under the
    /// key's path.
    fn check_key(&self, key: &str, ctx: &mut ValidationContext<'_>) -> (String, Flow) {
        let Some(schema) = &self.keys else {
            return (key.to_string(), Flow::Continue);
        };
        let attempt = ctx.sandbox(|ctx| schema.check(&Value::string(key), ctx));
        if attempt.passed {
            return (attempt.output, Flow::Continue);
        }
        let fallback = key.to_string();
        let flow = ctx.nested(PathSegment::key(key), |ctx| ctx.commit(attempt));
        (fallback, flow)
    }
}

impl<V: SchemaLike> SchemaLike for RecordSchema<V> {
    type Output = IndexMap<String, V::Output>;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Self::Output, Flow) {
        let entries = match value {
            Value::Missing | Value::Null => {
                if self.required {
                    return (IndexMap::new(), ctx.add_issue("record.required", "value is required"));
                }
                return (IndexMap::new(), Flow::Continue);
            }
            Value::Object(entries) => entries,
            other => {
                let flow = ctx.add_issue_with(
                    "record.type",
                    format!("expected object, got {}", other.kind_name()),
                    meta([("expected", json!("object")), ("actual", json!(other.kind_name()))]),
                );
                return (IndexMap::new(), flow);
            }
        };

        let (_, flow) = self.length.apply_all(entries.len(), ctx);
        if flow.is_stop() {
            return (IndexMap::new(), Flow::Stop);
        }

        let mut out = IndexMap::with_capacity(entries.len());
        let mut origins: HashMap<String, &str> = HashMap::new();
        let mut seen = HashMap::new();
        let mut duplicate_reported = false;
        for (key, item) in entries.iter() {
            let (validated_key, flow) = self.check_key(key, ctx);
            if flow.is_stop() {
                return (out, Flow::Stop);
            }
            let flow = ctx.nested(PathSegment::key(key.as_str()), |ctx| {
                if let Some(first) = origins.get(validated_key.as_str()) {
                    return ctx.add_issue_with(
                        "record.key_collision",
                        format!("key normalizes to '{}' like entry '{}'", validated_key, first),
                        meta([("key", json!(validated_key)), ("first", json!(first))]),
                    );
                }
                origins.insert(validated_key.clone(), key.as_str());

                let (validated, flow) = self.values.check(item, ctx);
                out.insert(validated_key, validated);
                if flow.is_stop() || !self.unique_values || duplicate_reported || !item.is_present() {
                    return flow;
                }
                match seen.entry(item.content_hash()) {
                    Entry::Occupied(first) => {
                        duplicate_reported = true;
                        ctx.add_issue_with(
                            "record.unique",
                            format!("duplicate of entry '{}'", first.get()),
                            meta([("first", json!(first.get()))]),
                        )
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(key.clone());
                        Flow::Continue
                    }
                }
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
