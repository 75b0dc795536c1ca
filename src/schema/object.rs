//! Object schema validation with typed field bindings.
//!
//! An [`ObjectBuilder`] collects fields, each bound to a struct member with
//! [`bind!`](crate::bind), plus conditions that apply to the most recently
//! declared field. [`ObjectBuilder::build`] checks the declaration and
//! returns an [`ObjectSchema`].
//!
//! Every field runs the same plan per validated input:
//!
//! 1. any `skip_unless` condition that does not hold skips the field;
//! 2. a triggered exclusion reports a present field and skips it;
//! 3. a triggered `required_*` condition reports an absent field and skips it;
//! 4. an absent field marked `required()` is reported;
//! 5. cross-field comparators run when the field is present;
//! 6. the field's own schema validates the value.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{BuildError, DecodeError, Meta};
use crate::path::PathSegment;
use crate::rule::{Rule, RuleSet};
use crate::validation::{Flow, ValidationContext};
use crate::value::{values_equal, FromValue, QueryPath, Relation, Value};

use super::binding::FieldBinding;
use super::scalar::meta;
use super::traits::SchemaLike;

type FieldCheck<T> = Arc<dyn Fn(&Value, &mut T, &mut ValidationContext<'_>) -> Flow + Send + Sync>;
type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type Decoder<T> = fn(&Value) -> Result<T, DecodeError>;

/// What a condition looks for in the other field.
#[derive(Clone)]
enum Trigger {
    If(Value),
    Unless(Value),
    With,
    Without,
    When(Predicate),
}

#[derive(Clone)]
struct Condition {
    query: QueryPath,
    trigger: Trigger,
}

impl Condition {
    fn holds(&self, root: &Value) -> bool {
        let other = self.query.resolve(root);
        match &self.trigger {
            Trigger::If(expected) => values_equal(&other, expected),
            Trigger::Unless(expected) => !values_equal(&other, expected),
            Trigger::With => other.is_present(),
            Trigger::Without => !other.is_present(),
            Trigger::When(predicate) => predicate(&other),
        }
    }

    fn suffix(&self) -> &'static str {
        match self.trigger {
            Trigger::If(_) => "if",
            Trigger::Unless(_) => "unless",
            Trigger::With => "with",
            Trigger::Without => "without",
            Trigger::When(_) => "when",
        }
    }

    fn describe(&self) -> String {
        match &self.trigger {
            Trigger::If(expected) => format!("'{}' is {}", self.query, expected.to_json()),
            Trigger::Unless(expected) => format!("'{}' is not {}", self.query, expected.to_json()),
            Trigger::With => format!("'{}' is present", self.query),
            Trigger::Without => format!("'{}' is absent", self.query),
            Trigger::When(_) => format!("'{}' matches", self.query),
        }
    }

    fn meta(&self) -> Meta {
        match &self.trigger {
            Trigger::If(expected) | Trigger::Unless(expected) => meta([
                ("field", json!(self.query.to_string())),
                ("value", expected.to_json()),
            ]),
            _ => meta([("field", json!(self.query.to_string()))]),
        }
    }
}

#[derive(Clone)]
struct Comparator {
    relation: Relation,
    query: QueryPath,
}

/// Which condition list a builder call appends to.
#[derive(Clone, Copy)]
enum Slot {
    SkipUnless,
    Excluded,
    Required,
}

/// One bound field and its conditional plan.
struct FieldPlan<T> {
    name: String,
    required: bool,
    omit_empty: bool,
    skip_unless: Vec<Condition>,
    excluded: Vec<Condition>,
    required_when: Vec<Condition>,
    comparators: Vec<Comparator>,
    check: FieldCheck<T>,
}

impl<T> Clone for FieldPlan<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            required: self.required,
            omit_empty: self.omit_empty,
            skip_unless: self.skip_unless.clone(),
            excluded: self.excluded.clone(),
            required_when: self.required_when.clone(),
            comparators: self.comparators.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

impl<T> FieldPlan<T> {
    fn slot(&mut self, slot: Slot) -> &mut Vec<Condition> {
        match slot {
            Slot::SkipUnless => &mut self.skip_unless,
            Slot::Excluded => &mut self.excluded,
            Slot::Required => &mut self.required_when,
        }
    }

    /// Runs the plan with the context positioned at the field.
    fn run(&self, value: &Value, target: &mut T, ctx: &mut ValidationContext<'_>) -> Flow {
        let root = ctx.root();
        if self.skip_unless.iter().any(|condition| !condition.holds(root)) {
            return Flow::Continue;
        }

        let present = value.is_present();
        if let Some(condition) = self.excluded.iter().find(|c| c.holds(root)) {
            if !present {
                return Flow::Continue;
            }
            return ctx.add_issue_with(
                format!("object.field.excluded_{}", condition.suffix()),
                format!("must be absent when {}", condition.describe()),
                condition.meta(),
            );
        }

        if !present {
            let mut fired = false;
            for condition in self.required_when.iter().filter(|c| c.holds(root)) {
                fired = true;
                let flow = ctx.add_issue_with(
                    format!("object.field.required_{}", condition.suffix()),
                    format!("is required when {}", condition.describe()),
                    condition.meta(),
                );
                if flow.is_stop() {
                    return Flow::Stop;
                }
            }
            if fired {
                return Flow::Continue;
            }
            if self.required {
                return ctx.add_issue("object.field.required", "field is required");
            }
        } else {
            for comparator in &self.comparators {
                let other = comparator.query.resolve(root);
                if !comparator.relation.holds(value, &other) {
                    return ctx.add_issue_with(
                        format!("object.field.{}field", comparator.relation.name()),
                        format!(
                            "must be {} field '{}'",
                            comparator.relation.describe(),
                            comparator.query
                        ),
                        meta([
                            ("field", json!(comparator.query.to_string())),
                            ("value", other.to_json()),
                        ]),
                    );
                }
            }
        }

        (self.check)(value, target, ctx)
    }
}

/// How an object value becomes the target struct.
enum Mode<T> {
    /// Field plans, then struct-level rules.
    Fields,
    /// Field plans only.
    NoStructLevel,
    /// Whole-value decoding, then struct-level rules.
    StructOnly(Decoder<T>),
}

impl<T> Clone for Mode<T> {
    fn clone(&self) -> Self {
        match self {
            Mode::Fields => Mode::Fields,
            Mode::NoStructLevel => Mode::NoStructLevel,
            Mode::StructOnly(decode) => Mode::StructOnly(*decode),
        }
    }
}

impl<T> fmt::Debug for Mode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Fields => f.write_str("Fields"),
            Mode::NoStructLevel => f.write_str("NoStructLevel"),
            Mode::StructOnly(_) => f.write_str("StructOnly"),
        }
    }
}

fn decode_struct<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    T::from_value(value)
}

/// Declares an [`ObjectSchema`] field by field.
///
/// Condition methods (`required`, `skip_unless`, `excluded_*`,
/// `required_*`, `*_field`, `omit_empty`) apply to the last declared field.
/// Calling one before any field makes [`build`](Self::build) fail.
///
/// # Example
///
/// ```rust
/// use sluice::{bind, Schema, SchemaLike, Value};
/// use serde_json::json;
///
/// #[derive(Debug, Default, Clone)]
/// struct Signup {
///     email: String,
///     password: String,
///     confirm: String,
/// }
///
/// let schema = Schema::object::<Signup>()
///     .field(bind!(Signup, email), Schema::text().required())
///     .field(bind!(Signup, password), Schema::text().min_len(8))
///     .field(bind!(Signup, confirm), Schema::text())
///     .required_with("password")
///     .eq_field("password")
///     .build()
///     .unwrap();
///
/// let input = Value::from(json!({
///     "email": "ada@example.com",
///     "password": "correct horse",
///     "confirm": "correct hose"
/// }));
/// let error = schema.validate(&input).into_result().unwrap_err();
/// assert_eq!(error.first().path(), "confirm");
/// assert_eq!(error.first().code(), "object.field.eqfield");
/// ```
pub struct ObjectBuilder<T> {
    fields: Vec<FieldPlan<T>>,
    errors: Vec<BuildError>,
    deny_unknown: bool,
    mode: Mode<T>,
    struct_rules: RuleSet<T>,
    type_message: Option<String>,
}

impl<T: Default + 'static> ObjectBuilder<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            errors: Vec::new(),
            deny_unknown: false,
            mode: Mode::Fields,
            struct_rules: RuleSet::new(),
            type_message: None,
        }
    }

    /// Declares a field bound to a struct member, validated by `schema`.
    pub fn field<F, S>(mut self, binding: FieldBinding<T, F>, schema: S) -> Self
    where
        S: SchemaLike<Output = F> + 'static,
        F: 'static,
    {
        let (name, set) = binding.into_parts();
        let check: FieldCheck<T> = Arc::new(move |value, target, ctx| {
            let (output, flow) = schema.check(value, ctx);
            set(target, output);
            flow
        });
        self.fields.push(FieldPlan {
            name,
            required: false,
            omit_empty: false,
            skip_unless: Vec::new(),
            excluded: Vec::new(),
            required_when: Vec::new(),
            comparators: Vec::new(),
            check,
        });
        self
    }

    fn last_field(&mut self, method: &'static str) -> Option<&mut FieldPlan<T>> {
        if self.fields.is_empty() {
            self.errors.push(BuildError::NoField(method));
        }
        self.fields.last_mut()
    }

    fn condition(mut self, method: &'static str, slot: Slot, query: &str, trigger: Trigger) -> Self {
        let query = QueryPath::parse(query);
        if self.last_field(method).is_none() {
            return self;
        }
        match query {
            Ok(query) => {
                if let Some(plan) = self.fields.last_mut() {
                    plan.slot(slot).push(Condition { query, trigger });
                }
            }
            Err(err) => self.errors.push(err),
        }
        self
    }

    fn comparator(mut self, method: &'static str, relation: Relation, query: &str) -> Self {
        let query = QueryPath::parse(query);
        if self.last_field(method).is_none() {
            return self;
        }
        match query {
            Ok(query) => {
                if let Some(plan) = self.fields.last_mut() {
                    plan.comparators.push(Comparator { relation, query });
                }
            }
            Err(err) => self.errors.push(err),
        }
        self
    }

    /// The field must be present (`object.field.required`).
    pub fn required(mut self) -> Self {
        if let Some(plan) = self.last_field("required") {
            plan.required = true;
        }
        self
    }

    /// Drops the field from native input when it is empty.
    pub fn omit_empty(mut self) -> Self {
        if let Some(plan) = self.last_field("omit_empty") {
            plan.omit_empty = true;
        }
        self
    }

    /// Validates the field only when the value at `query` equals `value`.
    pub fn skip_unless(self, query: &str, value: impl Into<Value>) -> Self {
        self.condition("skip_unless", Slot::SkipUnless, query, Trigger::If(value.into()))
    }

    /// Validates the field only when `predicate` holds for the value at
    /// `query`.
    pub fn skip_unless_with<P>(self, query: &str, predicate: P) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.condition(
            "skip_unless_with",
            Slot::SkipUnless,
            query,
            Trigger::When(Arc::new(predicate)),
        )
    }

    /// Forbids the field when the value at `query` equals `value`.
    pub fn excluded_if(self, query: &str, value: impl Into<Value>) -> Self {
        self.condition("excluded_if", Slot::Excluded, query, Trigger::If(value.into()))
    }

    /// Forbids the field unless the value at `query` equals `value`.
    pub fn excluded_unless(self, query: &str, value: impl Into<Value>) -> Self {
        self.condition("excluded_unless", Slot::Excluded, query, Trigger::Unless(value.into()))
    }

    /// Forbids the field when the value at `query` is present.
    pub fn excluded_with(self, query: &str) -> Self {
        self.condition("excluded_with", Slot::Excluded, query, Trigger::With)
    }

    /// Forbids the field when the value at `query` is absent.
    pub fn excluded_without(self, query: &str) -> Self {
        self.condition("excluded_without", Slot::Excluded, query, Trigger::Without)
    }

    /// Requires the field when the value at `query` equals `value`.
    pub fn required_if(self, query: &str, value: impl Into<Value>) -> Self {
        self.condition("required_if", Slot::Required, query, Trigger::If(value.into()))
    }

    /// Requires the field unless the value at `query` equals `value`.
    pub fn required_unless(self, query: &str, value: impl Into<Value>) -> Self {
        self.condition("required_unless", Slot::Required, query, Trigger::Unless(value.into()))
    }

    /// Requires the field when the value at `query` is present.
    pub fn required_with(self, query: &str) -> Self {
        self.condition("required_with", Slot::Required, query, Trigger::With)
    }

    /// Requires the field when the value at `query` is absent.
    pub fn required_without(self, query: &str) -> Self {
        self.condition("required_without", Slot::Required, query, Trigger::Without)
    }

    pub fn eq_field(self, query: &str) -> Self {
        self.comparator("eq_field", Relation::Eq, query)
    }

    pub fn ne_field(self, query: &str) -> Self {
        self.comparator("ne_field", Relation::Ne, query)
    }

    pub fn gt_field(self, query: &str) -> Self {
        self.comparator("gt_field", Relation::Gt, query)
    }

    pub fn gte_field(self, query: &str) -> Self {
        self.comparator("gte_field", Relation::Gte, query)
    }

    pub fn lt_field(self, query: &str) -> Self {
        self.comparator("lt_field", Relation::Lt, query)
    }

    pub fn lte_field(self, query: &str) -> Self {
        self.comparator("lte_field", Relation::Lte, query)
    }

    /// Input keys not bound to a field yield `object.unknown_field`.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    /// Skips struct-level rules. Clears [`struct_only`](Self::struct_only).
    pub fn no_struct_level(mut self) -> Self {
        self.mode = Mode::NoStructLevel;
        self
    }

    /// Adds a struct-level check, run after the fields.
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&T, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.struct_rules.put(Rule::check(check));
        self
    }

    /// Adds a struct-level rule, which may also rewrite the struct.
    pub fn rule(mut self, rule: Rule<T>) -> Self {
        self.struct_rules.put(rule);
        self
    }

    /// Replaces the message reported when the input is not an object.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.type_message = Some(message.into());
        self
    }

    /// Finishes the declaration.
    ///
    /// Fails on the first authoring defect: a condition declared before any
    /// field, a malformed query, or a field name bound twice.
    pub fn build(mut self) -> Result<ObjectSchema<T>, BuildError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        let mut names = HashSet::new();
        for plan in &self.fields {
            if !names.insert(plan.name.as_str()) {
                return Err(BuildError::DuplicateField(plan.name.clone()));
            }
        }
        tracing::debug!(
            target_type = std::any::type_name::<T>(),
            fields = self.fields.len(),
            mode = ?self.mode,
            deny_unknown = self.deny_unknown,
            "object schema built"
        );
        Ok(ObjectSchema {
            fields: self.fields.into(),
            required: false,
            deny_unknown: self.deny_unknown,
            mode: self.mode,
            struct_rules: self.struct_rules,
            type_message: self.type_message,
        })
    }
}

impl<T: Default + DeserializeOwned + 'static> ObjectBuilder<T> {
    /// Decodes the whole object into `T` instead of running the field plans.
    /// Struct-level rules still run. Clears
    /// [`no_struct_level`](Self::no_struct_level).
    pub fn struct_only(mut self) -> Self {
        self.mode = Mode::StructOnly(decode_struct::<T>);
        self
    }
}

impl<T: Default + 'static> Default for ObjectBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A built object schema producing a `T`.
pub struct ObjectSchema<T> {
    fields: Arc<[FieldPlan<T>]>,
    required: bool,
    deny_unknown: bool,
    mode: Mode<T>,
    struct_rules: RuleSet<T>,
    type_message: Option<String>,
}

impl<T> Clone for ObjectSchema<T> {
    fn clone(&self) -> Self {
        Self {
            fields: Arc::clone(&self.fields),
            required: self.required,
            deny_unknown: self.deny_unknown,
            mode: self.mode.clone(),
            struct_rules: self.struct_rules.clone(),
            type_message: self.type_message.clone(),
        }
    }
}

impl<T> ObjectSchema<T> {
    /// A missing or null object yields `object.required`.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Bound field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|plan| plan.name.as_str())
    }
}

impl<T: Default + 'static> ObjectSchema<T> {
    fn check_fields(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        let mut target = T::default();
        for plan in self.fields.iter() {
            let field_value = value.get(&plan.name);
            let flow = ctx.nested(PathSegment::field(plan.name.as_str()), |ctx| {
                plan.run(field_value, &mut target, ctx)
            });
            if flow.is_stop() {
                return (target, Flow::Stop);
            }
        }

        if self.deny_unknown {
            if let Some(entries) = value.as_object() {
                for key in entries.keys() {
                    if self.fields.iter().any(|plan| &plan.name == key) {
                        continue;
                    }
                    let flow = ctx.nested(PathSegment::key(key.as_str()), |ctx| {
                        ctx.add_issue_with(
                            "object.unknown_field",
                            format!("unknown field '{}'", key),
                            meta([("field", json!(key))]),
                        )
                    });
                    if flow.is_stop() {
                        return (target, Flow::Stop);
                    }
                }
            }
        }
        (target, Flow::Continue)
    }
}

impl<T: Default + 'static> SchemaLike for ObjectSchema<T> {
    type Output = T;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        match value {
            Value::Missing | Value::Null => {
                if self.required {
                    return (T::default(), ctx.add_issue("object.required", "value is required"));
                }
                return (T::default(), Flow::Continue);
            }
            Value::Object(_) => {}
            other => {
                let message = self
                    .type_message
                    .clone()
                    .unwrap_or_else(|| format!("expected object, got {}", other.kind_name()));
                let flow = ctx.add_issue_with(
                    "object.type",
                    message,
                    meta([("expected", json!("object")), ("actual", json!(other.kind_name()))]),
                );
                return (T::default(), flow);
            }
        }

        let (target, flow) = match &self.mode {
            Mode::StructOnly(decode) => match decode(value) {
                Ok(target) => (target, Flow::Continue),
                Err(err) => {
                    let flow = ctx.add_issue("object.decode", err.to_string());
                    return (T::default(), flow);
                }
            },
            Mode::Fields | Mode::NoStructLevel => self.check_fields(value, ctx),
        };
        if flow.is_stop() || matches!(self.mode, Mode::NoStructLevel) {
            return (target, flow);
        }
        self.struct_rules.apply_all(target, ctx)
    }

    fn omit_empty_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|plan| plan.omit_empty)
            .map(|plan| plan.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind;
    use crate::options::Options;
    use crate::schema::{NumberSchema, TextSchema};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Pair {
        a: String,
        b: String,
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Range {
        a: i64,
        b: i64,
    }

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_binding_assigns_members() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new().to_uppercase())
            .field(bind!(Pair, b), TextSchema::new())
            .build()
            .unwrap();
        let out = schema.validate(&v(json!({"a": "x", "b": "y"}))).into_result().unwrap();
        assert_eq!(out, Pair { a: "X".into(), b: "y".into() });
    }

    #[test]
    fn test_required_with_reports_at_field() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .required_with("b")
            .field(bind!(Pair, b), TextSchema::new())
            .build()
            .unwrap();
        let error = schema.validate(&v(json!({"b": "x"}))).into_result().unwrap_err();
        assert_eq!(error.len(), 1);
        assert_eq!(error.first().path(), "a");
        assert_eq!(error.first().code(), "object.field.required_with");

        assert!(schema.validate(&v(json!({}))).is_success());
    }

    #[test]
    fn test_gt_field() {
        let schema = ObjectBuilder::<Range>::new()
            .field(bind!(Range, a), NumberSchema::<i64>::new())
            .gt_field("b")
            .field(bind!(Range, b), NumberSchema::<i64>::new())
            .build()
            .unwrap();
        let error = schema.validate(&v(json!({"a": 1, "b": 2}))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.field.gtfield");
        assert_eq!(error.first().meta().get("value"), Some(&json!(2)));
        assert!(schema.validate(&v(json!({"a": 2, "b": 1}))).is_success());
    }

    #[test]
    fn test_comparator_skips_value_validator() {
        let schema = ObjectBuilder::<Range>::new()
            .field(bind!(Range, a), NumberSchema::<i64>::new().max(0))
            .lt_field("b")
            .field(bind!(Range, b), NumberSchema::<i64>::new())
            .build()
            .unwrap();
        let error = schema.validate(&v(json!({"a": 5, "b": 1}))).into_result().unwrap_err();
        assert_eq!(error.len(), 1);
        assert_eq!(error.first().code(), "object.field.ltfield");
    }

    #[test]
    fn test_skip_unless() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new().required())
            .skip_unless("b", "on")
            .field(bind!(Pair, b), TextSchema::new())
            .build()
            .unwrap();
        assert!(schema.validate(&v(json!({"b": "off"}))).is_success());
        let error = schema.validate(&v(json!({"b": "on"}))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "text.required");
    }

    #[test]
    fn test_skipped_field_keeps_default() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .skip_unless_with("b", |other| other.as_str() == Some("keep"))
            .field(bind!(Pair, b), TextSchema::new())
            .build()
            .unwrap();
        let out = schema.validate(&v(json!({"a": "x", "b": "drop"}))).into_result().unwrap();
        assert_eq!(out.a, "");
    }

    #[test]
    fn test_excluded_conditions() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new().min_len(5))
            .excluded_with("b")
            .field(bind!(Pair, b), TextSchema::new())
            .build()
            .unwrap();
        let error = schema.validate(&v(json!({"a": "x", "b": "y"}))).into_result().unwrap_err();
        assert_eq!(error.len(), 1);
        assert_eq!(error.first().code(), "object.field.excluded_with");
        assert!(schema.validate(&v(json!({"b": "y"}))).is_success());

        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .excluded_unless("b", "admin")
            .field(bind!(Pair, b), TextSchema::new())
            .build()
            .unwrap();
        assert!(schema.validate(&v(json!({"a": "x", "b": "admin"}))).is_success());
        let error = schema.validate(&v(json!({"a": "x", "b": "user"}))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.field.excluded_unless");
    }

    #[test]
    fn test_required_if_and_without() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .required_if("b", "card")
            .field(bind!(Pair, b), TextSchema::new())
            .required_without("a")
            .build()
            .unwrap();
        let error = schema.validate(&v(json!({"b": "card"}))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.field.required_if");
        assert_eq!(error.first().meta().get("value"), Some(&json!("card")));

        let error = schema.validate(&v(json!({}))).into_result().unwrap_err();
        assert_eq!(error.len(), 1);
        assert_eq!(error.first().path(), "b");
        assert_eq!(error.first().code(), "object.field.required_without");
    }

    #[test]
    fn test_binding_required() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .required()
            .build()
            .unwrap();
        let error = schema.validate(&v(json!({"a": null}))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.field.required");
    }

    #[test]
    fn test_fail_fast_stops_remaining_fields() {
        let schema = ObjectBuilder::<Range>::new()
            .field(bind!(Range, a), NumberSchema::<i64>::new().positive())
            .field(bind!(Range, b), NumberSchema::<i64>::new().positive())
            .build()
            .unwrap();
        let input = v(json!({"a": -1, "b": -1}));
        let error = schema.validate(&input).into_result().unwrap_err();
        assert_eq!(error.len(), 2);
        let error = schema
            .validate_with(&input, &Options::default().fail_fast(true))
            .into_result()
            .unwrap_err();
        assert_eq!(error.len(), 1);
    }

    #[test]
    fn test_deny_unknown_fields() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .deny_unknown_fields()
            .build()
            .unwrap();
        let error = schema
            .validate(&v(json!({"a": "x", "extra": 1, "odd key": 2})))
            .into_result()
            .unwrap_err();
        let paths: Vec<_> = error.iter().map(|i| i.path().to_string()).collect();
        assert_eq!(paths, vec!["extra", r#"["odd key"]"#]);
        assert!(error.iter().all(|i| i.code() == "object.unknown_field"));
    }

    #[test]
    fn test_struct_level_rules_and_modes() {
        let ordered = |r: &Range, ctx: &mut ValidationContext<'_>| {
            if r.a <= r.b {
                Flow::Continue
            } else {
                ctx.add_issue("range.order", "a must not exceed b")
            }
        };
        let base = || {
            ObjectBuilder::<Range>::new()
                .field(bind!(Range, a), NumberSchema::<i64>::new())
                .field(bind!(Range, b), NumberSchema::<i64>::new())
                .custom(ordered)
        };
        let input = v(json!({"a": 3, "b": 1}));

        let error = base().build().unwrap().validate(&input).into_result().unwrap_err();
        assert_eq!(error.first().code(), "range.order");
        assert_eq!(error.first().path(), "");

        let schema = base().no_struct_level().build().unwrap();
        assert!(schema.validate(&input).is_success());

        let schema = base().no_struct_level().struct_only().build().unwrap();
        assert!(schema.validate(&input).is_failure());
    }

    #[test]
    fn test_struct_only_decodes_whole_object() {
        let schema = ObjectBuilder::<Range>::new()
            .field(bind!(Range, a), NumberSchema::<i64>::new().positive())
            .struct_only()
            .build()
            .unwrap();
        let out = schema.validate(&v(json!({"a": -4, "b": 2}))).into_result().unwrap();
        assert_eq!(out, Range { a: -4, b: 2 });

        let error = schema.validate(&v(json!({"a": "x"}))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.decode");
    }

    #[test]
    fn test_type_and_required() {
        let schema = ObjectBuilder::<Pair>::new().error("need a pair").build().unwrap();
        let error = schema.validate(&v(json!([1]))).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.type");
        assert_eq!(error.first().message(), "need a pair");

        assert!(schema.validate(&Value::missing()).is_success());
        let error = schema.required().validate(&Value::null()).into_result().unwrap_err();
        assert_eq!(error.first().code(), "object.required");
    }

    #[test]
    fn test_build_errors() {
        let err = ObjectBuilder::<Pair>::new().required().build().err();
        assert_eq!(err, Some(BuildError::NoField("required")));

        let err = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .field(bind!(Pair, b as "a"), TextSchema::new())
            .build()
            .err();
        assert_eq!(err, Some(BuildError::DuplicateField("a".into())));

        let err = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new())
            .eq_field("b[")
            .build()
            .err();
        assert!(matches!(err, Some(BuildError::InvalidQuery { .. })));
    }

    #[test]
    fn test_omit_empty_native_fields() {
        let schema = ObjectBuilder::<Pair>::new()
            .field(bind!(Pair, a), TextSchema::new().min_len(2))
            .omit_empty()
            .field(bind!(Pair, b), TextSchema::new().min_len(2))
            .build()
            .unwrap();
        assert_eq!(schema.omit_empty_fields(), vec!["a".to_string()]);

        let native = Pair { a: String::new(), b: String::new() };
        let error = schema
            .validate_native(&native, &Options::default())
            .into_result()
            .unwrap_err();
        assert_eq!(error.len(), 1);
        assert_eq!(error.first().path(), "b");
    }
}
