//! Traits for schema polymorphism.
//!
//! [`SchemaLike`] is the typed seam every schema implements: one `check`
//! method driven by a [`ValidationContext`], plus provided entry points that
//! normalize input and build the context. [`ValueValidator`] erases the
//! output type so heterogeneous schemas can sit side by side.

use std::sync::Arc;

use serde::Serialize;
use stillwater::Validation;

use crate::error::{DecodeError, Issue, ValidationError};
use crate::options::Options;
use crate::path::JsonPath;
use crate::registry::SchemaRegistry;
use crate::validation::{Flow, ValidationContext};
use crate::value::{project_native, ToValue, Value};
use crate::ValidationResult;

/// A schema producing `Output` from a [`Value`].
///
/// The `Send + Sync` bounds allow built schemas to be shared across threads
/// and used as trait objects.
///
/// # Example
///
/// ```rust
/// use sluice::{Schema, SchemaLike, Value};
/// use serde_json::json;
///
/// let schema = Schema::text().min_len(3);
///
/// assert!(schema.validate(&Value::from(json!("hello"))).is_success());
/// assert!(schema.validate(&Value::from(json!("hi"))).is_failure());
/// ```
pub trait SchemaLike: Send + Sync {
    /// The output type produced by successful validation.
    type Output;

    /// Validates `value` at the context's current path.
    ///
    /// Issues go into `ctx`; the output is the (possibly partial) value
    /// produced, and the flow tells the caller whether to go on with
    /// siblings.
    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Self::Output, Flow);

    /// Whether a missing or null value is reported as an issue.
    fn is_required(&self) -> bool {
        false
    }

    /// Field names to drop from native input when they are empty.
    fn omit_empty_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Validates with default options.
    fn validate(&self, value: &Value) -> ValidationResult<Self::Output> {
        self.validate_with(value, &Options::default())
    }

    /// Validates with `options`.
    fn validate_with(&self, value: &Value, options: &Options) -> ValidationResult<Self::Output> {
        run(self, value, options, None)
    }

    /// Validates with `options`, resolving references through `registry`.
    fn validate_in(
        &self,
        value: &Value,
        options: &Options,
        registry: &SchemaRegistry,
    ) -> ValidationResult<Self::Output> {
        run(self, value, options, Some(registry))
    }

    /// Decodes wire JSON and validates it. Malformed input yields a single
    /// `value.decode` issue.
    ///
    /// ```rust
    /// use sluice::{Options, Schema, SchemaLike};
    ///
    /// let schema = Schema::number::<u8>();
    /// let result = schema.validate_json(b"{oops", &Options::default());
    /// let error = result.into_result().unwrap_err();
    /// assert_eq!(error.first().code(), "value.decode");
    /// ```
    fn validate_json(&self, bytes: &[u8], options: &Options) -> ValidationResult<Self::Output> {
        match Value::from_json_slice(bytes) {
            Ok(value) => self.validate_with(&value, options),
            Err(err) => decode_failure(err),
        }
    }

    /// Projects a native value with the omit flags of `options` and this
    /// schema's per-field omit-empty list, then validates it.
    fn validate_native<N>(&self, native: &N, options: &Options) -> ValidationResult<Self::Output>
    where
        N: Serialize + ?Sized,
        Self: Sized,
    {
        match project_native(native, options, &self.omit_empty_fields()) {
            Ok(value) => self.validate_with(&value, options),
            Err(err) => decode_failure(err),
        }
    }
}

pub(crate) fn decode_failure<T>(err: DecodeError) -> ValidationResult<T> {
    let issue = Issue::new(&JsonPath::root(), "value.decode", err.to_string());
    Validation::Failure(ValidationError::single(issue))
}

fn run<S: SchemaLike + ?Sized>(
    schema: &S,
    value: &Value,
    options: &Options,
    registry: Option<&SchemaRegistry>,
) -> ValidationResult<S::Output> {
    let span = tracing::debug_span!(
        "validate",
        schema = std::any::type_name::<S>(),
        issues = tracing::field::Empty
    );
    let _guard = span.enter();

    let mut ctx = ValidationContext::new(value, options);
    if let Some(registry) = registry {
        ctx = ctx.with_registry(registry);
    }
    let (output, _) = schema.check(value, &mut ctx);
    span.record("issues", ctx.issue_count());
    ctx.finish(output)
}

impl<S: SchemaLike + ?Sized> SchemaLike for Box<S> {
    type Output = S::Output;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Self::Output, Flow) {
        (**self).check(value, ctx)
    }

    fn is_required(&self) -> bool {
        (**self).is_required()
    }

    fn omit_empty_fields(&self) -> Vec<String> {
        (**self).omit_empty_fields()
    }
}

impl<S: SchemaLike + ?Sized> SchemaLike for Arc<S> {
    type Output = S::Output;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Self::Output, Flow) {
        (**self).check(value, ctx)
    }

    fn is_required(&self) -> bool {
        (**self).is_required()
    }

    fn omit_empty_fields(&self) -> Vec<String> {
        (**self).omit_empty_fields()
    }
}

/// A type-erased schema producing a [`Value`].
///
/// Every [`SchemaLike`] whose output implements [`ToValue`] is a
/// `ValueValidator`.
///
/// ```rust
/// use sluice::{Schema, ValueValidator};
///
/// let validators: Vec<Box<dyn ValueValidator>> = vec![
///     Box::new(Schema::text().min_len(1)),
///     Box::new(Schema::number::<i64>().positive()),
/// ];
/// assert_eq!(validators.len(), 2);
/// ```
pub trait ValueValidator: Send + Sync {
    fn check_value(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Value, Flow);

    fn value_required(&self) -> bool;
}

impl<S> ValueValidator for S
where
    S: SchemaLike,
    S::Output: ToValue,
{
    fn check_value(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Value, Flow) {
        let (output, flow) = self.check(value, ctx);
        (output.to_value(), flow)
    }

    fn value_required(&self) -> bool {
        self.is_required()
    }
}

/// Adapts any [`ValueValidator`] back into a `SchemaLike<Output = Value>`.
#[derive(Clone)]
pub struct Erased(Arc<dyn ValueValidator>);

impl Erased {
    pub fn new<V: ValueValidator + 'static>(validator: V) -> Self {
        Self(Arc::new(validator))
    }
}

impl SchemaLike for Erased {
    type Output = Value;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (Value, Flow) {
        self.0.check_value(value, ctx)
    }

    fn is_required(&self) -> bool {
        self.0.value_required()
    }
}
