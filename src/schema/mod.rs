//! Schema definitions for validation.
//!
//! Every schema implements [`SchemaLike`]: it checks a [`Value`](crate::Value)
//! at the context's current path, records issues and produces a typed
//! output. [`Schema`] is the entry point for building them.
//!
//! # Example
//!
//! ```rust
//! use sluice::{Schema, SchemaLike, Value};
//!
//! let schema = Schema::text().min_len(1).max_len(100);
//!
//! assert!(schema.validate(&Value::from("hello")).is_success());
//! ```

mod array;
mod binding;
mod boolean;
mod combinators;
mod date;
mod duration;
mod number;
mod object;
mod record;
mod ref_schema;
mod scalar;
mod text;
pub(crate) mod traits;

pub use array::ArraySchema;
pub use binding::FieldBinding;
pub use boolean::BoolSchema;
pub use combinators::{AnyOf, OneOf};
pub use date::DateSchema;
pub use duration::DurationSchema;
pub use number::{NumberSchema, Numeric};
pub use object::{ObjectBuilder, ObjectSchema};
pub use record::RecordSchema;
pub use ref_schema::RefSchema;
pub use text::TextSchema;
pub use traits::{Erased, SchemaLike, ValueValidator};

/// Entry point for creating validation schemas.
///
/// Each factory returns a schema with no constraints; builder methods add
/// them.
///
/// # Example
///
/// ```rust
/// use sluice::Schema;
///
/// let username = Schema::text().trim().min_len(3).max_len(32);
/// let port = Schema::number::<u16>().range(1..=65535);
/// let tags = Schema::array(Schema::text().non_empty()).unique().max_len(8);
/// ```
pub struct Schema;

impl Schema {
    /// Creates a text schema.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::text().min_len(5);
    /// assert!(schema.validate(&Value::from("hello")).is_success());
    /// assert!(schema.validate(&Value::from("hi")).is_failure());
    /// ```
    pub fn text() -> TextSchema {
        TextSchema::new()
    }

    /// Creates a number schema for the primitive type `N`.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::number::<i32>().min(0).max(100);
    /// assert!(schema.validate(&Value::from(50)).is_success());
    /// assert!(schema.validate(&Value::from(-5)).is_failure());
    ///
    /// // Fractions are not integers.
    /// assert!(schema.validate(&Value::from(1.5)).is_failure());
    /// ```
    pub fn number<N: Numeric>() -> NumberSchema<N> {
        NumberSchema::new()
    }

    pub fn boolean() -> BoolSchema {
        BoolSchema::new()
    }

    pub fn date() -> DateSchema {
        DateSchema::new()
    }

    pub fn duration() -> DurationSchema {
        DurationSchema::new()
    }

    /// Creates an array schema validating each item with `items`.
    pub fn array<S: SchemaLike>(items: S) -> ArraySchema<S> {
        ArraySchema::new(items)
    }

    /// Creates a record schema validating each value with `values`.
    pub fn record<V: SchemaLike>(values: V) -> RecordSchema<V> {
        RecordSchema::new(values)
    }

    /// Starts an object schema producing a `T`; see [`ObjectBuilder`].
    pub fn object<T: Default + 'static>() -> ObjectBuilder<T> {
        ObjectBuilder::new()
    }

    /// The first matching schema wins.
    pub fn any_of<T>(schemas: Vec<Box<dyn SchemaLike<Output = T>>>) -> AnyOf<T> {
        AnyOf::new(schemas)
    }

    /// Exactly one schema may match.
    ///
    /// ```rust
    /// use sluice::{Schema, SchemaLike, Value};
    ///
    /// let schema = Schema::one_of(vec![])
    ///     .or(Schema::text().min_len(1))
    ///     .or(Schema::text().pattern("^[a-z]+$").unwrap());
    ///
    /// let error = schema.validate(&Value::from("abc")).into_result().unwrap_err();
    /// assert_eq!(error.first().code(), "combinator.oneof");
    /// assert!(schema.validate(&Value::from("ABC")).is_success());
    /// ```
    pub fn one_of<T>(schemas: Vec<Box<dyn SchemaLike<Output = T>>>) -> OneOf<T> {
        OneOf::new(schemas)
    }

    /// Refers to the schema registered for `T`.
    pub fn reference<T: Default + 'static>() -> RefSchema<T> {
        RefSchema::new()
    }
}
