//! # Sluice
//!
//! A schema validation engine that reports every problem with the input at
//! a stable, addressable path, instead of stopping at the first one.
//!
//! ## Overview
//!
//! Input (already-decoded data, wire JSON, or a native value) is normalized
//! into a [`Value`] that keeps presence (missing, null, present) and exact
//! number text. A schema checks it and produces either a typed, possibly
//! coerced or defaulted output, or a [`ValidationError`] listing
//! [`Issue`]s. Results are stillwater [`Validation`](stillwater::Validation)s,
//! so error sets combine applicatively.
//!
//! ## Core Types
//!
//! - [`Schema`]: entry point for building schemas
//! - [`SchemaLike`]: the trait every schema implements
//! - [`ValidationContext`]: per-call state (path, issues, sandboxing)
//! - [`Rule`] / [`RuleSet`]: composable checks and transforms
//! - [`ObjectBuilder`] and [`bind!`]: struct-backed object schemas with
//!   conditional and cross-field rules
//! - [`SchemaRegistry`]: schemas looked up by output type
//! - [`Options`]: fail-fast, issue limits, coercion, omit flags, dates
//!
//! ## Example
//!
//! ```rust
//! use sluice::{bind, Options, Schema, SchemaLike, Value};
//! use serde_json::json;
//!
//! #[derive(Debug, Default, Clone)]
//! struct Account {
//!     name: String,
//!     age: u8,
//!     tags: Vec<String>,
//! }
//!
//! let schema = Schema::object::<Account>()
//!     .field(bind!(Account, name), Schema::text().trim().min_len(1))
//!     .field(bind!(Account, age), Schema::number::<u8>().range(18..=130))
//!     .field(bind!(Account, tags), Schema::array(Schema::text()).unique())
//!     .build()
//!     .unwrap();
//!
//! let input = Value::from(json!({"name": " ", "age": 12, "tags": ["a", "a"]}));
//! let error = schema.validate(&input).into_result().unwrap_err();
//!
//! let paths: Vec<&str> = error.iter().map(|issue| issue.path()).collect();
//! assert_eq!(paths, vec!["name", "age", "tags[1]"]);
//!
//! // Coercion is opt-in.
//! let options = Options::default().coerce(true);
//! let input = Value::from(json!({"name": "ada", "age": "42"}));
//! let account = schema.validate_with(&input, &options).into_result().unwrap();
//! assert_eq!(account.age, 42);
//! ```

pub mod batch;
pub mod coerce;
pub mod defaults;
pub mod error;
pub mod options;
pub mod path;
pub mod registry;
pub mod rule;
pub mod schema;
pub mod validation;
pub mod value;

pub use batch::{validate_batch, validate_batch_in};
pub use defaults::DefaultProvider;
pub use error::{
    BuildError, ConfigError, DecodeError, ErrorFormatter, Issue, Meta, ValidationError,
};
pub use options::{Options, DEFAULT_DATE_LAYOUTS};
pub use path::{JsonPath, PathSegment};
pub use registry::{RegistryError, SchemaRegistry};
pub use rule::{Rule, RuleSet, Stage};
pub use schema::{
    AnyOf, ArraySchema, BoolSchema, DateSchema, DurationSchema, Erased, FieldBinding,
    NumberSchema, Numeric, ObjectBuilder, ObjectSchema, OneOf, RecordSchema, RefSchema, Schema,
    SchemaLike, TextSchema, ValueValidator,
};
pub use validation::{Flow, Sandboxed, Snapshot, ValidationContext};
pub use value::{
    ContentHash, FromValue, Kind, Presence, QueryPath, QuerySegment, Relation, ToValue, Value,
    ValueMap,
};

/// Type alias for validation results using [`ValidationError`].
pub type ValidationResult<T> = stillwater::Validation<T, ValidationError>;
