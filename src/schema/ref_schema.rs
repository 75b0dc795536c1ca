//! References to registered schemas.

use std::fmt;
use std::marker::PhantomData;

use serde_json::json;

use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

use super::scalar::meta;
use super::traits::SchemaLike;

/// A schema that defers to whatever schema the registry holds for `T`.
///
/// The registry comes from the validation context, so validate through
/// [`SchemaLike::validate_in`] or [`SchemaRegistry::validate`](crate::SchemaRegistry::validate).
/// Without a registry, or without a registration for `T`, the reference
/// yields `ref.unresolved`. Nesting deeper than `Options::max_depth` yields
/// `ref.max_depth`.
///
/// # Example
///
/// ```rust
/// use sluice::{bind, Options, Schema, SchemaRegistry, Value};
/// use serde_json::json;
///
/// #[derive(Debug, Default, Clone)]
/// struct Category {
///     name: String,
///     children: Vec<Category>,
/// }
///
/// let registry = SchemaRegistry::new();
/// registry.register(
///     Schema::object::<Category>()
///         .field(bind!(Category, name), Schema::text().non_empty())
///         .field(bind!(Category, children), Schema::array(Schema::reference::<Category>()))
///         .build()
///         .unwrap(),
/// );
///
/// let input = Value::from(json!({
///     "name": "root",
///     "children": [{"name": "leaf", "children": [{"name": ""}]}]
/// }));
/// let error = registry
///     .validate::<Category>(&input, &Options::default())
///     .unwrap()
///     .into_result()
///     .unwrap_err();
/// assert_eq!(error.first().path(), "children[0].children[0].name");
/// ```
pub struct RefSchema<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> RefSchema<T> {
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for RefSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RefSchema<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RefSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefSchema")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Default + 'static> SchemaLike for RefSchema<T> {
    type Output = T;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        let type_name = std::any::type_name::<T>();
        let schema = match ctx.registry().and_then(|registry| registry.lookup::<T>()) {
            Some(schema) => schema,
            None => {
                let flow = ctx.add_issue_with(
                    "ref.unresolved",
                    format!("no schema registered for {}", type_name),
                    meta([("type", json!(type_name))]),
                );
                return (T::default(), flow);
            }
        };

        match ctx.descend(|ctx| schema.check(value, ctx)) {
            Some(outcome) => outcome,
            None => {
                let max = ctx.options().max_depth;
                let flow = ctx.add_issue_with(
                    "ref.max_depth",
                    format!("reference depth exceeds {}", max),
                    meta([("max_depth", json!(max))]),
                );
                (T::default(), flow)
            }
        }
    }
}
