//! Parallel validation of independent inputs.

use rayon::prelude::*;

use crate::options::Options;
use crate::registry::SchemaRegistry;
use crate::schema::SchemaLike;
use crate::value::Value;
use crate::ValidationResult;

/// Validates every input with `schema` on the rayon thread pool.
///
/// Each input gets its own validation context; results come back in input
/// order.
///
/// # Example
///
/// ```rust
/// use sluice::{validate_batch, Options, Schema, Value};
///
/// let inputs: Vec<Value> = (0..100).map(Value::from).collect();
/// let results = validate_batch(&Schema::number::<i32>().max(49), &inputs, &Options::default());
///
/// assert_eq!(results.len(), 100);
/// assert_eq!(results.iter().filter(|r| r.is_failure()).count(), 50);
/// ```
pub fn validate_batch<S>(
    schema: &S,
    inputs: &[Value],
    options: &Options,
) -> Vec<ValidationResult<S::Output>>
where
    S: SchemaLike,
    S::Output: Send,
{
    tracing::debug!(inputs = inputs.len(), "batch validation started");
    inputs
        .par_iter()
        .map(|input| schema.validate_with(input, options))
        .collect()
}

/// Like [`validate_batch`], resolving references through `registry`.
pub fn validate_batch_in<S>(
    schema: &S,
    inputs: &[Value],
    options: &Options,
    registry: &SchemaRegistry,
) -> Vec<ValidationResult<S::Output>>
where
    S: SchemaLike,
    S::Output: Send,
{
    tracing::debug!(inputs = inputs.len(), "batch validation started");
    inputs
        .par_iter()
        .map(|input| schema.validate_in(input, options, registry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ObjectBuilder, RefSchema, TextSchema};
    use serde_json::json;

    #[test]
    fn test_results_keep_input_order() {
        let inputs: Vec<Value> = ["a", "", "bb", ""].into_iter().map(Value::from).collect();
        let results = validate_batch(&TextSchema::new().non_empty(), &inputs, &Options::default());
        let passed: Vec<bool> = results.iter().map(|r| r.is_success()).collect();
        assert_eq!(passed, vec![true, false, true, false]);
    }

    #[test]
    fn test_batch_with_registry() {
        #[derive(Debug, Default, Clone)]
        struct Tag {
            label: String,
        }

        let registry = SchemaRegistry::new();
        registry.register(
            ObjectBuilder::<Tag>::new()
                .field(crate::bind!(Tag, label), TextSchema::new().required())
                .build()
                .unwrap(),
        );
        let inputs = vec![Value::from(json!({"label": "x"})), Value::from(json!({}))];
        let results = validate_batch_in(&RefSchema::<Tag>::new(), &inputs, &Options::default(), &registry);
        assert!(results[0].is_success());
        assert!(results[1].is_failure());
    }
}
