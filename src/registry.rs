//! Schema registry keyed by output type.
//!
//! A [`SchemaRegistry`] maps a Rust type to the schema that produces it, so
//! values can be validated "as a `T`" without holding the schema, and so
//! [`RefSchema`](crate::RefSchema) can resolve recursive structures.
//!
//! Registries are plain values: build one and pass it to
//! [`SchemaLike::validate_in`] or [`SchemaRegistry::validate`]. A
//! process-wide instance is available through [`SchemaRegistry::global`]
//! for application wiring.

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::options::Options;
use crate::schema::traits::decode_failure;
use crate::schema::SchemaLike;
use crate::value::Value;
use crate::ValidationResult;

/// A registered schema, stored as `Arc<dyn SchemaLike<Output = T>>` behind
/// `Any`.
struct Entry {
    type_id: TypeId,
    type_name: &'static str,
    schema: Arc<dyn Any + Send + Sync>,
}

/// A thread-safe map from output types to schemas.
///
/// Registration and reset take the write lock; lookups take the read lock
/// and release it before the schema runs.
///
/// # Example
///
/// ```rust
/// use sluice::{Options, Schema, SchemaRegistry, Value};
///
/// let registry = SchemaRegistry::new();
/// registry.register(Schema::number::<u16>().max(1024));
///
/// let result = registry
///     .validate::<u16>(&Value::from(80), &Options::default())
///     .unwrap();
/// assert!(result.is_success());
///
/// assert!(registry.validate::<u32>(&Value::from(80), &Options::default()).is_err());
/// ```
#[derive(Default)]
pub struct SchemaRegistry {
    entries: RwLock<Vec<Entry>>,
}

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Registers `schema` as the schema for its output type, replacing any
    /// earlier registration for that type.
    pub fn register<S>(&self, schema: S)
    where
        S: SchemaLike + 'static,
        S::Output: 'static,
    {
        let shared: Arc<dyn SchemaLike<Output = S::Output>> = Arc::new(schema);
        let entry = Entry {
            type_id: TypeId::of::<S::Output>(),
            type_name: std::any::type_name::<S::Output>(),
            schema: Arc::new(shared),
        };

        let mut entries = self.entries.write();
        let replaced = match entries.iter_mut().find(|e| e.type_id == entry.type_id) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                entries.push(entry);
                false
            }
        };
        tracing::debug!(
            output = std::any::type_name::<S::Output>(),
            replaced,
            registered = entries.len(),
            "schema registered"
        );
    }

    /// The schema registered for `T`, if any.
    pub fn lookup<T: 'static>(&self) -> Option<Arc<dyn SchemaLike<Output = T>>> {
        let entries = self.entries.read();
        entries
            .iter()
            .find(|e| e.type_id == TypeId::of::<T>())
            .and_then(|e| e.schema.downcast_ref::<Arc<dyn SchemaLike<Output = T>>>())
            .cloned()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries
            .read()
            .iter()
            .any(|e| e.type_id == TypeId::of::<T>())
    }

    /// Names of the registered output types, in registration order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.read().iter().map(|e| e.type_name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes every registration.
    ///
    /// Meant for test isolation; validations running concurrently may see
    /// schemas disappear.
    pub fn reset(&self) {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        tracing::debug!(removed, "schema registry reset");
    }

    /// Validates `value` with the schema registered for `T`. References
    /// inside that schema resolve through this registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] when no schema produces `T`.
    pub fn validate<T: 'static>(
        &self,
        value: &Value,
        options: &Options,
    ) -> Result<ValidationResult<T>, RegistryError> {
        let schema = self
            .lookup::<T>()
            .ok_or_else(|| RegistryError::NotRegistered(std::any::type_name::<T>()))?;
        Ok(schema.validate_in(value, options, self))
    }

    /// Decodes wire JSON and validates it as a `T`.
    pub fn validate_json<T: 'static>(
        &self,
        bytes: &[u8],
        options: &Options,
    ) -> Result<ValidationResult<T>, RegistryError> {
        let schema = self
            .lookup::<T>()
            .ok_or_else(|| RegistryError::NotRegistered(std::any::type_name::<T>()))?;
        Ok(match Value::from_json_slice(bytes) {
            Ok(value) => schema.validate_in(&value, options, self),
            Err(err) => decode_failure(err),
        })
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No schema is registered for the requested output type.
    #[error("no schema registered for type {0}")]
    NotRegistered(&'static str),
}
