//! Conversion between [`Value`], wire JSON and native Rust values.
//!
//! Wire JSON goes through `serde_json` with `arbitrary_precision`, so number
//! text survives decoding untouched. Native values are projected with their
//! `Serialize` impl and the omit flags from [`Options`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::DecodeError;
use crate::options::Options;

use super::{Value, ValueMap};

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => Value::Number(n.to_string()),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    /// Decodes wire JSON bytes, preserving number text exactly.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let json: Json = serde_json::from_slice(bytes).map_err(DecodeError::Json)?;
        Ok(Value::from(json))
    }

    /// Converts to a `serde_json::Value`. Missing and null both become null.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Missing | Value::Null => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Number(n) => n
                .trim()
                .parse::<serde_json::Number>()
                .map(Json::Number)
                .unwrap_or_else(|_| Json::String(n.clone())),
            Value::Boolean(b) => Json::Bool(*b),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Encodes to wire JSON bytes.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, DecodeError> {
        serde_json::to_vec(&self.to_json()).map_err(DecodeError::Json)
    }

    /// Projects a native value, honouring the omit flags of `options`.
    ///
    /// ```rust
    /// use serde::Serialize;
    /// use sluice::{Options, Value};
    ///
    /// #[derive(Serialize)]
    /// struct Profile {
    ///     name: String,
    ///     nickname: Option<String>,
    /// }
    ///
    /// let profile = Profile { name: "ada".into(), nickname: None };
    /// let value = Value::from_native(&profile, &Options::default().omit_nil(true)).unwrap();
    /// assert!(value.get("nickname").is_missing());
    /// ```
    pub fn from_native<T: Serialize + ?Sized>(
        native: &T,
        options: &Options,
    ) -> Result<Self, DecodeError> {
        project_native(native, options, &[])
    }
}

/// Projects a native value. `local_omit_empty` names top-level fields that
/// are skipped when empty regardless of the global flags.
pub(crate) fn project_native<T: Serialize + ?Sized>(
    native: &T,
    options: &Options,
    local_omit_empty: &[String],
) -> Result<Value, DecodeError> {
    let json = serde_json::to_value(native).map_err(DecodeError::Native)?;
    Ok(project(json, options, local_omit_empty))
}

fn project(json: Json, options: &Options, local_omit_empty: &[String]) -> Value {
    match json {
        Json::Object(entries) => {
            let mut out = ValueMap::with_capacity(entries.len());
            for (key, value) in entries {
                let local = local_omit_empty.iter().any(|name| name == &key);
                if should_omit(&value, options, local) {
                    continue;
                }
                out.insert(key, project(value, options, &[]));
            }
            Value::object(out)
        }
        Json::Array(items) => Value::array(
            items
                .into_iter()
                .map(|item| project(item, options, &[]))
                .collect(),
        ),
        other => Value::from(other),
    }
}

fn should_omit(value: &Json, options: &Options, local_omit_empty: bool) -> bool {
    (options.omit_nil && value.is_null())
        || ((options.omit_empty || local_omit_empty) && is_empty(value))
        || (options.omit_zero && is_zero(value))
}

fn is_zero_number(n: &serde_json::Number) -> bool {
    n.to_string().trim().parse::<f64>().map(|f| f == 0.0).unwrap_or(false)
}

/// Null, false, zero, or a zero-length string, array or object.
fn is_empty(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::Bool(b) => !b,
        Json::Number(n) => is_zero_number(n),
        Json::String(s) => s.is_empty(),
        Json::Array(items) => items.is_empty(),
        Json::Object(entries) => entries.is_empty(),
    }
}

/// The zero value of the native type: arrays are never zero since an empty
/// vector and an absent one serialize differently.
fn is_zero(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::Bool(b) => !b,
        Json::Number(n) => is_zero_number(n),
        Json::String(s) => s.is_empty(),
        Json::Array(_) => false,
        Json::Object(entries) => entries.values().all(is_zero),
    }
}

/// Decodes a [`Value`] into a native type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, DecodeError>;
}

impl<T: DeserializeOwned> FromValue for T {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        serde_json::from_value(value.to_json()).map_err(DecodeError::Struct)
    }
}
