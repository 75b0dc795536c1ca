//! Errors that signal a defect in how a schema was written or how input was
//! supplied, as opposed to a validation issue in the data.

/// A schema-authoring defect detected while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A field-level condition was declared before any field.
    #[error("'{0}' must follow a field declaration")]
    NoField(&'static str),

    /// Two fields were bound under the same external name.
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    /// A cross-field query could not be parsed.
    #[error("invalid query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    /// A text pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Input could not be turned into a value, or a value into a native type.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON input: {0}")]
    Json(#[source] serde_json::Error),

    #[error("cannot project native value: {0}")]
    Native(#[source] serde_json::Error),

    #[error("cannot decode value: {0}")]
    Struct(#[source] serde_json::Error),
}

/// An options configuration document could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid options document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("time zone offset {0}s is out of range")]
    TimeZone(i32),
}
