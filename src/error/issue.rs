//! Validation issue types.
//!
//! This module provides [`Issue`] for single validation failures and
//! [`ValidationError`] for the non-empty, ordered set of issues a validation
//! call produced.

use std::fmt::{self, Display};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use stillwater::prelude::*;

use crate::path::{render_segments, JsonPath, PathSegment};

/// Issue metadata, e.g. `{"min": 3, "actual": 1}`.
pub type Meta = IndexMap<String, serde_json::Value>;

/// Renders a whole issue list into one message.
pub type ErrorFormatter = Arc<dyn Fn(&[Issue]) -> String + Send + Sync>;

/// A single validation failure.
///
/// An issue is immutable once created; [`Issue::with_meta`] returns a new
/// issue and shares the metadata map until it is modified.
///
/// # Example
///
/// ```rust
/// use sluice::{Issue, JsonPath};
///
/// let mut path = JsonPath::root();
/// path.push_field("email");
///
/// let issue = Issue::new(&path, "text.required", "value is required")
///     .with_meta("field", "email");
///
/// assert_eq!(issue.path(), "email");
/// assert_eq!(issue.to_string(), "email: value is required (text.required)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    path: String,
    code: String,
    message: String,
    meta: Arc<Meta>,
    segments: Vec<PathSegment>,
}

impl Issue {
    /// Creates an issue at `path`.
    pub fn new(path: &JsonPath, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at_segments(path.segments().to_vec(), code, message)
    }

    pub(crate) fn at_segments(
        segments: Vec<PathSegment>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: render_segments(&segments),
            code: code.into(),
            message: message.into(),
            meta: Arc::new(Meta::new()),
            segments,
        }
    }

    /// Returns a copy of this issue with one more metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Arc::make_mut(&mut self.meta).insert(key.into(), value.into());
        self
    }

    /// Returns a copy of this issue with all entries of `meta` added.
    pub fn with_meta_map(mut self, meta: Meta) -> Self {
        if !meta.is_empty() {
            Arc::make_mut(&mut self.meta).extend(meta);
        }
        self
    }

    /// Rendered path, empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Machine readable code, e.g. `text.min_length`.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True for the all-empty issue, which is never recorded.
    pub fn is_zero(&self) -> bool {
        self.path.is_empty() && self.code.is_empty() && self.message.is_empty() && self.meta.is_empty()
    }

    /// Moves the issue so that the part of its path below `base` is placed
    /// under `prefix` instead.
    pub(crate) fn rebase(self, base: &[PathSegment], prefix: &[PathSegment]) -> Self {
        let relative = if self.segments.starts_with(base) {
            &self.segments[base.len()..]
        } else {
            &self.segments[..]
        };
        let mut segments = prefix.to_vec();
        segments.extend_from_slice(relative);
        Self {
            path: render_segments(&segments),
            segments,
            ..self
        }
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{}: {} ({})", self.path, self.message, self.code)
        }
    }
}

impl std::error::Error for Issue {}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Issue", 4)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("meta", self.meta.as_ref())?;
        state.end()
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Issue>();
    assert_sync::<Issue>();
};

/// The aggregate error of one validation call: a non-empty, ordered list of
/// issues.
///
/// `Display` renders one issue per line, or whatever the formatter from
/// [`Options::formatter`](crate::Options::formatter) produces. `Serialize`
/// emits the issue list as a JSON array, ready for an API error body.
///
/// ```rust
/// use sluice::{Issue, JsonPath, ValidationError};
///
/// assert!(ValidationError::from_issues(vec![]).is_none());
///
/// let error = ValidationError::from_issues(vec![
///     Issue::new(&JsonPath::root(), "text.required", "value is required"),
/// ])
/// .unwrap();
/// assert_eq!(error.len(), 1);
/// ```
#[derive(Clone)]
pub struct ValidationError {
    issues: NonEmptyVec<Issue>,
    formatter: Option<ErrorFormatter>,
}

impl ValidationError {
    /// Creates a `ValidationError` containing a single issue.
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: NonEmptyVec::singleton(issue),
            formatter: None,
        }
    }

    /// Builds an error from a list of issues. Returns `None` for an empty list.
    pub fn from_issues(issues: Vec<Issue>) -> Option<Self> {
        let mut rest = issues.into_iter();
        let mut collected = NonEmptyVec::singleton(rest.next()?);
        for issue in rest {
            collected = collected.combine(NonEmptyVec::singleton(issue));
        }
        Some(Self {
            issues: collected,
            formatter: None,
        })
    }

    /// Attaches the formatter used by `Display`.
    pub fn with_formatter(mut self, formatter: Option<ErrorFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the issues in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    /// Returns the first issue.
    pub fn first(&self) -> &Issue {
        self.issues.head()
    }

    /// Returns all issues at the rendered path `path`.
    pub fn at_path(&self, path: &str) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.path == path).collect()
    }

    /// Returns all issues with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.code == code).collect()
    }

    /// Copies the issues into a vector.
    pub fn to_vec(&self) -> Vec<Issue> {
        self.issues.iter().cloned().collect()
    }

    /// Converts this error into its issues.
    pub fn into_vec(self) -> Vec<Issue> {
        self.issues.into_vec()
    }

    /// The issue list as a JSON array.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.issues
                .iter()
                .map(|issue| {
                    serde_json::json!({
                        "path": issue.path,
                        "code": issue.code,
                        "message": issue.message,
                        "meta": issue.meta.as_ref(),
                    })
                })
                .collect(),
        )
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationError")
            .field("issues", &self.to_vec())
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

impl PartialEq for ValidationError {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Semigroup for ValidationError {
    fn combine(self, other: Self) -> Self {
        Self {
            issues: self.issues.combine(other.issues),
            formatter: self.formatter.or(other.formatter),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(formatter) = &self.formatter {
            return f.write_str(&formatter(&self.to_vec()));
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for issue in self.issues.iter() {
            seq.serialize_element(issue)?;
        }
        seq.end()
    }
}

impl IntoIterator for ValidationError {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_vec().into_iter()
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationError>();
    assert_sync::<ValidationError>();
};
