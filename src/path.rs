//! Path representation for locating values in nested structures.
//!
//! This module provides [`JsonPath`] and [`PathSegment`]. A `JsonPath` is an
//! append-only stack owned by the validation context: schemas push a segment
//! before descending into a child and pop it afterwards, so every issue is
//! recorded at the exact location being validated.

use std::fmt::{self, Display, Write};

/// A segment of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A struct field (e.g., `user`, `email`). Always rendered bare.
    Field(String),
    /// An array index (e.g., `[0]`, `[42]`).
    Index(usize),
    /// A map key. Rendered bare when it is an identifier, quoted otherwise.
    Key(String),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }

    /// Creates a new map key segment.
    pub fn key(key: impl Into<String>) -> Self {
        PathSegment::Key(key.into())
    }
}

/// Returns true if `s` can be rendered without quoting.
///
/// The first character must be an ASCII letter or underscore, the rest
/// ASCII letters, digits or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Writes `s` as a double-quoted string, escaping `\`, `"` and newlines.
pub(crate) fn write_quoted(out: &mut impl Write, s: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '"' => out.write_str("\\\"")?,
            '\n' => out.write_str("\\n")?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

/// A path to a value in a nested structure.
///
/// # Example
///
/// ```rust
/// use sluice::JsonPath;
///
/// let mut path = JsonPath::root();
/// path.push_field("user");
/// path.push_index(0);
/// path.push_key("weird key");
///
/// assert_eq!(path.to_string(), r#"user[0]["weird key"]"#);
///
/// path.pop();
/// assert_eq!(path.to_string(), "user[0]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Creates an empty path representing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from a list of segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Appends a field segment.
    pub fn push_field(&mut self, name: impl Into<String>) {
        self.segments.push(PathSegment::Field(name.into()));
    }

    /// Appends an index segment.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Appends a map key segment.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Appends an arbitrary segment.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Removes the last segment. Does nothing on the root path.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Copies the current segments so they can be restored later.
    pub fn snapshot(&self) -> Vec<PathSegment> {
        self.segments.clone()
    }

    /// Replaces the current segments with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: Vec<PathSegment>) {
        self.segments = snapshot;
    }

    /// Returns true if this is the root path (no segments).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the segments as a slice.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the last segment, or None if this is root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

/// Renders a list of segments using the path display rules.
pub fn render_segments(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_segments(&mut out, segments);
    out
}

fn write_segments(out: &mut impl Write, segments: &[PathSegment]) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            PathSegment::Field(name) => {
                if i > 0 {
                    out.write_char('.')?;
                }
                out.write_str(name)?;
            }
            PathSegment::Key(key) if is_identifier(key) => {
                if i > 0 {
                    out.write_char('.')?;
                }
                out.write_str(key)?;
            }
            PathSegment::Key(key) => {
                out.write_char('[')?;
                write_quoted(out, key)?;
                out.write_char(']')?;
            }
            PathSegment::Index(idx) => write!(out, "[{}]", idx)?,
        }
    }
    Ok(())
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, &self.segments)
    }
}
