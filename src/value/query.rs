//! Root-relative path queries and value comparison for cross-field rules.
//!
//! Query syntax:
//!
//! - `.` or `$` is the root itself
//! - `name` or `a.b` descends into object keys
//! - `[n]` descends into an array index; negative or out-of-range indices
//!   resolve to a missing value
//! - `["quoted.key"]` descends into a key containing special characters

use std::cmp::Ordering;
use std::fmt;

use crate::error::BuildError;
use crate::path::{is_identifier, write_quoted};

use super::Value;

/// One step of a [`QueryPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuerySegment {
    Key(String),
    Index(i64),
}

/// A parsed root-relative query.
///
/// # Example
///
/// ```rust
/// use sluice::{QueryPath, Value};
/// use serde_json::json;
///
/// let root = Value::from(json!({"users": [{"name": "ada"}], "a.b": 1}));
/// let query = QueryPath::parse(r#"users[0].name"#).unwrap();
/// assert_eq!(query.resolve(&root), Value::from("ada"));
///
/// let quoted = QueryPath::parse(r#"["a.b"]"#).unwrap();
/// assert_eq!(quoted.resolve(&root), Value::from(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryPath {
    segments: Vec<QuerySegment>,
}

impl QueryPath {
    /// The query that designates the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a query string.
    pub fn parse(input: &str) -> Result<Self, BuildError> {
        Parser::new(input).parse()
    }

    pub fn segments(&self) -> &[QuerySegment] {
        &self.segments
    }

    /// Resolves the query against `root`, returning a missing value when any
    /// step does not exist.
    pub fn resolve(&self, root: &Value) -> Value {
        let mut current = root;
        for segment in &self.segments {
            current = match segment {
                QuerySegment::Key(key) => current.get(key),
                QuerySegment::Index(idx) if *idx >= 0 => current.at(*idx as usize),
                QuerySegment::Index(_) => return Value::Missing,
            };
            if current.is_missing() {
                return Value::Missing;
            }
        }
        current.clone()
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                QuerySegment::Key(key) if is_identifier(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                QuerySegment::Key(key) => {
                    f.write_str("[")?;
                    write_quoted(f, key)?;
                    f.write_str("]")?;
                }
                QuerySegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> BuildError {
        BuildError::InvalidQuery {
            query: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn parse(mut self) -> Result<QueryPath, BuildError> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            return Err(self.error("empty query"));
        }
        if trimmed == "." || trimmed == "$" {
            return Ok(QueryPath::root());
        }

        let mut segments = Vec::new();
        if self.peek() == Some('$') {
            self.chars.next();
            if self.peek() == Some('.') {
                self.chars.next();
            }
        } else if self.peek() == Some('.') {
            self.chars.next();
        }

        let mut expect_name = true;
        while let Some(c) = self.peek() {
            match c {
                '[' => {
                    self.chars.next();
                    segments.push(self.bracket()?);
                    expect_name = false;
                }
                '.' if !expect_name => {
                    self.chars.next();
                    expect_name = true;
                    if self.peek().is_none() {
                        return Err(self.error("trailing '.'"));
                    }
                }
                '.' | ']' | '"' => {
                    return Err(self.error(format!("unexpected '{}'", c)));
                }
                _ if expect_name => {
                    segments.push(QuerySegment::Key(self.name()));
                    expect_name = false;
                }
                _ => return Err(self.error(format!("expected '.' or '[' before '{}'", c))),
            }
        }
        Ok(QueryPath { segments })
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | ']' | '"') {
                break;
            }
            name.push(c);
            self.chars.next();
        }
        name
    }

    fn bracket(&mut self) -> Result<QuerySegment, BuildError> {
        let segment = match self.peek() {
            Some('"') => {
                self.chars.next();
                QuerySegment::Key(self.quoted()?)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if c == '-' || c.is_ascii_digit() {
                        digits.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                let idx = digits
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("invalid index '{}'", digits)))?;
                QuerySegment::Index(idx)
            }
            Some(c) => return Err(self.error(format!("unexpected '{}' after '['", c))),
            None => return Err(self.error("unterminated '['")),
        };
        match self.chars.next() {
            Some((_, ']')) => Ok(segment),
            _ => Err(self.error("expected ']'")),
        }
    }

    fn quoted(&mut self) -> Result<String, BuildError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => return Ok(out),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, c @ ('\\' | '"'))) => out.push(c),
                    Some((_, c)) => return Err(self.error(format!("unknown escape '\\{}'", c))),
                    None => return Err(self.error("unterminated string")),
                },
                Some((_, c)) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

/// A relation checked between two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Relation {
    /// Short name used in issue codes (`eq`, `gte`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Relation::Eq => "eq",
            Relation::Ne => "ne",
            Relation::Gt => "gt",
            Relation::Gte => "gte",
            Relation::Lt => "lt",
            Relation::Lte => "lte",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Relation::Eq => "equal to",
            Relation::Ne => "different from",
            Relation::Gt => "greater than",
            Relation::Gte => "greater than or equal to",
            Relation::Lt => "less than",
            Relation::Lte => "less than or equal to",
        }
    }

    /// Checks `left <relation> right`. Incomparable values never satisfy a
    /// relation, including `Ne`.
    pub fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            Relation::Eq => values_equal(left, right),
            Relation::Ne => {
                left.is_present()
                    && right.is_present()
                    && left.kind() == right.kind()
                    && !values_equal(left, right)
            }
            Relation::Gt => compare_values(left, right) == Some(Ordering::Greater),
            Relation::Gte => matches!(
                compare_values(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Relation::Lt => compare_values(left, right) == Some(Ordering::Less),
            Relation::Lte => matches!(
                compare_values(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Equality used by cross-field conditions.
///
/// An expected null only matches null; a missing or null actual never equals
/// a non-null expected value; numbers compare after normalization.
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (_, Value::Null) => actual.is_null(),
        (Value::Missing | Value::Null, _) | (_, Value::Missing) => false,
        (Value::Number(a), Value::Number(b)) => match (parse_number(a), parse_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a.trim() == b.trim(),
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => false,
    }
}

/// Orders two values of the same scalar kind: strings lexicographically,
/// numbers numerically. Everything else is incomparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => parse_number(a)?.partial_cmp(&parse_number(b)?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
