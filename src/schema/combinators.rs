//! Schema combinators.
//!
//! - [`AnyOf`]: the first matching branch wins
//! - [`OneOf`]: exactly one branch may match
//!
//! Branches run in a sandbox, so a failed branch leaves no trace unless it
//! is picked as the closest match. The closest match is the failed branch
//! with the fewest issues; ties go to the earlier branch. `fail_fast`
//! applies inside one branch and never stops the other branches.
//!
//! # Example
//!
//! ```rust
//! use sluice::{Erased, Schema, SchemaLike, Value};
//!
//! // A string or a positive number, kept as a generic value.
//! let id = Schema::any_of(vec![
//!     Box::new(Erased::new(Schema::text().min_len(1))) as Box<dyn SchemaLike<Output = Value>>,
//!     Box::new(Erased::new(Schema::number::<u64>().positive())),
//! ]);
//!
//! assert!(id.validate(&Value::from("abc")).is_success());
//! assert!(id.validate(&Value::from(42)).is_success());
//! assert!(id.validate(&Value::from(true)).is_failure());
//! ```

use std::sync::Arc;

use serde_json::json;

use crate::validation::{Flow, Sandboxed, ValidationContext};
use crate::value::Value;

use super::scalar::meta;
use super::traits::SchemaLike;

type Branch<T> = Arc<dyn SchemaLike<Output = T>>;

fn collect<T>(schemas: Vec<Box<dyn SchemaLike<Output = T>>>) -> Vec<Branch<T>> {
    schemas.into_iter().map(Branch::from).collect()
}

/// Picks the failed attempt with the fewest issues, first one on ties.
fn closest<T>(failures: Vec<Sandboxed<T>>) -> Option<Sandboxed<T>> {
    let mut best: Option<Sandboxed<T>> = None;
    for attempt in failures {
        match &best {
            Some(current) if current.issue_count() <= attempt.issue_count() => {}
            _ => best = Some(attempt),
        }
    }
    best
}

/// Succeeds with the output of the first branch that matches.
pub struct AnyOf<T> {
    branches: Vec<Branch<T>>,
}

impl<T> Clone for AnyOf<T> {
    fn clone(&self) -> Self {
        Self {
            branches: self.branches.clone(),
        }
    }
}

impl<T> AnyOf<T> {
    pub fn new(schemas: Vec<Box<dyn SchemaLike<Output = T>>>) -> Self {
        Self {
            branches: collect(schemas),
        }
    }

    /// Appends a branch.
    pub fn or<S>(mut self, schema: S) -> Self
    where
        S: SchemaLike<Output = T> + 'static,
    {
        self.branches.push(Arc::new(schema));
        self
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl<T: Default> SchemaLike for AnyOf<T> {
    type Output = T;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        let mut failures = Vec::with_capacity(self.branches.len());
        for (index, branch) in self.branches.iter().enumerate() {
            let attempt = ctx.sandbox(|ctx| branch.check(value, ctx));
            tracing::trace!(
                branch = index,
                passed = attempt.passed,
                issues = attempt.issue_count(),
                "any_of branch evaluated"
            );
            if attempt.passed {
                return (attempt.output, Flow::Continue);
            }
            failures.push(attempt);
        }

        match closest(failures) {
            Some(best) => {
                let flow = ctx.commit(best);
                (T::default(), flow)
            }
            None => {
                let flow = ctx.add_issue("combinator.anyof", "no schema to match against");
                (T::default(), flow)
            }
        }
    }
}

/// Succeeds when exactly one branch matches.
pub struct OneOf<T> {
    branches: Vec<Branch<T>>,
}

impl<T> Clone for OneOf<T> {
    fn clone(&self) -> Self {
        Self {
            branches: self.branches.clone(),
        }
    }
}

impl<T> OneOf<T> {
    pub fn new(schemas: Vec<Box<dyn SchemaLike<Output = T>>>) -> Self {
        Self {
            branches: collect(schemas),
        }
    }

    /// Appends a branch.
    pub fn or<S>(mut self, schema: S) -> Self
    where
        S: SchemaLike<Output = T> + 'static,
    {
        self.branches.push(Arc::new(schema));
        self
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl<T: Default> SchemaLike for OneOf<T> {
    type Output = T;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        let mut matched = Vec::new();
        let mut failures = Vec::new();
        for (index, branch) in self.branches.iter().enumerate() {
            let attempt = ctx.sandbox(|ctx| branch.check(value, ctx));
            tracing::trace!(
                branch = index,
                passed = attempt.passed,
                issues = attempt.issue_count(),
                "one_of branch evaluated"
            );
            if attempt.passed {
                matched.push(attempt.output);
            } else {
                failures.push(attempt);
            }
        }

        if matched.len() == 1 {
            if let Some(output) = matched.pop() {
                return (output, Flow::Continue);
            }
        }
        match matched.len() {
            0 => match closest(failures) {
                Some(best) => {
                    let flow = ctx.commit(best);
                    (T::default(), flow)
                }
                None => {
                    let flow = ctx.add_issue_with(
                        "combinator.oneof",
                        "no schema to match against",
                        meta([("matches", json!(0))]),
                    );
                    (T::default(), flow)
                }
            },
            count => {
                let flow = ctx.add_issue_with(
                    "combinator.oneof",
                    format!("matches {} schemas, expected exactly one", count),
                    meta([("matches", json!(count))]),
                );
                (T::default(), flow)
            }
        }
    }
}
