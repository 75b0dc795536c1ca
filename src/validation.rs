//! Per-call validation state.
//!
//! A [`ValidationContext`] is created once per top-level validation and
//! threaded by `&mut` through every nested schema. It owns the current
//! [`JsonPath`] and the issue accumulator, borrows the [`Options`] and the
//! root [`Value`] (so cross-field conditions can query siblings), and carries
//! an optional [`SchemaRegistry`] handle plus the reference depth used by
//! [`RefSchema`](crate::RefSchema).

use stillwater::Validation;

use crate::error::{Issue, Meta, ValidationError};
use crate::options::Options;
use crate::path::{JsonPath, PathSegment};
use crate::registry::SchemaRegistry;
use crate::value::Value;

/// Whether validation at the current level may go on.
///
/// Every rule, condition and nested schema returns a `Flow`. A `Stop` must
/// be honoured by the caller: stop visiting siblings and return `Stop` in
/// turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flow {
    #[default]
    Continue,
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }

    pub fn is_continue(self) -> bool {
        self == Flow::Continue
    }

    /// `Stop` if either side is `Stop`.
    pub fn and(self, other: Flow) -> Flow {
        if self.is_stop() || other.is_stop() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}

/// A save point: the path and the number of recorded issues.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: Vec<PathSegment>,
    issues: usize,
}

/// The outcome of a speculative run, see [`ValidationContext::sandbox`].
#[derive(Debug, Clone)]
pub struct Sandboxed<T> {
    /// What the run produced.
    pub output: T,
    /// The flow the run reported.
    pub flow: Flow,
    /// True when the run recorded no issues.
    pub passed: bool,
    issues: Vec<Issue>,
    base: Vec<PathSegment>,
}

impl<T> Sandboxed<T> {
    /// Issues the run recorded, at the paths they were recorded at.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Maps the output, keeping the flow and the issues.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sandboxed<U> {
        Sandboxed {
            output: f(self.output),
            flow: self.flow,
            passed: self.passed,
            issues: self.issues,
            base: self.base,
        }
    }
}

/// Validation state for one top-level call.
///
/// # Example
///
/// ```rust
/// use sluice::{Flow, Options, ValidationContext, Value};
///
/// let root = Value::null();
/// let options = Options::default();
/// let mut ctx = ValidationContext::new(&root, &options);
///
/// ctx.push_field("user");
/// ctx.push_index(0);
/// assert_eq!(ctx.add_issue("custom.bad", "bad value"), Flow::Continue);
/// ctx.pop();
/// ctx.pop();
///
/// let error = ctx.error().unwrap();
/// assert_eq!(error.first().path(), "user[0]");
/// ```
pub struct ValidationContext<'a> {
    options: &'a Options,
    root: &'a Value,
    registry: Option<&'a SchemaRegistry>,
    path: JsonPath,
    issues: Vec<Issue>,
    depth: usize,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context for validating `root`.
    pub fn new(root: &'a Value, options: &'a Options) -> Self {
        Self {
            options,
            root,
            registry: None,
            path: JsonPath::root(),
            issues: Vec::new(),
            depth: 0,
        }
    }

    /// Attaches the registry used to resolve schema references.
    pub fn with_registry(mut self, registry: &'a SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// The value the top-level validation started from.
    pub fn root(&self) -> &'a Value {
        self.root
    }

    pub fn registry(&self) -> Option<&'a SchemaRegistry> {
        self.registry
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    pub fn push_field(&mut self, name: impl Into<String>) {
        self.path.push_field(name);
    }

    pub fn push_index(&mut self, index: usize) {
        self.path.push_index(index);
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.path.push_key(key);
    }

    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// Runs `run` with `segment` pushed onto the path.
    pub fn nested<R>(&mut self, segment: PathSegment, run: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(segment);
        let out = run(self);
        self.path.pop();
        out
    }

    /// Records an issue at the current path.
    pub fn add_issue(&mut self, code: impl Into<String>, message: impl Into<String>) -> Flow {
        let issue = Issue::new(&self.path, code, message);
        self.push_issue(issue)
    }

    /// Records an issue with metadata at the current path.
    pub fn add_issue_with(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        meta: Meta,
    ) -> Flow {
        let issue = Issue::new(&self.path, code, message).with_meta_map(meta);
        self.push_issue(issue)
    }

    /// Appends a prepared issue, honouring `max_issues` and `fail_fast`.
    ///
    /// At the bound the issue is dropped and `Stop` is returned. The
    /// all-empty issue is ignored.
    pub fn push_issue(&mut self, issue: Issue) -> Flow {
        if issue.is_zero() {
            return Flow::Continue;
        }
        let max = self.options.max_issues;
        if max > 0 && self.issues.len() >= max {
            tracing::warn!(
                code = issue.code(),
                path = issue.path(),
                max_issues = max,
                "issue dropped by max_issues cutoff"
            );
            return Flow::Stop;
        }
        self.issues.push(issue);
        if self.options.fail_fast || (max > 0 && self.issues.len() >= max) {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn take_snapshot(&self) -> Snapshot {
        Snapshot {
            path: self.path.snapshot(),
            issues: self.issues.len(),
        }
    }

    pub fn restore_snapshot(&mut self, snapshot: Snapshot) {
        self.path.restore(snapshot.path);
        self.issues.truncate(snapshot.issues);
    }

    /// Runs `run` speculatively.
    ///
    /// After the call the path and the issue list are exactly as before; the
    /// issues the run added are handed back in the [`Sandboxed`] outcome,
    /// where they can be dropped or passed to [`commit`](Self::commit).
    pub fn sandbox<T>(&mut self, run: impl FnOnce(&mut Self) -> (T, Flow)) -> Sandboxed<T> {
        let snapshot = self.take_snapshot();
        let base = snapshot.path.clone();
        let before = snapshot.issues;
        let (output, flow) = run(self);
        let issues = self.issues.split_off(before.min(self.issues.len()));
        self.restore_snapshot(snapshot);
        tracing::trace!(
            path = %self.path,
            issues = issues.len(),
            stopped = flow.is_stop(),
            "sandboxed run finished"
        );
        Sandboxed {
            output,
            flow,
            passed: issues.is_empty(),
            issues,
            base,
        }
    }

    /// Re-adds the issues of a sandboxed run under the current path.
    ///
    /// The part of each issue path below the sandbox's starting path is
    /// placed under the current path; accumulation is bounded as usual.
    pub fn commit<T>(&mut self, sandboxed: Sandboxed<T>) -> Flow {
        let prefix = self.path.snapshot();
        for issue in sandboxed.issues {
            if self.push_issue(issue.rebase(&sandboxed.base, &prefix)).is_stop() {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Reference nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Runs `run` one reference level deeper. Returns `None` without running
    /// it when `Options::max_depth` would be exceeded.
    pub fn descend<R>(&mut self, run: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.depth >= self.options.max_depth {
            return None;
        }
        self.depth += 1;
        let out = run(self);
        self.depth -= 1;
        Some(out)
    }

    /// The aggregate error, or `None` when nothing was recorded.
    pub fn error(&self) -> Option<ValidationError> {
        ValidationError::from_issues(self.issues.clone())
            .map(|e| e.with_formatter(self.options.formatter.clone()))
    }

    /// Consumes the context into the final result for `output`.
    pub fn finish<T>(self, output: T) -> Validation<T, ValidationError> {
        let formatter = self.options.formatter.clone();
        match ValidationError::from_issues(self.issues) {
            None => Validation::Success(output),
            Some(error) => Validation::Failure(error.with_formatter(formatter)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(root: &'a Value, options: &'a Options) -> ValidationContext<'a> {
        ValidationContext::new(root, options)
    }

    #[test]
    fn test_unbounded_accumulation() {
        let root = Value::null();
        let options = Options::default();
        let mut c = ctx(&root, &options);
        for _ in 0..5 {
            assert_eq!(c.add_issue("c", "m"), Flow::Continue);
        }
        assert_eq!(c.issue_count(), 5);
    }

    #[test]
    fn test_max_issues_stops_and_drops() {
        let root = Value::null();
        let options = Options::default().max_issues(2);
        let mut c = ctx(&root, &options);
        assert_eq!(c.add_issue("a", "m"), Flow::Continue);
        assert_eq!(c.add_issue("b", "m"), Flow::Stop);
        assert_eq!(c.add_issue("c", "m"), Flow::Stop);
        let codes: Vec<_> = c.issues().iter().map(|i| i.code()).collect();
        assert_eq!(codes, vec!["a", "b"]);
    }

    #[test]
    fn test_fail_fast_stops_after_append() {
        let root = Value::null();
        let options = Options::default().fail_fast(true);
        let mut c = ctx(&root, &options);
        assert_eq!(c.add_issue("a", "m"), Flow::Stop);
        assert_eq!(c.issue_count(), 1);
    }

    #[test]
    fn test_zero_issue_is_ignored() {
        let root = Value::null();
        let options = Options::default().fail_fast(true);
        let mut c = ctx(&root, &options);
        assert_eq!(c.add_issue("", ""), Flow::Continue);
        assert!(c.error().is_none());
    }

    #[test]
    fn test_sandbox_leaves_outer_state_untouched() {
        let root = Value::null();
        let options = Options::default();
        let mut c = ctx(&root, &options);
        c.push_field("outer");
        c.add_issue("pre", "m");

        let result = c.sandbox(|c| {
            c.push_field("inner");
            c.add_issue("one", "m");
            c.push_index(3);
            c.add_issue("two", "m");
            ((), Flow::Continue)
        });

        assert_eq!(c.path().to_string(), "outer");
        assert_eq!(c.issue_count(), 1);
        assert!(!result.passed);
        assert_eq!(result.issue_count(), 2);
    }

    #[test]
    fn test_commit_rebases_onto_current_path() {
        let root = Value::null();
        let options = Options::default();
        let mut c = ctx(&root, &options);
        c.push_field("scratch");
        let result = c.sandbox(|c| {
            c.push_field("inner");
            c.add_issue("one", "m");
            c.push_index(1);
            c.add_issue("two", "m");
            ((), Flow::Continue)
        });
        c.pop();
        c.push_key("real key");

        assert_eq!(c.commit(result), Flow::Continue);
        let paths: Vec<_> = c.issues().iter().map(|i| i.path().to_string()).collect();
        assert_eq!(paths, vec![r#"["real key"].inner"#, r#"["real key"].inner[1]"#]);
    }

    #[test]
    fn test_commit_respects_bound() {
        let root = Value::null();
        let options = Options::default().max_issues(1);
        let mut c = ctx(&root, &options);
        let result = c.sandbox(|c| {
            c.add_issue("one", "m");
            ((), Flow::Continue)
        });
        c.add_issue("outer", "m");
        assert_eq!(c.commit(result), Flow::Stop);
        assert_eq!(c.issue_count(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let root = Value::null();
        let options = Options::default();
        let mut c = ctx(&root, &options);
        c.push_field("a");
        let snap = c.take_snapshot();
        c.push_index(0);
        c.add_issue("x", "m");
        c.restore_snapshot(snap);
        assert_eq!(c.path().to_string(), "a");
        assert_eq!(c.issue_count(), 0);
    }

    #[test]
    fn test_descend_is_bounded() {
        let root = Value::null();
        let options = Options::default().max_depth(1);
        let mut c = ctx(&root, &options);
        let inner = c.descend(|c| c.descend(|_| ()));
        assert_eq!(inner, Some(None));
        assert_eq!(c.depth(), 0);
    }

    #[test]
    fn test_error_uses_formatter() {
        let root = Value::null();
        let options = Options::default().formatter(|issues| format!("{} issue(s)", issues.len()));
        let mut c = ctx(&root, &options);
        c.add_issue("a", "m");
        assert_eq!(c.error().unwrap().to_string(), "1 issue(s)");
    }

    #[test]
    fn test_finish() {
        let root = Value::null();
        let options = Options::default();
        let c = ctx(&root, &options);
        assert!(c.finish(7).is_success());
    }
}
