//! Rule composition.
//!
//! A [`Rule`] is a function `(value, context) -> (value, flow)` with an
//! optional dedup key. A [`RuleSet`] keeps keyed rules in first-insertion
//! order (re-putting a key replaces the behaviour, not the position) and
//! runs unkeyed rules afterwards. [`Stages`] groups the rule sets of a
//! scalar schema in the order they always run.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Meta;
use crate::validation::{Flow, ValidationContext};

type RuleFn<T> = Arc<dyn Fn(T, &mut ValidationContext<'_>) -> (T, Flow) + Send + Sync>;

/// A composable check or transform.
///
/// # Example
///
/// ```rust
/// use sluice::{Flow, Options, Rule, RuleSet, ValidationContext, Value};
///
/// let mut rules: RuleSet<i64> = RuleSet::new();
/// rules.put(Rule::keyed("double", |n, _ctx| (n * 2, Flow::Continue)));
/// rules.put(Rule::check(|n: &i64, ctx| {
///     if *n > 10 { ctx.add_issue("custom.too_big", "too big") } else { Flow::Continue }
/// }));
///
/// let root = Value::null();
/// let options = Options::default();
/// let mut ctx = ValidationContext::new(&root, &options);
/// assert_eq!(rules.apply_all(4, &mut ctx), (8, Flow::Continue));
/// ```
pub struct Rule<T> {
    key: Option<String>,
    run: RuleFn<T>,
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("key", &self.key).finish_non_exhaustive()
    }
}

impl<T> Rule<T> {
    /// An unkeyed rule that may transform the value.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(T, &mut ValidationContext<'_>) -> (T, Flow) + Send + Sync + 'static,
    {
        Self {
            key: None,
            run: Arc::new(run),
        }
    }

    /// A keyed rule that may transform the value.
    pub fn keyed<F>(key: impl Into<String>, run: F) -> Self
    where
        F: Fn(T, &mut ValidationContext<'_>) -> (T, Flow) + Send + Sync + 'static,
    {
        Self {
            key: Some(key.into()),
            run: Arc::new(run),
        }
    }

    /// An unkeyed check that only reports a flow.
    pub fn check<F>(check: F) -> Self
    where
        F: Fn(&T, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        Self::new(move |value, ctx| {
            let flow = check(&value, ctx);
            (value, flow)
        })
    }

    /// A keyed check that only reports a flow.
    pub fn keyed_check<F>(key: impl Into<String>, check: F) -> Self
    where
        F: Fn(&T, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        Self::keyed(key, move |value, ctx| {
            let flow = check(&value, ctx);
            (value, flow)
        })
    }

    /// A keyed check recording `code` with `meta` whenever `holds` is false.
    pub(crate) fn constraint<P>(
        key: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        meta: Meta,
        holds: P,
    ) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let code = code.into();
        let message = message.into();
        Self::keyed_check(key, move |value, ctx| {
            if holds(value) {
                Flow::Continue
            } else {
                ctx.add_issue_with(code.clone(), message.clone(), meta.clone())
            }
        })
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn apply(&self, value: T, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        (self.run)(value, ctx)
    }
}

/// Ordered keyed rules followed by unkeyed rules.
pub struct RuleSet<T> {
    keyed: IndexMap<String, RuleFn<T>>,
    unkeyed: Vec<RuleFn<T>>,
}

impl<T> Default for RuleSet<T> {
    fn default() -> Self {
        Self {
            keyed: IndexMap::new(),
            unkeyed: Vec::new(),
        }
    }
}

impl<T> Clone for RuleSet<T> {
    fn clone(&self) -> Self {
        Self {
            keyed: self.keyed.clone(),
            unkeyed: self.unkeyed.clone(),
        }
    }
}

impl<T> fmt::Debug for RuleSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("keyed", &self.keyed.keys().collect::<Vec<_>>())
            .field("unkeyed", &self.unkeyed.len())
            .finish()
    }
}

impl<T> RuleSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. A keyed rule replaces an earlier rule with the same key
    /// in place.
    pub fn put(&mut self, rule: Rule<T>) {
        match rule.key {
            Some(key) => {
                self.keyed.insert(key, rule.run);
            }
            None => self.unkeyed.push(rule.run),
        }
    }

    pub fn len(&self) -> usize {
        self.keyed.len() + self.unkeyed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyed.is_empty() && self.unkeyed.is_empty()
    }

    /// Keys of the keyed rules in execution order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keyed.keys().map(String::as_str)
    }

    /// Runs keyed rules, then unkeyed rules, until one reports `Stop`.
    pub fn apply_all(&self, mut value: T, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        for run in self.keyed.values().chain(self.unkeyed.iter()) {
            let (next, flow) = run(value, ctx);
            value = next;
            if flow.is_stop() {
                return (value, Flow::Stop);
            }
        }
        (value, Flow::Continue)
    }
}

/// The rule phase a scalar rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Normalizing transforms such as `trim`.
    Transform,
    /// Membership rules such as `one_of`.
    ValueSet,
    /// `min`/`max` style bounds.
    Bounds,
    /// `eq`/`ne`/`gt`/`gte`/`lt`/`lte`.
    Relational,
    /// Shape checks such as `pattern`.
    Format,
    /// Caller supplied rules.
    Custom,
}

/// The rule sets of a scalar schema, run stage by stage.
pub struct Stages<T> {
    transform: RuleSet<T>,
    value_set: RuleSet<T>,
    bounds: RuleSet<T>,
    relational: RuleSet<T>,
    format: RuleSet<T>,
    custom: RuleSet<T>,
}

impl<T> Default for Stages<T> {
    fn default() -> Self {
        Self {
            transform: RuleSet::new(),
            value_set: RuleSet::new(),
            bounds: RuleSet::new(),
            relational: RuleSet::new(),
            format: RuleSet::new(),
            custom: RuleSet::new(),
        }
    }
}

impl<T> Clone for Stages<T> {
    fn clone(&self) -> Self {
        Self {
            transform: self.transform.clone(),
            value_set: self.value_set.clone(),
            bounds: self.bounds.clone(),
            relational: self.relational.clone(),
            format: self.format.clone(),
            custom: self.custom.clone(),
        }
    }
}

impl<T> Stages<T> {
    pub fn put(&mut self, stage: Stage, rule: Rule<T>) {
        self.set_mut(stage).put(rule);
    }

    fn set_mut(&mut self, stage: Stage) -> &mut RuleSet<T> {
        match stage {
            Stage::Transform => &mut self.transform,
            Stage::ValueSet => &mut self.value_set,
            Stage::Bounds => &mut self.bounds,
            Stage::Relational => &mut self.relational,
            Stage::Format => &mut self.format,
            Stage::Custom => &mut self.custom,
        }
    }

    pub fn apply(&self, mut value: T, ctx: &mut ValidationContext<'_>) -> (T, Flow) {
        for set in [
            &self.transform,
            &self.value_set,
            &self.bounds,
            &self.relational,
            &self.format,
            &self.custom,
        ] {
            let (next, flow) = set.apply_all(value, ctx);
            value = next;
            if flow.is_stop() {
                return (value, Flow::Stop);
            }
        }
        (value, Flow::Continue)
    }
}
