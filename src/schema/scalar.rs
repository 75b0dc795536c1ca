//! The state machine shared by every scalar schema.

use std::sync::Arc;

use serde_json::json;

use crate::coerce::CoerceError;
use crate::defaults::DefaultProvider;
use crate::error::Meta;
use crate::options::Options;
use crate::rule::{Rule, Stage, Stages};
use crate::validation::{Flow, ValidationContext};
use crate::value::Value;

/// Presence handling, conversion and staged rules for one scalar type.
///
/// 1. an eligible default is returned as is;
/// 2. missing or null yields `<prefix>.required` when required, else the
///    zero value;
/// 3. conversion failures yield `<prefix>.type` or `<prefix>.invalid`;
/// 4. the rule stages run on the converted value.
pub(crate) struct ScalarCore<T> {
    prefix: &'static str,
    expected: &'static str,
    zero: T,
    required: bool,
    default: DefaultProvider<T>,
    stages: Stages<T>,
    type_message: Option<String>,
    last: Option<Constraint<T>>,
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// The most recent constraint, kept so its message can be replaced.
struct Constraint<T> {
    stage: Stage,
    key: String,
    meta: Meta,
    holds: Predicate<T>,
}

impl<T> Clone for Constraint<T> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage,
            key: self.key.clone(),
            meta: self.meta.clone(),
            holds: Arc::clone(&self.holds),
        }
    }
}

impl<T: Clone> Clone for ScalarCore<T> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix,
            expected: self.expected,
            zero: self.zero.clone(),
            required: self.required,
            default: self.default.clone(),
            stages: self.stages.clone(),
            type_message: self.type_message.clone(),
            last: self.last.clone(),
        }
    }
}

impl<T: Clone> ScalarCore<T> {
    pub(crate) fn new(prefix: &'static str, expected: &'static str, zero: T) -> Self {
        Self {
            prefix,
            expected,
            zero,
            required: false,
            default: DefaultProvider::Unset,
            stages: Stages::default(),
            type_message: None,
            last: None,
        }
    }

    pub(crate) fn code(&self, suffix: &str) -> String {
        format!("{}.{}", self.prefix, suffix)
    }

    pub(crate) fn set_required(&mut self) {
        self.required = true;
    }

    pub(crate) fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn set_default(&mut self, provider: DefaultProvider<T>) {
        self.default = provider;
    }

    pub(crate) fn put(&mut self, stage: Stage, rule: Rule<T>) {
        self.stages.put(stage, rule);
    }

    /// Adds a keyed constraint whose code is `<prefix>.<key>`.
    pub(crate) fn constrain<P>(
        &mut self,
        stage: Stage,
        key: &str,
        message: impl Into<String>,
        meta: Meta,
        holds: P,
    ) where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        T: 'static,
    {
        let constraint = Constraint {
            stage,
            key: key.to_string(),
            meta,
            holds: Arc::new(holds),
        };
        self.install(&constraint, message.into());
        self.last = Some(constraint);
    }

    fn install(&mut self, constraint: &Constraint<T>, message: String)
    where
        T: 'static,
    {
        let code = self.code(&constraint.key);
        let holds = Arc::clone(&constraint.holds);
        self.stages.put(
            constraint.stage,
            Rule::constraint(
                constraint.key.as_str(),
                code,
                message,
                constraint.meta.clone(),
                move |v: &T| holds(v),
            ),
        );
    }

    /// Replaces the message of the most recent constraint, or the type
    /// mismatch message when no constraint was added yet.
    pub(crate) fn set_message(&mut self, message: String)
    where
        T: 'static,
    {
        match self.last.clone() {
            Some(constraint) => self.install(&constraint, message),
            None => self.type_message = Some(message),
        }
    }

    pub(crate) fn run<C>(&self, value: &Value, ctx: &mut ValidationContext<'_>, convert: C) -> (T, Flow)
    where
        C: FnOnce(&Value, &Options) -> Result<T, CoerceError>,
    {
        if let Some(default) = self.default.apply(value.presence(), ctx.options()) {
            return (default, Flow::Continue);
        }
        if !value.is_present() {
            if self.required {
                let flow = ctx.add_issue(self.code("required"), "value is required");
                return (self.zero.clone(), flow);
            }
            return (self.zero.clone(), Flow::Continue);
        }
        match convert(value, ctx.options()) {
            Ok(converted) => self.stages.apply(converted, ctx),
            Err(CoerceError::Type) => {
                let message = self.type_message.clone().unwrap_or_else(|| {
                    format!("expected {}, got {}", self.expected, value.kind_name())
                });
                let flow = ctx.add_issue_with(
                    self.code("type"),
                    message,
                    meta([("expected", json!(self.expected)), ("actual", json!(value.kind_name()))]),
                );
                (self.zero.clone(), flow)
            }
            Err(CoerceError::Invalid) => {
                let flow = ctx.add_issue_with(
                    self.code("invalid"),
                    format!("invalid {}", self.expected),
                    meta([("value", value.to_json())]),
                );
                (self.zero.clone(), flow)
            }
        }
    }
}

/// Builds issue metadata from pairs.
pub(crate) fn meta<const N: usize>(entries: [(&str, serde_json::Value); N]) -> Meta {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
