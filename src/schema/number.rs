//! Numeric schema validation.
//!
//! This module provides [`NumberSchema`], generic over every primitive
//! integer and float type through the [`Numeric`] trait.

use std::fmt::Display;
use std::ops::RangeInclusive;

use num_traits::NumCast;
use serde_json::json;

use crate::coerce;
use crate::defaults::DefaultProvider;
use crate::rule::{Rule, Stage};
use crate::validation::{Flow, ValidationContext};
use crate::value::{ToValue, Value};

use super::scalar::{meta, ScalarCore};
use super::traits::SchemaLike;

/// A primitive numeric type a [`NumberSchema`] can produce.
pub trait Numeric:
    Copy + PartialOrd + Default + Display + ToValue + NumCast + Send + Sync + 'static
{
    /// Name used in type mismatch messages, e.g. `i32`.
    const NAME: &'static str;

    /// Parses decimal text. Integers also accept integral text such as
    /// `"1.0"` or `"1e3"`; out-of-range and fractional values yield `None`.
    fn parse_text(text: &str) -> Option<Self>;
}

macro_rules! integer_numeric {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                const NAME: &'static str = stringify!($t);

                fn parse_text(text: &str) -> Option<Self> {
                    let text = text.trim();
                    text.parse::<$t>().ok().or_else(|| {
                        let f: f64 = text.parse().ok()?;
                        if f.is_finite() && f.fract() == 0.0 {
                            <$t as NumCast>::from(f)
                        } else {
                            None
                        }
                    })
                }
            }
        )*
    };
}

integer_numeric!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_numeric {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                const NAME: &'static str = stringify!($t);

                fn parse_text(text: &str) -> Option<Self> {
                    text.trim().parse::<$t>().ok().filter(|f| f.is_finite())
                }
            }
        )*
    };
}

float_numeric!(f32, f64);

/// Issue metadata for a number, kept exact when it fits JSON.
fn number_json<N: Numeric>(n: N) -> serde_json::Value {
    n.to_string()
        .parse::<serde_json::Number>()
        .map(serde_json::Value::Number)
        .unwrap_or_else(|_| json!(n.to_f64()))
}

/// A schema for validating numbers of type `N`.
///
/// # Example
///
/// ```rust
/// use sluice::{Schema, SchemaLike, Value};
///
/// let schema = Schema::number::<u8>().range(1..=100);
///
/// assert_eq!(schema.validate(&Value::from(42)).into_result().unwrap(), 42u8);
/// assert!(schema.validate(&Value::from(0)).is_failure());
///
/// // Out of range for the target type.
/// let error = schema.validate(&Value::from(300)).into_result().unwrap_err();
/// assert_eq!(error.first().code(), "number.invalid");
/// ```
#[derive(Clone)]
pub struct NumberSchema<N: Numeric> {
    core: ScalarCore<N>,
}

impl<N: Numeric> NumberSchema<N> {
    /// Creates a new number schema with no rules.
    pub fn new() -> Self {
        Self {
            core: ScalarCore::new("number", N::NAME, N::default()),
        }
    }

    /// Reports missing and null values as `number.required`.
    pub fn required(mut self) -> Self {
        self.core.set_required();
        self
    }

    pub fn default_value(mut self, value: N) -> Self {
        self.core.set_default(DefaultProvider::Fixed(value));
        self
    }

    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.core.set_default(DefaultProvider::factory(factory));
        self
    }

    /// The value must be one of `allowed`.
    pub fn one_of(mut self, allowed: impl IntoIterator<Item = N>) -> Self {
        let allowed: Vec<N> = allowed.into_iter().collect();
        let listed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        let values: Vec<serde_json::Value> = allowed.iter().map(|n| number_json(*n)).collect();
        self.core.constrain(
            Stage::ValueSet,
            "one_of",
            format!("must be one of: {}", listed.join(", ")),
            meta([("values", serde_json::Value::Array(values))]),
            move |n: &N| allowed.iter().any(|a| a == n),
        );
        self
    }

    /// Minimum value (inclusive).
    pub fn min(mut self, min: N) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "min",
            format!("must be at least {}", min),
            meta([("min", number_json(min))]),
            move |n: &N| *n >= min,
        );
        self
    }

    /// Maximum value (inclusive).
    pub fn max(mut self, max: N) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "max",
            format!("must be at most {}", max),
            meta([("max", number_json(max))]),
            move |n: &N| *n <= max,
        );
        self
    }

    /// Equivalent to `.min(start).max(end)`.
    pub fn range(self, range: RangeInclusive<N>) -> Self {
        let (start, end) = range.into_inner();
        self.min(start).max(end)
    }

    /// Greater than zero.
    pub fn positive(mut self) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "positive",
            "must be positive",
            meta([]),
            |n: &N| *n > N::default(),
        );
        self
    }

    /// Zero or greater.
    pub fn non_negative(mut self) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "non_negative",
            "must not be negative",
            meta([]),
            |n: &N| *n >= N::default(),
        );
        self
    }

    /// Less than zero.
    pub fn negative(mut self) -> Self {
        self.core.constrain(
            Stage::Bounds,
            "negative",
            "must be negative",
            meta([]),
            |n: &N| *n < N::default(),
        );
        self
    }

    fn relational<P>(mut self, key: &str, describe: &str, other: N, holds: P) -> Self
    where
        P: Fn(&N, &N) -> bool + Send + Sync + 'static,
    {
        self.core.constrain(
            Stage::Relational,
            key,
            format!("must be {} {}", describe, other),
            meta([("value", number_json(other))]),
            move |n: &N| holds(n, &other),
        );
        self
    }

    pub fn eq(self, other: N) -> Self {
        self.relational("eq", "equal to", other, |a, b| a == b)
    }

    pub fn ne(self, other: N) -> Self {
        self.relational("ne", "different from", other, |a, b| a != b)
    }

    pub fn gt(self, other: N) -> Self {
        self.relational("gt", "greater than", other, |a, b| a > b)
    }

    pub fn gte(self, other: N) -> Self {
        self.relational("gte", "greater than or equal to", other, |a, b| a >= b)
    }

    pub fn lt(self, other: N) -> Self {
        self.relational("lt", "less than", other, |a, b| a < b)
    }

    pub fn lte(self, other: N) -> Self {
        self.relational("lte", "less than or equal to", other, |a, b| a <= b)
    }

    /// Adds a custom check, run after every built-in rule.
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&N, &mut ValidationContext<'_>) -> Flow + Send + Sync + 'static,
    {
        self.core.put(Stage::Custom, Rule::check(check));
        self
    }

    /// Adds an arbitrary rule to the custom stage.
    pub fn rule(mut self, rule: Rule<N>) -> Self {
        self.core.put(Stage::Custom, rule);
        self
    }

    /// Sets a custom message for the most recent rule, or the type mismatch
    /// message before any rule is added.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.core.set_message(message.into());
        self
    }
}

impl<N: Numeric> Default for NumberSchema<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Numeric> SchemaLike for NumberSchema<N> {
    type Output = N;

    fn check(&self, value: &Value, ctx: &mut ValidationContext<'_>) -> (N, Flow) {
        self.core.run(value, ctx, |value, options| {
            let text = coerce::number_text(value, options)?;
            N::parse_text(&text).ok_or(coerce::CoerceError::Invalid)
        })
    }

    fn is_required(&self) -> bool {
        self.core.is_required()
    }
}
