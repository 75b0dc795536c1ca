//! Per-call validation options.
//!
//! [`Options`] is immutable while a validation runs. It is assembled with
//! chained builder methods over the documented defaults, or loaded from a
//! JSON configuration document with [`Options::from_json_config`].

use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::error::{ConfigError, ErrorFormatter};

/// Date layouts tried in order when none are configured. `%+` is RFC 3339.
pub const DEFAULT_DATE_LAYOUTS: &[&str] = &[
    "%+",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
];

/// Validation options.
///
/// Defaults: fail-fast off, unbounded issues, defaults applied on null,
/// coercion off, all omit flags off, UTC, [`DEFAULT_DATE_LAYOUTS`], and a
/// reference depth limit of 64.
///
/// # Example
///
/// ```rust
/// use sluice::Options;
///
/// let options = Options::default()
///     .fail_fast(true)
///     .coerce(true)
///     .coerce_trim_space(true);
/// ```
#[derive(Clone)]
pub struct Options {
    pub(crate) fail_fast: bool,
    pub(crate) max_issues: usize,
    pub(crate) default_on_null: bool,
    pub(crate) coerce: bool,
    pub(crate) coerce_trim_space: bool,
    pub(crate) coerce_number_underscore: bool,
    pub(crate) coerce_date_unix_seconds: bool,
    pub(crate) coerce_date_unix_millis: bool,
    pub(crate) coerce_duration_seconds: bool,
    pub(crate) coerce_duration_millis: bool,
    pub(crate) omit_empty: bool,
    pub(crate) omit_zero: bool,
    pub(crate) omit_nil: bool,
    pub(crate) formatter: Option<ErrorFormatter>,
    pub(crate) time_zone: FixedOffset,
    pub(crate) date_layouts: Vec<String>,
    pub(crate) max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_issues: 0,
            default_on_null: true,
            coerce: false,
            coerce_trim_space: false,
            coerce_number_underscore: false,
            coerce_date_unix_seconds: false,
            coerce_date_unix_millis: false,
            coerce_duration_seconds: false,
            coerce_duration_millis: false,
            omit_empty: false,
            omit_zero: false,
            omit_nil: false,
            formatter: None,
            time_zone: Utc.fix(),
            date_layouts: DEFAULT_DATE_LAYOUTS.iter().map(|s| s.to_string()).collect(),
            max_depth: 64,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("fail_fast", &self.fail_fast)
            .field("max_issues", &self.max_issues)
            .field("default_on_null", &self.default_on_null)
            .field("coerce", &self.coerce)
            .field("time_zone", &self.time_zone)
            .field("date_layouts", &self.date_layouts)
            .field("formatter", &self.formatter.is_some())
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Stop at the first issue.
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Stop once `max` issues were recorded. Zero means unbounded.
    pub fn max_issues(mut self, max: usize) -> Self {
        self.max_issues = max;
        self
    }

    /// Whether an explicit null is replaced by a schema default.
    pub fn default_on_null(mut self, enabled: bool) -> Self {
        self.default_on_null = enabled;
        self
    }

    /// Enables type coercion for scalar schemas.
    pub fn coerce(mut self, enabled: bool) -> Self {
        self.coerce = enabled;
        self
    }

    /// Trim whitespace from numeric strings before coercing them.
    pub fn coerce_trim_space(mut self, enabled: bool) -> Self {
        self.coerce_trim_space = enabled;
        self
    }

    /// Accept `_` digit separators in numeric strings (`1_000`).
    pub fn coerce_number_underscore(mut self, enabled: bool) -> Self {
        self.coerce_number_underscore = enabled;
        self
    }

    /// Treat numeric dates as unix seconds.
    pub fn coerce_date_unix_seconds(mut self, enabled: bool) -> Self {
        self.coerce_date_unix_seconds = enabled;
        self
    }

    /// Treat numeric dates as unix milliseconds.
    pub fn coerce_date_unix_millis(mut self, enabled: bool) -> Self {
        self.coerce_date_unix_millis = enabled;
        self
    }

    /// Treat numeric durations as seconds.
    pub fn coerce_duration_seconds(mut self, enabled: bool) -> Self {
        self.coerce_duration_seconds = enabled;
        self
    }

    /// Treat numeric durations as milliseconds.
    pub fn coerce_duration_millis(mut self, enabled: bool) -> Self {
        self.coerce_duration_millis = enabled;
        self
    }

    /// Skip nil-like, zero-length and zero-valued fields when projecting
    /// native values.
    pub fn omit_empty(mut self, enabled: bool) -> Self {
        self.omit_empty = enabled;
        self
    }

    /// Skip zero-valued fields when projecting native values.
    pub fn omit_zero(mut self, enabled: bool) -> Self {
        self.omit_zero = enabled;
        self
    }

    /// Skip nil-like fields when projecting native values.
    pub fn omit_nil(mut self, enabled: bool) -> Self {
        self.omit_nil = enabled;
        self
    }

    /// Custom renderer for [`ValidationError`](crate::ValidationError)'s
    /// `Display`.
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&[crate::Issue]) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(std::sync::Arc::new(formatter));
        self
    }

    /// Time zone for date layouts that carry no offset.
    pub fn time_zone(mut self, tz: FixedOffset) -> Self {
        self.time_zone = tz;
        self
    }

    /// Replaces the ordered list of date layouts (chrono format strings).
    pub fn date_layouts<I, S>(mut self, layouts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_layouts = layouts.into_iter().map(Into::into).collect();
        self
    }

    /// Maximum nesting of registry references.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn is_coerce(&self) -> bool {
        self.coerce
    }

    pub fn tz(&self) -> FixedOffset {
        self.time_zone
    }

    pub fn layouts(&self) -> &[String] {
        &self.date_layouts
    }

    /// Loads options from a JSON document. Absent keys keep their default.
    ///
    /// ```rust
    /// use sluice::Options;
    ///
    /// let options = Options::from_json_config(r#"{
    ///     "fail_fast": true,
    ///     "coerce": true,
    ///     "time_zone_offset_seconds": 3600,
    ///     "date_layouts": ["%d/%m/%Y"]
    /// }"#).unwrap();
    /// assert!(options.is_fail_fast());
    /// assert_eq!(options.layouts(), ["%d/%m/%Y"]);
    /// ```
    pub fn from_json_config(document: &str) -> Result<Self, ConfigError> {
        let config: OptionsConfig = serde_json::from_str(document)?;
        let options = config.apply(Options::default())?;
        tracing::debug!(?options, "loaded validation options");
        Ok(options)
    }
}

/// Serializable subset of [`Options`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OptionsConfig {
    fail_fast: Option<bool>,
    max_issues: Option<usize>,
    default_on_null: Option<bool>,
    coerce: Option<bool>,
    coerce_trim_space: Option<bool>,
    coerce_number_underscore: Option<bool>,
    coerce_date_unix_seconds: Option<bool>,
    coerce_date_unix_millis: Option<bool>,
    coerce_duration_seconds: Option<bool>,
    coerce_duration_millis: Option<bool>,
    omit_empty: Option<bool>,
    omit_zero: Option<bool>,
    omit_nil: Option<bool>,
    time_zone_offset_seconds: Option<i32>,
    date_layouts: Option<Vec<String>>,
    max_depth: Option<usize>,
}

impl OptionsConfig {
    fn apply(self, mut options: Options) -> Result<Options, ConfigError> {
        macro_rules! set {
            ($($field:ident),*) => {
                $(
                    if let Some(v) = self.$field {
                        options.$field = v;
                    }
                )*
            };
        }
        set!(
            fail_fast,
            max_issues,
            default_on_null,
            coerce,
            coerce_trim_space,
            coerce_number_underscore,
            coerce_date_unix_seconds,
            coerce_date_unix_millis,
            coerce_duration_seconds,
            coerce_duration_millis,
            omit_empty,
            omit_zero,
            omit_nil,
            date_layouts,
            max_depth
        );
        if let Some(seconds) = self.time_zone_offset_seconds {
            options.time_zone =
                FixedOffset::east_opt(seconds).ok_or(ConfigError::TimeZone(seconds))?;
        }
        Ok(options)
    }
}
