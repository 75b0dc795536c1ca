//! Default values applied in place of validation.

use std::fmt;
use std::sync::Arc;

use crate::options::Options;
use crate::value::Presence;

/// Where a schema's default value comes from.
pub enum DefaultProvider<T> {
    Unset,
    Fixed(T),
    Factory(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T> Default for DefaultProvider<T> {
    fn default() -> Self {
        DefaultProvider::Unset
    }
}

impl<T: Clone> Clone for DefaultProvider<T> {
    fn clone(&self) -> Self {
        match self {
            DefaultProvider::Unset => DefaultProvider::Unset,
            DefaultProvider::Fixed(v) => DefaultProvider::Fixed(v.clone()),
            DefaultProvider::Factory(f) => DefaultProvider::Factory(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultProvider::Unset => f.write_str("Unset"),
            DefaultProvider::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            DefaultProvider::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl<T> DefaultProvider<T> {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        DefaultProvider::Factory(Arc::new(f))
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, DefaultProvider::Unset)
    }

    /// A set default is used for a missing value always, and for a null one
    /// only when `default_on_null` is enabled.
    pub fn eligible(&self, presence: Presence, options: &Options) -> bool {
        self.is_set()
            && match presence {
                Presence::Missing => true,
                Presence::Null => options.default_on_null,
                Presence::Present => false,
            }
    }
}

impl<T: Clone> DefaultProvider<T> {
    /// The default value, when it applies to `presence`.
    pub fn apply(&self, presence: Presence, options: &Options) -> Option<T> {
        if !self.eligible(presence, options) {
            return None;
        }
        match self {
            DefaultProvider::Unset => None,
            DefaultProvider::Fixed(v) => Some(v.clone()),
            DefaultProvider::Factory(f) => Some(f()),
        }
    }
}
