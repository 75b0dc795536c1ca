//! Typed links between object schema fields and struct members.

use std::fmt;

/// Binds an external field name to a member of `T` holding an `F`.
///
/// A binding carries the name the field has in input data and a setter
/// that writes a validated value into the member. Build bindings with the
/// [`bind!`](crate::bind) macro so the member is checked by the compiler:
///
/// ```rust
/// use sluice::{bind, FieldBinding};
///
/// #[derive(Default)]
/// struct User {
///     email: String,
///     display_name: String,
/// }
///
/// let email: FieldBinding<User, String> = bind!(User, email);
/// let display: FieldBinding<User, String> = bind!(User, display_name as "displayName");
///
/// assert_eq!(email.name(), "email");
/// assert_eq!(display.name(), "displayName");
/// ```
pub struct FieldBinding<T, F> {
    name: String,
    set: fn(&mut T, F),
}

impl<T, F> FieldBinding<T, F> {
    pub fn new(name: impl Into<String>, set: fn(&mut T, F)) -> Self {
        Self {
            name: name.into(),
            set,
        }
    }

    /// The field's name in input data.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, fn(&mut T, F)) {
        (self.name, self.set)
    }
}

impl<T, F> Clone for FieldBinding<T, F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            set: self.set,
        }
    }
}

impl<T, F> fmt::Debug for FieldBinding<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Creates a [`FieldBinding`] for a struct member.
///
/// `bind!(Type, member)` uses the member name as the field name;
/// `bind!(Type, member as "name")` renames it.
#[macro_export]
macro_rules! bind {
    ($ty:ty, $member:ident) => {
        $crate::FieldBinding::new(stringify!($member), |target: &mut $ty, value| {
            target.$member = value
        })
    };
    ($ty:ty, $member:ident as $name:expr) => {
        $crate::FieldBinding::new($name, |target: &mut $ty, value| target.$member = value)
    };
}
