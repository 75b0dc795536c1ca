//! Error types.
//!
//! Validation failures are data: [`Issue`]s accumulated into a
//! [`ValidationError`]. Schema-authoring defects and input decoding problems
//! are ordinary Rust errors ([`BuildError`], [`DecodeError`],
//! [`ConfigError`]) and are never mixed into the issue list.

mod issue;
mod usage;

pub use issue::{ErrorFormatter, Issue, Meta, ValidationError};
pub use usage::{BuildError, ConfigError, DecodeError};
