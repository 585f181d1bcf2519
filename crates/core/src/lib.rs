//! Shared primitives for the rampart workspace.
//!
//! The declarative input format delivers every scalar as text, so the one
//! real job of this crate is [`normalize::normalize_properties`]: coercing
//! string leaves back into their semantic types before any diffing or
//! comparison happens. The [`error`] module carries the taxonomy used by
//! the invocation wrapper (request parsing, schema gate, dispatch).

pub mod error;
pub mod normalize;

pub use error::{Error, Result};
pub use normalize::normalize_properties;
