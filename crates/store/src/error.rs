//! Error types for the rule-store capability.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures reported by a rule store.
///
/// The remote system distinguishes exactly one condition the reconciler
/// cares about: the targeted resource does not exist (used for idempotent
/// delete). Everything else is a generic transport failure and is fatal to
/// the invocation that hits it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("rule store transport failure: {reason}")]
    Transport { reason: String },
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Whether this is the distinguished "resource already gone" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
