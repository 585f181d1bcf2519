//! Error types for the reconciler crate.

use std::fmt;

use rampart_store::{ChangeStatus, StoreError};

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A property bag could not be interpreted as a rule state.
    InvalidProperties { reason: String },
    /// A predicate is missing required fields.
    IncompletePredicate {
        data_id: Option<String>,
        missing: Vec<&'static str>,
    },
    /// The lifecycle action requires the previous resource state.
    MissingPrevious { action: &'static str },
    /// The lifecycle action requires an existing rule id.
    MissingRuleId { action: &'static str },
    /// The rule store reported a failure.
    Store(StoreError),
    /// Settlement polling exhausted its retry budget.
    SettlementTimeout {
        last_status: ChangeStatus,
        retries: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProperties { reason } => {
                write!(f, "invalid rule properties: {reason}")
            }
            Self::IncompletePredicate { data_id, missing } => match data_id {
                Some(id) => write!(
                    f,
                    "predicate '{id}' is missing required fields: {}",
                    missing.join(", ")
                ),
                None => write!(
                    f,
                    "predicate is missing required fields: {}",
                    missing.join(", ")
                ),
            },
            Self::MissingPrevious { action } => {
                write!(f, "{action} requires the previous resource state")
            }
            Self::MissingRuleId { action } => {
                write!(f, "{action} requires an existing rule id")
            }
            Self::Store(err) => {
                write!(f, "{err}")
            }
            Self::SettlementTimeout {
                last_status,
                retries,
            } => {
                write!(
                    f,
                    "change did not settle after {retries} retries (last status {last_status})"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl Error {
    /// Create an invalid-properties error.
    pub fn invalid_properties(reason: impl Into<String>) -> Self {
        Self::InvalidProperties {
            reason: reason.into(),
        }
    }

    /// Create an incomplete-predicate error naming the missing fields.
    pub fn incomplete_predicate(data_id: Option<String>, missing: Vec<&'static str>) -> Self {
        Self::IncompletePredicate { data_id, missing }
    }

    /// Create a missing-previous-state error.
    pub fn missing_previous(action: &'static str) -> Self {
        Self::MissingPrevious { action }
    }

    /// Create a missing-rule-id error.
    pub fn missing_rule_id(action: &'static str) -> Self {
        Self::MissingRuleId { action }
    }

    /// Create a settlement timeout error.
    pub fn settlement_timeout(last_status: ChangeStatus, retries: u32) -> Self {
        Self::SettlementTimeout {
            last_status,
            retries,
        }
    }
}
