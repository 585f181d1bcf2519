//! Value types crossing the rule-store boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a rule by the remote system on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(String);

impl RuleId {
    /// Wrap a remote-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque handle identifying one in-flight mutation against the remote
/// system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeToken(String);

impl ChangeToken {
    /// Wrap a remote-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChangeToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Settlement status of a submitted change.
///
/// A mutation is durable only once its token reports [`ChangeStatus::Settled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    /// The mutation has been accepted but is not yet durable.
    Pending,
    /// The mutation is visible and durable.
    Settled,
}

impl ChangeStatus {
    /// Whether the change has settled.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Settled)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Match predicate kinds understood by the remote system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    #[serde(rename = "IPMatch")]
    IpMatch,
    ByteMatch,
    SqlInjectionMatch,
    GeoMatch,
    SizeConstraint,
    XssMatch,
    RegexMatch,
}

impl PredicateKind {
    /// Wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IpMatch => "IPMatch",
            Self::ByteMatch => "ByteMatch",
            Self::SqlInjectionMatch => "SqlInjectionMatch",
            Self::GeoMatch => "GeoMatch",
            Self::SizeConstraint => "SizeConstraint",
            Self::XssMatch => "XssMatch",
            Self::RegexMatch => "RegexMatch",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One match condition attached to a rule.
///
/// Identity for diffing purposes is `data_id` alone: two predicates sharing
/// a `data_id` but differing in `negated` or `kind` are the same logical
/// predicate in a changed state, not two distinct predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Predicate {
    pub negated: bool,
    #[serde(rename = "Type")]
    pub kind: PredicateKind,
    pub data_id: String,
}

impl Predicate {
    /// Construct a predicate.
    pub fn new(negated: bool, kind: PredicateKind, data_id: impl Into<String>) -> Self {
        Self {
            negated,
            kind,
            data_id: data_id.into(),
        }
    }
}

/// Direction of one predicate mutation.
///
/// The remote system has no "modify predicate" operation; a changed
/// predicate is expressed as a delete followed by an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateAction {
    Insert,
    Delete,
}

impl fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "INSERT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// One (action, predicate) pair in an ordered operation batch.
///
/// The remote system applies the whole batch atomically under a single
/// change token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleOperation {
    pub action: UpdateAction,
    pub predicate: Predicate,
}

impl RuleOperation {
    /// An insert operation for the given predicate.
    pub fn insert(predicate: Predicate) -> Self {
        Self {
            action: UpdateAction::Insert,
            predicate,
        }
    }

    /// A delete operation for the given predicate.
    pub fn delete(predicate: Predicate) -> Self {
        Self {
            action: UpdateAction::Delete,
            predicate,
        }
    }
}

/// Rate aggregation key.
///
/// The remote system currently understands only source-IP keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateKey {
    #[serde(rename = "IP")]
    Ip,
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip => write!(f, "IP"),
        }
    }
}

/// Rule-level metadata submitted on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleMetadata {
    pub name: String,
    pub metric_name: String,
    pub rate_key: RateKey,
    pub rate_limit: u64,
}
