//! Core types for the reconciler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rampart_store::{Predicate, PredicateKind, RateKey, RuleId, RuleMetadata};

use crate::error::{Error, Result};

/// Loose input form of one match predicate.
///
/// The declarative format cannot guarantee any field is present, so every
/// field is optional here. [`PredicateSpec::validate`] is the gate that
/// turns a spec into a wire [`Predicate`]; nothing incomplete crosses the
/// store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredicateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, rename = "Type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PredicateKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,
}

impl PredicateSpec {
    /// A fully populated spec.
    pub fn new(negated: bool, kind: PredicateKind, data_id: impl Into<String>) -> Self {
        Self {
            negated: Some(negated),
            kind: Some(kind),
            data_id: Some(data_id.into()),
        }
    }

    /// Names of the required fields this spec is missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.negated.is_none() {
            missing.push("Negated");
        }
        if self.kind.is_none() {
            missing.push("Type");
        }
        if self.data_id.is_none() {
            missing.push("DataId");
        }
        missing
    }

    /// Validate into a wire predicate, failing with the missing field set.
    pub fn validate(&self) -> Result<Predicate> {
        match (self.negated, self.kind, self.data_id.as_ref()) {
            (Some(negated), Some(kind), Some(data_id)) => {
                Ok(Predicate::new(negated, kind, data_id.clone()))
            }
            _ => Err(Error::incomplete_predicate(
                self.data_id.clone(),
                self.missing_fields(),
            )),
        }
    }
}

impl From<Predicate> for PredicateSpec {
    fn from(predicate: Predicate) -> Self {
        Self {
            negated: Some(predicate.negated),
            kind: Some(predicate.kind),
            data_id: Some(predicate.data_id),
        }
    }
}

/// Declarative shape of the resource at a point in time.
///
/// Constructed fresh on every reconciliation invocation from the caller's
/// (already normalized) property bag. Nothing here is persisted by this
/// crate; durable state lives entirely in the remote system, addressed by
/// `rule_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleState {
    pub name: String,
    pub metric_name: String,
    pub rate_key: RateKey,
    pub rate_limit: u64,
    /// Order is insignificant for correctness but preserved for diff
    /// stability.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<PredicateSpec>,
    /// Assigned by the remote system on creation; absent before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<RuleId>,
}

impl RuleState {
    /// Build a rule state from a normalized property bag.
    pub fn from_properties(properties: &Value) -> Result<Self> {
        serde_json::from_value(properties.clone())
            .map_err(|err| Error::invalid_properties(err.to_string()))
    }

    /// Rule-level metadata for a create call.
    pub fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: self.name.clone(),
            metric_name: self.metric_name.clone(),
            rate_key: self.rate_key,
            rate_limit: self.rate_limit,
        }
    }

    /// Validate every predicate in this state into its wire form.
    ///
    /// Used for the previous side of a diff and for delete-path
    /// retraction, where each predicate must be expressible as a DELETE
    /// operation.
    pub fn validated_predicates(&self) -> Result<Vec<Predicate>> {
        self.predicates.iter().map(PredicateSpec::validate).collect()
    }
}

/// Lifecycle actions a reconciliation invocation can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleAction {
    Create,
    Update,
    Delete,
}

impl LifecycleAction {
    /// Lowercase name for messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reconciliation invocation's input.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub action: LifecycleAction,
    pub desired: RuleState,
    /// Required for update and delete, absent for create.
    pub previous: Option<RuleState>,
    /// The remote identifier, required for update and delete.
    pub resource_id: Option<RuleId>,
}

impl ReconcileRequest {
    /// A create invocation.
    pub fn create(desired: RuleState) -> Self {
        Self {
            action: LifecycleAction::Create,
            desired,
            previous: None,
            resource_id: None,
        }
    }

    /// An update invocation.
    pub fn update(desired: RuleState, previous: RuleState, resource_id: RuleId) -> Self {
        Self {
            action: LifecycleAction::Update,
            desired,
            previous: Some(previous),
            resource_id: Some(resource_id),
        }
    }

    /// A delete invocation. The last observed state doubles as the
    /// desired one; only the previous predicates matter for retraction.
    pub fn delete(previous: RuleState, resource_id: RuleId) -> Self {
        Self {
            action: LifecycleAction::Delete,
            desired: previous.clone(),
            previous: Some(previous),
            resource_id: Some(resource_id),
        }
    }
}

/// Terminal status of a reconciliation invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Terminal result of one reconciliation invocation.
///
/// Failures carry exactly one human-readable reason; there is no
/// multi-error aggregation. The rule id is present whenever the remote
/// system has assigned one, including on a create whose follow-up
/// predicate change failed, so a later delete can still clean up.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub status: OutcomeStatus,
    pub rule_id: Option<RuleId>,
    pub reason: String,
}

impl ReconcileOutcome {
    /// A successful terminal outcome.
    pub fn success(reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            rule_id: None,
            reason: reason.into(),
        }
    }

    /// A failed terminal outcome.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            rule_id: None,
            reason: reason.into(),
        }
    }

    /// Attach the remote identifier.
    #[must_use]
    pub fn with_rule_id(mut self, rule_id: RuleId) -> Self {
        self.rule_id = Some(rule_id);
        self
    }

    /// Whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_fields_reports_each_absent_field() {
        let spec = PredicateSpec {
            negated: None,
            kind: Some(PredicateKind::IpMatch),
            data_id: None,
        };
        assert_eq!(spec.missing_fields(), vec!["Negated", "DataId"]);
    }

    #[test]
    fn test_validate_complete_spec() {
        let spec = PredicateSpec::new(false, PredicateKind::IpMatch, "d1");
        let predicate = spec.validate().unwrap();
        assert_eq!(predicate, Predicate::new(false, PredicateKind::IpMatch, "d1"));
    }

    #[test]
    fn test_validate_incomplete_spec_names_missing_fields() {
        let spec = PredicateSpec {
            negated: Some(true),
            kind: None,
            data_id: Some("d1".to_string()),
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(
            err,
            Error::incomplete_predicate(Some("d1".to_string()), vec!["Type"])
        );
    }

    #[test]
    fn test_rule_state_from_normalized_properties() {
        let properties = json!({
            "Name": "r1",
            "MetricName": "r1-metric",
            "RateKey": "IP",
            "RateLimit": 2000,
            "Predicates": [
                {"Negated": false, "Type": "IPMatch", "DataId": "d1"}
            ]
        });
        let state = RuleState::from_properties(&properties).unwrap();
        assert_eq!(state.name, "r1");
        assert_eq!(state.rate_limit, 2000);
        assert_eq!(state.predicates.len(), 1);
        assert_eq!(
            state.predicates[0],
            PredicateSpec::new(false, PredicateKind::IpMatch, "d1")
        );
        assert!(state.rule_id.is_none());
    }

    #[test]
    fn test_rule_state_predicates_default_to_empty() {
        let properties = json!({
            "Name": "r1",
            "MetricName": "r1-metric",
            "RateKey": "IP",
            "RateLimit": 2000
        });
        let state = RuleState::from_properties(&properties).unwrap();
        assert!(state.predicates.is_empty());
    }

    #[test]
    fn test_rule_state_rejects_malformed_bag() {
        let properties = json!({"Name": "r1"});
        let err = RuleState::from_properties(&properties).unwrap_err();
        assert!(matches!(err, Error::InvalidProperties { .. }));
    }

    #[test]
    fn test_rule_state_ignores_unknown_properties() {
        let properties = json!({
            "Name": "r1",
            "MetricName": "r1-metric",
            "RateKey": "IP",
            "RateLimit": 2000,
            "ServiceToken": "arn:aws:lambda:::function:provider"
        });
        assert!(RuleState::from_properties(&properties).is_ok());
    }

    #[test]
    fn test_metadata_projection() {
        let properties = json!({
            "Name": "r1",
            "MetricName": "r1-metric",
            "RateKey": "IP",
            "RateLimit": 2000
        });
        let state = RuleState::from_properties(&properties).unwrap();
        let metadata = state.metadata();
        assert_eq!(metadata.name, "r1");
        assert_eq!(metadata.metric_name, "r1-metric");
        assert_eq!(metadata.rate_limit, 2000);
    }

    #[test]
    fn test_outcome_builders() {
        let ok = ReconcileOutcome::success("done").with_rule_id(RuleId::from("rule-1"));
        assert!(ok.is_success());
        assert_eq!(ok.rule_id, Some(RuleId::from("rule-1")));

        let failed = ReconcileOutcome::failed("boom");
        assert!(!failed.is_success());
        assert_eq!(failed.reason, "boom");
    }

    #[test]
    fn test_lifecycle_action_display() {
        assert_eq!(LifecycleAction::Create.to_string(), "create");
        assert_eq!(LifecycleAction::Delete.as_str(), "delete");
    }
}
