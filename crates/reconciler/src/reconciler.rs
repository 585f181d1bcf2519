//! Rule lifecycle reconciliation.

use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, info, warn};

use rampart_store::{RuleId, RuleOperation, RuleStore};

use crate::diff::diff;
use crate::error::{Error, Result};
use crate::tracker::{ChangeTracker, PollConfig, Sleeper};
use crate::types::{LifecycleAction, ReconcileOutcome, ReconcileRequest, RuleState};

/// Drives one rule's lifecycle against the rule store.
///
/// Each invocation performs exactly one lifecycle action to completion or
/// failure; nothing is persisted between invocations. At most one change
/// is ever outstanding: a second mutation is never submitted before the
/// first settles, which trades latency for the inability to corrupt
/// ordering.
pub struct RuleReconciler {
    store: Arc<dyn RuleStore>,
    tracker: ChangeTracker,
}

impl RuleReconciler {
    /// Create a reconciler polling with the given policy.
    pub fn new(store: Arc<dyn RuleStore>, poll: PollConfig) -> Self {
        Self {
            store,
            tracker: ChangeTracker::new(poll),
        }
    }

    /// Create a reconciler with a custom sleeper (used by tests to skip
    /// real waits).
    pub fn with_sleeper(
        store: Arc<dyn RuleStore>,
        poll: PollConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            tracker: ChangeTracker::with_sleeper(poll, sleeper),
        }
    }

    /// Perform the requested lifecycle action and report its terminal
    /// outcome.
    ///
    /// Errors are resolved here and converted into the outcome; nothing
    /// unwinds past this point.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> ReconcileOutcome {
        info!(action = %request.action, name = %request.desired.name, "reconciling rule");
        match request.action {
            LifecycleAction::Create => self.create(&request.desired).await,
            LifecycleAction::Update => match Self::previous_and_id(request) {
                Ok((previous, rule_id)) => self.update(&request.desired, previous, rule_id).await,
                Err(err) => ReconcileOutcome::failed(err.to_string()),
            },
            LifecycleAction::Delete => match Self::previous_and_id(request) {
                Ok((previous, rule_id)) => self.delete(previous, rule_id).await,
                Err(err) => ReconcileOutcome::failed(err.to_string()),
            },
        }
    }

    fn previous_and_id(request: &ReconcileRequest) -> Result<(&RuleState, &RuleId)> {
        let previous = request
            .previous
            .as_ref()
            .ok_or_else(|| Error::missing_previous(request.action.as_str()))?;
        let rule_id = request
            .resource_id
            .as_ref()
            .ok_or_else(|| Error::missing_rule_id(request.action.as_str()))?;
        Ok((previous, rule_id))
    }

    /// Submit one operation batch and block until it settles.
    async fn submit_update(
        &self,
        rule_id: &RuleId,
        rate_limit: u64,
        operations: &[RuleOperation],
    ) -> Result<()> {
        let token = self
            .store
            .update_rule(rule_id, rate_limit, operations)
            .await?;
        self.tracker
            .wait_for_settlement(self.store.as_ref(), &token)
            .await
    }

    async fn create(&self, desired: &RuleState) -> ReconcileOutcome {
        // Validate any desired predicates before touching the remote
        // system: an incomplete predicate must not leave a half-created
        // resource behind.
        let operations = match diff(&[], &desired.predicates) {
            Ok(operations) => operations,
            Err(err) => return ReconcileOutcome::failed(err.to_string()),
        };

        let (rule_id, token) = match self.store.create_rule(&desired.metadata()).await {
            Ok(created) => created,
            Err(err) => return ReconcileOutcome::failed(Error::from(err).to_string()),
        };
        info!(rule_id = %rule_id, name = %desired.name, "rule created, waiting for settlement");

        // The assigned id is retained on every path from here on, so a
        // follow-up failure still leaves a deletable resource identity.
        if let Err(err) = self
            .tracker
            .wait_for_settlement(self.store.as_ref(), &token)
            .await
        {
            return ReconcileOutcome::failed(err.to_string()).with_rule_id(rule_id);
        }

        if operations.is_empty() {
            return ReconcileOutcome::success("create settled").with_rule_id(rule_id);
        }

        debug!(
            rule_id = %rule_id,
            operations = operations.len(),
            "create carried predicates, submitting follow-up insert batch"
        );
        match self
            .submit_update(&rule_id, desired.rate_limit, &operations)
            .await
        {
            Ok(()) => ReconcileOutcome::success("create and predicate update settled")
                .with_rule_id(rule_id),
            Err(err) => ReconcileOutcome::failed(err.to_string()).with_rule_id(rule_id),
        }
    }

    async fn update(
        &self,
        desired: &RuleState,
        previous: &RuleState,
        rule_id: &RuleId,
    ) -> ReconcileOutcome {
        let old = match previous.validated_predicates() {
            Ok(old) => old,
            Err(err) => return ReconcileOutcome::failed(err.to_string()),
        };
        let operations = match diff(&old, &desired.predicates) {
            Ok(operations) => operations,
            Err(err) => return ReconcileOutcome::failed(err.to_string()),
        };

        let limit_changed = previous.rate_limit != desired.rate_limit;
        if operations.is_empty() && !limit_changed {
            debug!(rule_id = %rule_id, "desired state already matches, nothing to submit");
            return ReconcileOutcome::success("no changes to apply").with_rule_id(rule_id.clone());
        }

        info!(
            rule_id = %rule_id,
            operations = operations.len(),
            limit_changed,
            "submitting rule update"
        );
        match self
            .submit_update(rule_id, desired.rate_limit, &operations)
            .await
        {
            Ok(()) => ReconcileOutcome::success("update settled").with_rule_id(rule_id.clone()),
            Err(err) => ReconcileOutcome::failed(err.to_string()).with_rule_id(rule_id.clone()),
        }
    }

    async fn delete(&self, previous: &RuleState, rule_id: &RuleId) -> ReconcileOutcome {
        let current = match previous.validated_predicates() {
            Ok(current) => current,
            Err(err) => return ReconcileOutcome::failed(err.to_string()),
        };

        // The rule cannot be removed while predicates are attached, so
        // retract them first. A rule that is already gone makes the
        // retraction moot rather than failed.
        if !current.is_empty() {
            let operations = current
                .iter()
                .cloned()
                .map(RuleOperation::delete)
                .collect_vec();
            match self
                .store
                .update_rule(rule_id, previous.rate_limit, &operations)
                .await
            {
                Ok(token) => {
                    if let Err(err) = self
                        .tracker
                        .wait_for_settlement(self.store.as_ref(), &token)
                        .await
                    {
                        return ReconcileOutcome::failed(err.to_string())
                            .with_rule_id(rule_id.clone());
                    }
                }
                Err(err) if err.is_not_found() => {
                    info!(rule_id = %rule_id, "rule already absent, skipping predicate retraction");
                }
                Err(err) => {
                    return ReconcileOutcome::failed(Error::from(err).to_string())
                        .with_rule_id(rule_id.clone());
                }
            }
        }

        match self.store.delete_rule(rule_id).await {
            Ok(token) => match self
                .tracker
                .wait_for_settlement(self.store.as_ref(), &token)
                .await
            {
                Ok(()) => ReconcileOutcome::success("delete settled").with_rule_id(rule_id.clone()),
                Err(err) => ReconcileOutcome::failed(err.to_string()).with_rule_id(rule_id.clone()),
            },
            Err(err) if err.is_not_found() => {
                info!(rule_id = %rule_id, "rule already deleted");
                ReconcileOutcome::success("rule already deleted").with_rule_id(rule_id.clone())
            }
            Err(err) => {
                warn!(rule_id = %rule_id, error = %err, "rule deletion failed");
                ReconcileOutcome::failed(Error::from(err).to_string()).with_rule_id(rule_id.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use rampart_store::{InMemoryRuleStore, PredicateKind};

    use super::*;
    use crate::types::PredicateSpec;

    /// Sleeper that returns immediately so tests never wait.
    struct InstantSleeper;

    #[async_trait]
    impl Sleeper for InstantSleeper {
        async fn sleep(&self, _period: Duration) {}
    }

    fn reconciler(store: Arc<InMemoryRuleStore>) -> RuleReconciler {
        reconciler_with_retries(store, 15)
    }

    fn reconciler_with_retries(store: Arc<InMemoryRuleStore>, max_retries: u32) -> RuleReconciler {
        let poll = PollConfig {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
            max_retries,
        };
        RuleReconciler::with_sleeper(store, poll, Arc::new(InstantSleeper))
    }

    fn desired_state(predicates: Vec<PredicateSpec>) -> RuleState {
        RuleState::from_properties(&json!({
            "Name": "r1",
            "MetricName": "r1-metric",
            "RateKey": "IP",
            "RateLimit": 2000
        }))
        .map(|mut state| {
            state.predicates = predicates;
            state
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_without_predicates_submits_one_change() {
        let store = InMemoryRuleStore::new_arc();
        let outcome = reconciler(store.clone())
            .reconcile(&ReconcileRequest::create(desired_state(Vec::new())))
            .await;

        assert!(outcome.is_success());
        let rule_id = outcome.rule_id.unwrap();
        assert!(store.contains(&rule_id).await);
        assert_eq!(store.tokens_minted(), 1);
    }

    #[tokio::test]
    async fn test_create_with_predicates_submits_follow_up_insert_batch() {
        let store = InMemoryRuleStore::new_arc();
        let predicates = vec![PredicateSpec::new(false, PredicateKind::IpMatch, "d1")];
        let outcome = reconciler(store.clone())
            .reconcile(&ReconcileRequest::create(desired_state(predicates)))
            .await;

        assert!(outcome.is_success());
        let rule_id = outcome.rule_id.unwrap();
        let rule = store.rule(&rule_id).await.unwrap();
        assert_eq!(rule.predicates.len(), 1);
        assert_eq!(rule.predicates[0].data_id, "d1");
        assert_eq!(store.tokens_minted(), 2);
    }

    #[tokio::test]
    async fn test_create_with_incomplete_predicate_touches_nothing_remote() {
        let store = InMemoryRuleStore::new_arc();
        let predicates = vec![PredicateSpec {
            negated: None,
            kind: Some(PredicateKind::IpMatch),
            data_id: Some("d1".to_string()),
        }];
        let outcome = reconciler(store.clone())
            .reconcile(&ReconcileRequest::create(desired_state(predicates)))
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.reason.contains("Negated"));
        assert_eq!(store.rule_count().await, 0);
        assert_eq!(store.tokens_minted(), 0);
    }

    #[tokio::test]
    async fn test_create_timeout_retains_assigned_rule_id() {
        let store = Arc::new(InMemoryRuleStore::with_pending_polls(10));
        let outcome = reconciler_with_retries(store.clone(), 1)
            .reconcile(&ReconcileRequest::create(desired_state(Vec::new())))
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.reason.contains("did not settle"));
        // The metadata change went through; its id must survive for cleanup.
        assert!(outcome.rule_id.is_some());
    }

    #[tokio::test]
    async fn test_update_flipping_negation_replaces_the_predicate() {
        let store = InMemoryRuleStore::new_arc();
        let rec = reconciler(store.clone());

        let previous_preds = vec![PredicateSpec::new(false, PredicateKind::IpMatch, "d1")];
        let created = rec
            .reconcile(&ReconcileRequest::create(desired_state(previous_preds.clone())))
            .await;
        let rule_id = created.rule_id.unwrap();

        let desired = desired_state(vec![PredicateSpec::new(true, PredicateKind::IpMatch, "d1")]);
        let previous = desired_state(previous_preds);
        let outcome = rec
            .reconcile(&ReconcileRequest::update(desired, previous, rule_id.clone()))
            .await;

        assert!(outcome.is_success());
        let rule = store.rule(&rule_id).await.unwrap();
        assert_eq!(rule.predicates.len(), 1);
        assert!(rule.predicates[0].negated);
    }

    #[tokio::test]
    async fn test_update_without_changes_is_a_no_op_success() {
        let store = InMemoryRuleStore::new_arc();
        let rec = reconciler(store.clone());

        let created = rec
            .reconcile(&ReconcileRequest::create(desired_state(Vec::new())))
            .await;
        let rule_id = created.rule_id.unwrap();
        let minted_after_create = store.tokens_minted();

        let outcome = rec
            .reconcile(&ReconcileRequest::update(
                desired_state(Vec::new()),
                desired_state(Vec::new()),
                rule_id,
            ))
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.reason, "no changes to apply");
        assert_eq!(store.tokens_minted(), minted_after_create);
    }

    #[tokio::test]
    async fn test_update_fires_on_rate_limit_change_alone() {
        let store = InMemoryRuleStore::new_arc();
        let rec = reconciler(store.clone());

        let created = rec
            .reconcile(&ReconcileRequest::create(desired_state(Vec::new())))
            .await;
        let rule_id = created.rule_id.unwrap();

        let mut desired = desired_state(Vec::new());
        desired.rate_limit = 5000;
        let outcome = rec
            .reconcile(&ReconcileRequest::update(
                desired,
                desired_state(Vec::new()),
                rule_id.clone(),
            ))
            .await;

        assert!(outcome.is_success());
        assert_eq!(store.rule(&rule_id).await.unwrap().metadata.rate_limit, 5000);
    }

    #[tokio::test]
    async fn test_update_removing_all_predicates_deletes_them() {
        let store = InMemoryRuleStore::new_arc();
        let rec = reconciler(store.clone());

        let previous_preds = vec![PredicateSpec::new(false, PredicateKind::IpMatch, "d1")];
        let created = rec
            .reconcile(&ReconcileRequest::create(desired_state(previous_preds.clone())))
            .await;
        let rule_id = created.rule_id.unwrap();

        let outcome = rec
            .reconcile(&ReconcileRequest::update(
                desired_state(Vec::new()),
                desired_state(previous_preds),
                rule_id.clone(),
            ))
            .await;

        assert!(outcome.is_success());
        assert!(store.rule(&rule_id).await.unwrap().predicates.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_previous_state_fails() {
        let store = InMemoryRuleStore::new_arc();
        let request = ReconcileRequest {
            action: LifecycleAction::Update,
            desired: desired_state(Vec::new()),
            previous: None,
            resource_id: Some(RuleId::from("rule-1")),
        };
        let outcome = reconciler(store).reconcile(&request).await;

        assert!(!outcome.is_success());
        assert!(outcome.reason.contains("previous resource state"));
    }

    #[tokio::test]
    async fn test_delete_retracts_predicates_then_removes_the_rule() {
        let store = InMemoryRuleStore::new_arc();
        let rec = reconciler(store.clone());

        let predicates = vec![
            PredicateSpec::new(false, PredicateKind::IpMatch, "d1"),
            PredicateSpec::new(true, PredicateKind::GeoMatch, "d2"),
        ];
        let created = rec
            .reconcile(&ReconcileRequest::create(desired_state(predicates.clone())))
            .await;
        let rule_id = created.rule_id.unwrap();
        let minted_after_create = store.tokens_minted();

        let outcome = rec
            .reconcile(&ReconcileRequest::delete(
                desired_state(predicates),
                rule_id.clone(),
            ))
            .await;

        assert!(outcome.is_success());
        assert!(!store.contains(&rule_id).await);
        // One retraction batch plus the rule deletion.
        assert_eq!(store.tokens_minted(), minted_after_create + 2);
    }

    #[tokio::test]
    async fn test_delete_of_absent_rule_is_success() {
        let store = InMemoryRuleStore::new_arc();
        let outcome = reconciler(store)
            .reconcile(&ReconcileRequest::delete(
                desired_state(Vec::new()),
                RuleId::from("never-created"),
            ))
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.reason, "rule already deleted");
    }

    #[tokio::test]
    async fn test_delete_of_absent_rule_with_predicates_is_success() {
        let store = InMemoryRuleStore::new_arc();
        let predicates = vec![PredicateSpec::new(false, PredicateKind::IpMatch, "d1")];
        let outcome = reconciler(store)
            .reconcile(&ReconcileRequest::delete(
                desired_state(predicates),
                RuleId::from("never-created"),
            ))
            .await;

        // Both the retraction and the deletion hit the not-found path.
        assert!(outcome.is_success());
    }
}
