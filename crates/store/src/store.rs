//! Rule store trait and implementations.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChangeStatus, ChangeToken, RuleId, RuleMetadata, RuleOperation};

/// Abstract capability over the remote rule-management system.
///
/// Every mutation returns a change token; the mutation is not durable until
/// [`RuleStore::change_status`] reports that token settled. Callers must
/// not assume a mutation is visible before settlement.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Create a rule from metadata alone. Returns the assigned rule id and
    /// the change token covering the creation.
    async fn create_rule(&self, metadata: &RuleMetadata) -> Result<(RuleId, ChangeToken)>;

    /// Apply an ordered predicate operation batch, and the given rate
    /// limit, to an existing rule. The batch is applied atomically under
    /// the returned change token; it may be empty for a metadata-only
    /// update.
    async fn update_rule(
        &self,
        rule_id: &RuleId,
        rate_limit: u64,
        operations: &[RuleOperation],
    ) -> Result<ChangeToken>;

    /// Delete a rule.
    async fn delete_rule(&self, rule_id: &RuleId) -> Result<ChangeToken>;

    /// Query settlement status for a previously issued change token.
    async fn change_status(&self, token: &ChangeToken) -> Result<ChangeStatus>;
}

/// A wrapper that adds tracing to a rule store.
pub struct TracingRuleStore<S: RuleStore> {
    inner: S,
}

impl<S: RuleStore> TracingRuleStore<S> {
    /// Create a new tracing rule store.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: RuleStore> RuleStore for TracingRuleStore<S> {
    async fn create_rule(&self, metadata: &RuleMetadata) -> Result<(RuleId, ChangeToken)> {
        tracing::debug!(
            name = %metadata.name,
            rate_limit = metadata.rate_limit,
            "creating rule"
        );
        let result = self.inner.create_rule(metadata).await;
        if let Ok((rule_id, token)) = &result {
            tracing::trace!(rule_id = %rule_id, token = %token, "rule created");
        }
        result
    }

    async fn update_rule(
        &self,
        rule_id: &RuleId,
        rate_limit: u64,
        operations: &[RuleOperation],
    ) -> Result<ChangeToken> {
        tracing::debug!(
            rule_id = %rule_id,
            rate_limit,
            operations = operations.len(),
            "updating rule"
        );
        self.inner.update_rule(rule_id, rate_limit, operations).await
    }

    async fn delete_rule(&self, rule_id: &RuleId) -> Result<ChangeToken> {
        tracing::debug!(rule_id = %rule_id, "deleting rule");
        self.inner.delete_rule(rule_id).await
    }

    async fn change_status(&self, token: &ChangeToken) -> Result<ChangeStatus> {
        let result = self.inner.change_status(token).await;
        if let Ok(status) = &result {
            tracing::trace!(token = %token, status = %status, "polled change status");
        }
        result
    }
}
