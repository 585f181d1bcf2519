//! In-memory rule store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::RuleStore;
use crate::types::{
    ChangeStatus, ChangeToken, Predicate, RuleId, RuleMetadata, RuleOperation, UpdateAction,
};

/// A rule as held by the in-memory backend.
#[derive(Debug, Clone)]
pub struct StoredRule {
    pub metadata: RuleMetadata,
    pub predicates: Vec<Predicate>,
}

/// In-memory rule store.
///
/// Mimics the remote system's eventual consistency: each minted change
/// token reports [`ChangeStatus::Pending`] for a configurable number of
/// polls before settling. Used by tests and the binary's local mode.
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<RuleId, StoredRule>>,
    tokens: RwLock<HashMap<ChangeToken, u32>>,
    next_rule: AtomicU64,
    next_token: AtomicU64,
    pending_polls: u32,
}

impl InMemoryRuleStore {
    /// Create a store whose change tokens settle on the first poll.
    pub fn new() -> Self {
        Self::with_pending_polls(0)
    }

    /// Create a store whose change tokens report `Pending` for
    /// `pending_polls` status queries before settling.
    pub fn with_pending_polls(pending_polls: u32) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            next_rule: AtomicU64::new(0),
            next_token: AtomicU64::new(0),
            pending_polls,
        }
    }

    /// Create a new store wrapped in an Arc.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Look up a rule by id.
    pub async fn rule(&self, rule_id: &RuleId) -> Option<StoredRule> {
        self.rules.read().await.get(rule_id).cloned()
    }

    /// Whether a rule with this id exists.
    pub async fn contains(&self, rule_id: &RuleId) -> bool {
        self.rules.read().await.contains_key(rule_id)
    }

    /// Number of rules currently held.
    pub async fn rule_count(&self) -> usize {
        self.rules.read().await.len()
    }

    /// Number of change tokens minted so far.
    pub fn tokens_minted(&self) -> u64 {
        self.next_token.load(Ordering::Relaxed)
    }

    async fn mint_token(&self) -> ChangeToken {
        let n = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        let token = ChangeToken::new(format!("change-token-{n}"));
        self.tokens
            .write()
            .await
            .insert(token.clone(), self.pending_polls);
        token
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn create_rule(&self, metadata: &RuleMetadata) -> Result<(RuleId, ChangeToken)> {
        let n = self.next_rule.fetch_add(1, Ordering::Relaxed) + 1;
        let rule_id = RuleId::new(format!("rule-{n}"));
        self.rules.write().await.insert(
            rule_id.clone(),
            StoredRule {
                metadata: metadata.clone(),
                predicates: Vec::new(),
            },
        );
        let token = self.mint_token().await;
        Ok((rule_id, token))
    }

    async fn update_rule(
        &self,
        rule_id: &RuleId,
        rate_limit: u64,
        operations: &[RuleOperation],
    ) -> Result<ChangeToken> {
        {
            let mut rules = self.rules.write().await;
            let rule = rules
                .get_mut(rule_id)
                .ok_or_else(|| StoreError::not_found(format!("rule '{rule_id}'")))?;

            for op in operations {
                match op.action {
                    UpdateAction::Insert => {
                        // An insert for an already-present data id replaces it.
                        rule.predicates
                            .retain(|p| p.data_id != op.predicate.data_id);
                        rule.predicates.push(op.predicate.clone());
                    }
                    UpdateAction::Delete => {
                        rule.predicates
                            .retain(|p| p.data_id != op.predicate.data_id);
                    }
                }
            }
            rule.metadata.rate_limit = rate_limit;
        }
        Ok(self.mint_token().await)
    }

    async fn delete_rule(&self, rule_id: &RuleId) -> Result<ChangeToken> {
        self.rules
            .write()
            .await
            .remove(rule_id)
            .ok_or_else(|| StoreError::not_found(format!("rule '{rule_id}'")))?;
        Ok(self.mint_token().await)
    }

    async fn change_status(&self, token: &ChangeToken) -> Result<ChangeStatus> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            None => Err(StoreError::not_found(format!("change token '{token}'"))),
            Some(remaining) => {
                if *remaining == 0 {
                    Ok(ChangeStatus::Settled)
                } else {
                    *remaining -= 1;
                    Ok(ChangeStatus::Pending)
                }
            }
        }
    }
}
