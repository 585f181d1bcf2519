//! Change-settlement tracking.
//!
//! A submitted mutation is durable only once its change token settles. The
//! tracker polls the store's status endpoint in a bounded loop, doubling
//! the wait between polls up to a ceiling. The original recursive shape of
//! this wait (re-polling by self-call with a grown interval) is expressed
//! here as an explicit loop with local counters, which keeps the stack
//! flat and the policy unit-testable with an injected sleeper.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use rampart_store::{ChangeToken, RuleStore};

use crate::error::{Error, Result};

/// Polling policy for settlement tracking.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Wait before the first re-poll.
    pub initial_interval: Duration,
    /// Ceiling for the doubled interval.
    pub max_interval: Duration,
    /// Give up after this many sleep-then-repoll rounds.
    pub max_retries: u32,
}

impl Default for PollConfig {
    /// 30s constant-interval polling with a budget of 15 retries.
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(30),
            max_retries: 15,
        }
    }
}

/// Sleep abstraction so tests can observe the backoff schedule instead of
/// waiting it out.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the calling task for `period`.
    async fn sleep(&self, period: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Settlement polling state machine: `Pending -> {Settled, TimedOut}`.
///
/// One tracker instance polls one token at a time; the retry and backoff
/// counters live on the stack of [`ChangeTracker::wait_for_settlement`]
/// and need no synchronization.
pub struct ChangeTracker {
    config: PollConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl ChangeTracker {
    /// Create a tracker using the tokio timer.
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Create a tracker with a custom sleeper.
    pub fn with_sleeper(config: PollConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    /// The polling policy in effect.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Block until the token settles, the retry budget is exhausted, or
    /// the store fails.
    ///
    /// The first status query is not a retry; a retry is one
    /// sleep-then-repoll round. A store failure while polling is fatal to
    /// the invocation: at this layer a transient failure cannot be told
    /// apart from a terminal one.
    pub async fn wait_for_settlement(
        &self,
        store: &dyn RuleStore,
        token: &ChangeToken,
    ) -> Result<()> {
        let mut interval = self.config.initial_interval;
        let mut retries = 0u32;

        loop {
            let status = store.change_status(token).await?;
            if status.is_settled() {
                debug!(token = %token, retries, "change settled");
                return Ok(());
            }
            if retries >= self.config.max_retries {
                warn!(
                    token = %token,
                    retries,
                    last_status = %status,
                    "settlement retry budget exhausted"
                );
                return Err(Error::settlement_timeout(status, retries));
            }
            debug!(
                token = %token,
                status = %status,
                wait = ?interval,
                "change not settled, waiting before re-poll"
            );
            self.sleeper.sleep(interval).await;
            retries += 1;
            interval = (interval * 2).min(self.config.max_interval);
        }
    }
}
