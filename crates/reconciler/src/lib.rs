//! Reconciliation of declarative rate-based rules against an eventually
//! consistent rule store.
//!
//! Given a desired rule state (and, for updates and deletes, the
//! previously observed state), this crate computes the minimal predicate
//! operation batch, submits it, and blocks until the remote system
//! confirms settlement:
//!
//! - [`diff`]: predicate diff keyed on `data_id`; unchanged predicates
//!   are left alone and changed ones become delete-then-insert pairs.
//! - [`ChangeTracker`]: bounded settlement polling with exponential
//!   backoff up to a ceiling.
//! - [`RuleReconciler`]: the create/update/delete lifecycle driving both.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rampart_reconciler::{PollConfig, ReconcileRequest, RuleReconciler, RuleState};
//! use rampart_store::InMemoryRuleStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryRuleStore::new_arc();
//!     let reconciler = RuleReconciler::new(store, PollConfig::default());
//!
//!     let desired: RuleState = serde_json::from_value(properties).unwrap();
//!     let outcome = reconciler.reconcile(&ReconcileRequest::create(desired)).await;
//!     assert!(outcome.is_success());
//! }
//! ```

pub mod diff;
pub mod error;
pub mod reconciler;
pub mod tracker;
pub mod types;

// Re-export main types
pub use diff::diff;
pub use error::{Error, Result};
pub use reconciler::RuleReconciler;
pub use tracker::{ChangeTracker, PollConfig, Sleeper, TokioSleeper};
pub use types::{
    LifecycleAction, OutcomeStatus, PredicateSpec, ReconcileOutcome, ReconcileRequest, RuleState,
};
