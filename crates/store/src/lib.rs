//! Rule-store capability for rampart.
//!
//! The remote rule-management system is asynchronous and eventually
//! consistent: every mutation returns a change token, and the mutation is
//! not durable until that token settles. This crate models that boundary:
//!
//! - [`RuleStore`]: the abstract capability (create/update/delete a rule,
//!   query change-token settlement),
//! - [`types`]: the value types crossing it (predicates, operations,
//!   metadata, tokens),
//! - [`InMemoryRuleStore`]: a complete in-process backend with scriptable
//!   settlement latency, used by tests and the binary's local mode.
//!
//! Transport, authentication, and the wire format of a real remote backend
//! are deliberately out of scope; deployments implement [`RuleStore`] over
//! their management API.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::{InMemoryRuleStore, StoredRule};
pub use store::{RuleStore, TracingRuleStore};
pub use types::{
    ChangeStatus, ChangeToken, Predicate, PredicateKind, RateKey, RuleId, RuleMetadata,
    RuleOperation, UpdateAction,
};
