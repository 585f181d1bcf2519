//! Predicate diffing.
//!
//! Computes the ordered operation batch that transforms a rule's previous
//! predicate set into the desired one with minimal churn. Identity is
//! `data_id` alone; the remote system has no "modify predicate" operation,
//! so a predicate whose fields changed is replaced via delete-then-insert.

use itertools::Itertools;

use rampart_store::{Predicate, RuleOperation};

use crate::error::Result;
use crate::types::PredicateSpec;

/// Compute the operation batch transforming `old` into `new`.
///
/// - a predicate identical on both sides emits nothing,
/// - a predicate whose `data_id` matches but whose `negated` or `kind`
///   differs emits a DELETE of the old form followed by an INSERT of the
///   new,
/// - a predicate only in `new` emits an INSERT,
/// - a predicate only in `old` emits a trailing DELETE.
///
/// Every desired predicate must carry all three fields; an incomplete one
/// aborts the whole diff before any operation is produced. Emission order
/// (changed pairs, then fresh inserts, then stale deletes) is stable for
/// testability only; the remote system applies the batch atomically under
/// one change token.
pub fn diff(old: &[Predicate], new: &[PredicateSpec]) -> Result<Vec<RuleOperation>> {
    // Validate the whole desired set up front so no partial batch can leak
    // out when a later predicate turns out incomplete.
    let desired = new
        .iter()
        .map(PredicateSpec::validate)
        .collect::<Result<Vec<_>>>()?;

    let mut remaining = old.to_vec();
    let mut changed = Vec::new();
    let mut inserts = Vec::new();

    for predicate in desired {
        // Scan the entire remaining old set; the first candidate is not
        // necessarily the match.
        match remaining
            .iter()
            .position(|p| p.data_id == predicate.data_id)
        {
            Some(idx) => {
                let current = remaining.remove(idx);
                if current != predicate {
                    changed.push(RuleOperation::delete(current));
                    changed.push(RuleOperation::insert(predicate));
                }
            }
            None => inserts.push(RuleOperation::insert(predicate)),
        }
    }

    // Whatever is still unmatched was removed from the desired state.
    let stale = remaining.into_iter().map(RuleOperation::delete);

    Ok(changed.into_iter().chain(inserts).chain(stale).collect_vec())
}
