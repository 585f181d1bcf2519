//! Request dispatch: envelope in, terminal response out.
//!
//! The handler is the seam between the hosting invocation model and the
//! reconciler core. It owns everything the core treats as external:
//! resource-type dispatch, the required-property schema gate, property
//! normalization, and the outcome-to-response translation.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use rampart_core::normalize_properties;
use rampart_reconciler::{
    LifecycleAction, PollConfig, ReconcileOutcome, ReconcileRequest, RuleReconciler, RuleState,
};
use rampart_store::{RuleId, RuleStore};

use crate::request::{RequestType, ResourceRequest};
use crate::response::ProviderResponse;

/// The one resource type this provider serves.
pub const RESOURCE_TYPE: &str = "Custom::RateBasedRule";

/// Physical id reported when a create dies before any id is assigned.
pub const FAILED_TO_CREATE: &str = "failed-to-create";

/// Properties that must be present on every request.
const REQUIRED_PROPERTIES: [&str; 4] = ["Name", "MetricName", "RateKey", "RateLimit"];

/// Handle one resource request to its terminal response.
pub async fn handle(
    request: &ResourceRequest,
    store: Arc<dyn RuleStore>,
    poll: PollConfig,
) -> ProviderResponse {
    if request.resource_type != RESOURCE_TYPE {
        warn!(resource_type = %request.resource_type, "rejecting unknown resource type");
        return ProviderResponse::failed(
            rampart_core::Error::unsupported_resource_type(&request.resource_type).to_string(),
            request.physical_resource_id.clone(),
        );
    }

    let missing = missing_required(&request.resource_properties);
    if !missing.is_empty() {
        return ProviderResponse::failed(
            rampart_core::Error::missing_properties(missing).to_string(),
            request.physical_resource_id.clone(),
        );
    }

    let properties = normalize_properties(request.resource_properties.clone());
    let desired = match RuleState::from_properties(&properties) {
        Ok(desired) => desired,
        Err(err) => {
            return ProviderResponse::failed(err.to_string(), request.physical_resource_id.clone())
        }
    };

    let previous = match request.old_resource_properties.as_ref() {
        Some(raw) => {
            let normalized = normalize_properties(raw.clone());
            match RuleState::from_properties(&normalized) {
                Ok(previous) => Some(previous),
                Err(err) => {
                    return ProviderResponse::failed(
                        err.to_string(),
                        request.physical_resource_id.clone(),
                    )
                }
            }
        }
        None => None,
    };

    let resource_id = request.physical_resource_id.clone().map(RuleId::from);
    let reconcile_request = match request.request_type {
        RequestType::Create => ReconcileRequest::create(desired),
        RequestType::Update => ReconcileRequest {
            action: LifecycleAction::Update,
            desired,
            previous,
            resource_id,
        },
        RequestType::Delete => {
            // The delete payload carries only current properties; they are
            // the last observed state of the resource being retired.
            let previous = previous.unwrap_or_else(|| desired.clone());
            ReconcileRequest {
                action: LifecycleAction::Delete,
                desired,
                previous: Some(previous),
                resource_id,
            }
        }
    };

    let reconciler = RuleReconciler::new(store, poll);
    let outcome = reconciler.reconcile(&reconcile_request).await;
    into_response(request, outcome)
}

fn missing_required(properties: &Value) -> Vec<&'static str> {
    REQUIRED_PROPERTIES
        .iter()
        .copied()
        .filter(|field| properties.get(field).is_none())
        .collect()
}

fn into_response(request: &ResourceRequest, outcome: ReconcileOutcome) -> ProviderResponse {
    let physical_resource_id = outcome
        .rule_id
        .as_ref()
        .map(|id| id.to_string())
        .or_else(|| request.physical_resource_id.clone())
        .or_else(|| {
            (request.request_type == RequestType::Create).then(|| FAILED_TO_CREATE.to_string())
        });

    if outcome.is_success() {
        info!(reason = %outcome.reason, "reconciliation succeeded");
        ProviderResponse::success(outcome.reason, physical_resource_id)
    } else {
        warn!(reason = %outcome.reason, "reconciliation failed");
        ProviderResponse::failed(outcome.reason, physical_resource_id)
    }
}
