//! Terminal response envelope.

use serde::{Deserialize, Serialize};

use rampart_core::{Error, Result};

/// Terminal status reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Terminal response for one invocation: a single status, one
/// human-readable reason, and the resource identity when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
}

impl ProviderResponse {
    /// A success response.
    pub fn success(reason: impl Into<String>, physical_resource_id: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: Some(reason.into()),
            physical_resource_id,
        }
    }

    /// A failure response.
    pub fn failed(reason: impl Into<String>, physical_resource_id: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id,
        }
    }

    /// Whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Pretty-printed JSON for the caller.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| Error::json_parse_failed(format!("failed to serialize response: {err}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_success_wire_shape() {
        let response = ProviderResponse::success("create settled", Some("rule-1".to_string()));
        let json = response.to_json().unwrap();

        assert!(json.contains("\"Status\": \"SUCCESS\""));
        assert!(json.contains("\"Reason\": \"create settled\""));
        assert!(json.contains("\"PhysicalResourceId\": \"rule-1\""));
    }

    #[test]
    fn test_absent_physical_id_is_omitted() {
        let response = ProviderResponse::failed("boom", None);
        let json = response.to_json().unwrap();

        assert!(json.contains("\"Status\": \"FAILED\""));
        assert!(!json.contains("PhysicalResourceId"));
    }

    #[test]
    fn test_is_success() {
        assert!(ProviderResponse::success("ok", None).is_success());
        assert!(!ProviderResponse::failed("no", None).is_success());
    }
}
