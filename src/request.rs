//! Inbound request envelope.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rampart_core::{Error, Result};

/// Lifecycle action requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// One resource request as delivered by the hosting invocation model.
///
/// Property bags arrive untyped (`Value`): the declarative format carries
/// every scalar as text, and normalization happens downstream in the
/// handler before the bags are interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRequest {
    pub request_type: RequestType,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    /// The remote identifier; present on update and delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    pub resource_properties: Value,
    /// The previous property bag; present on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Value>,
}

impl ResourceRequest {
    /// Parse a request from raw JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| Error::json_parse_failed(err.to_string()))
    }

    /// Read and parse a request file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| Error::request_read_failed(path, err.to_string()))?;
        Self::from_json(&raw)
    }
}
