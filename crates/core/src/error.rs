//! Error types for the invocation wrapper.
//!
//! All errors are explicit and typed; failures become terminal results at
//! the layer that detects them, never panics.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for wrapper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request '{}': {reason}", .path.display())]
    RequestReadFailed { path: PathBuf, reason: String },

    #[error("JSON parse error: {reason}")]
    JsonParseFailed { reason: String },

    #[error("missing required properties: {}", .fields.join(", "))]
    MissingProperties { fields: Vec<String> },

    #[error("unsupported resource type: {resource_type}")]
    UnsupportedResourceType { resource_type: String },
}

impl Error {
    /// Create a request read error.
    pub fn request_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::RequestReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse_failed(reason: impl Into<String>) -> Self {
        Self::JsonParseFailed {
            reason: reason.into(),
        }
    }

    /// Create a missing-properties error from the offending field names.
    pub fn missing_properties<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingProperties {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an unsupported resource type error.
    pub fn unsupported_resource_type(resource_type: impl Into<String>) -> Self {
        Self::UnsupportedResourceType {
            resource_type: resource_type.into(),
        }
    }
}
