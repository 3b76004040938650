//! Routing types and error definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Resource-kind tag attached to a registered pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(String);

impl ResourceKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for ResourceKind {
    fn from(kind: String) -> Self {
        Self(kind)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider operations that can be reported as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    ResourceType,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ResourceType => "resource type",
        };
        f.write_str(name)
    }
}

/// Errors returned to callers of the resource router.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Structurally invalid identifier or predicate/argument mismatch.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Identifier matched no registered pattern.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Operation is not implemented by this provider.
    #[error("Operation not supported: {0}")]
    NotSupported(Operation),

    /// Backend failure, passed through unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProviderError {
    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderError::MalformedRequest(_) => "malformed_request",
            ProviderError::UnknownResource(_) => "unknown_resource",
            ProviderError::NotSupported(_) => "not_supported",
            ProviderError::Storage(_) => "storage_error",
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
