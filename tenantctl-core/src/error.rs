//! Tenant error types
//!
//! Every error surfaces unchanged to the caller. Nothing here is retried.

use thiserror::Error;

/// Errors raised by tenant operations
#[derive(Debug, Error)]
pub enum TenantError {
    /// A requested resource name is missing from a resource list
    #[error("Resource {name} does not exist")]
    ResourceNotFound { name: String },

    /// A quantity could not be parsed or does not fit in 64 bits
    #[error("Invalid quantity for {name}: '{value}'")]
    InvalidQuantity { name: String, value: String },

    /// No tenant namespace matches
    #[error("User {0} does not exist")]
    UserNotFound(String),

    /// A cluster object the tenant should own is missing
    #[error("No {kind} found in namespace {namespace}")]
    ObjectNotFound { kind: String, namespace: String },

    /// Username does not follow the tenant naming scheme
    #[error(transparent)]
    InvalidUsername(#[from] tenantctl_common::validate::ValidationError),

    /// Document provider could not deliver a document
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// Template is malformed or references an undefined value
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Server rejected an apply because another field manager owns a field
    #[error("Apply conflict on {kind}/{name}: {message}")]
    ApplyConflict {
        kind: String,
        name: String,
        message: String,
    },

    /// Malformed manifest document
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Kubeconfig could not be loaded
    #[error("Invalid kubeconfig: {0}")]
    Kubeconfig(String),

    /// Error from kube-rs client
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Internal system error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TenantError {
    pub fn source_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn object_not_found(kind: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind: kind.into(),
            namespace: namespace.into(),
        }
    }

    /// HTTP status code of a Kubernetes API error, if any
    pub fn api_status(&self) -> Option<u16> {
        match self {
            Self::Kube(kube::Error::Api(response)) => Some(response.code),
            _ => None,
        }
    }
}

/// Result type alias for tenant operations
pub type TenantResult<T> = std::result::Result<T, TenantError>;
