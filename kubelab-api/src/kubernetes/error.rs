//! Kubernetes error types and ApiError mapping
//!
//! Maps kube-rs errors to Kubelab API errors for consistent error handling.

use crate::error::ApiError;
use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// Error from kube-rs client
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Object missing on the API server
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// Invalid kubeconfig
    #[error("Invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    /// Exec session error
    #[error("Exec error: {0}")]
    ExecError(String),

    /// No free NodePort left in the configured range
    #[error("node port range exhausted ({base}-{max})")]
    PortRangeExhausted { base: i32, max: i32 },

    /// Workload did not become ready in time
    #[error("Timed out waiting for readiness of '{name}'")]
    ReadinessTimeout { name: String, objects: Vec<String> },

    /// Wait abandoned because the server is shutting down
    #[error("Operation cancelled: server is shutting down")]
    Cancelled,

    /// Internal system error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl K8sError {
    /// True when the API server answered 404 for the object
    pub fn is_not_found(&self) -> bool {
        match self {
            K8sError::NotFound { .. } => true,
            K8sError::KubeError(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }

    /// True when the API server answered 409 for the object
    pub fn is_conflict(&self) -> bool {
        matches!(self, K8sError::KubeError(kube::Error::Api(response)) if response.code == 409)
    }
}

/// Cluster failures are upstream errors whatever the API server's status code.
/// Callers that treat not-found or conflict specially check before converting.
impl From<K8sError> for ApiError {
    fn from(err: K8sError) -> Self {
        match err {
            K8sError::KubeError(kube::Error::Api(response)) => ApiError::Cluster(response.message),
            K8sError::KubeError(e) => ApiError::Cluster(format!("Kubernetes error: {}", e)),
            e @ K8sError::NotFound { .. } => ApiError::Cluster(e.to_string()),
            K8sError::InvalidKubeconfig(msg) => ApiError::Internal(msg),
            e @ K8sError::ExecError(_) => ApiError::Cluster(e.to_string()),
            e @ K8sError::PortRangeExhausted { .. } => ApiError::Cluster(e.to_string()),
            K8sError::ReadinessTimeout { name, objects } => ApiError::ReadinessTimeout {
                message: format!("Timed out waiting for readiness of '{}'", name),
                left_in_place: objects,
            },
            e @ K8sError::Cancelled => ApiError::ServiceUnavailable(e.to_string()),
            K8sError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;
