//! Kubernetes types for the Kubelab API
//!
//! Plain data carried across the [`ClusterClient`](super::ClusterClient) seam.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pod phase as reported by the kubelet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }

    pub fn from_phase(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

impl Default for PodPhase {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pod information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: String,
    pub phase: PodPhase,
    pub pod_ip: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl PodInfo {
    /// Running with an address assigned
    pub fn is_ready(&self) -> bool {
        self.phase == PodPhase::Running && self.pod_ip.as_deref().is_some_and(|ip| !ip.is_empty())
    }
}

/// Output from an exec command
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit code (0 for success)
    pub exit_code: i32,
}

/// Everything needed to render the objects of one workload
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    /// Derived object name shared by Deployment, Service and Ingress
    pub name: String,
    /// Username of the creator, stamped as a label
    pub owner: String,
    pub image: String,
    /// Container ports, in request order
    pub ports: Vec<i32>,
    /// NodePorts, parallel to `ports`
    pub node_ports: Vec<i32>,
    /// Ingress host, when an ingress domain is configured
    pub hostname: Option<String>,
    pub ingress_class: Option<String>,
}

/// Kind of a cluster object created for a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Deployment,
    Service,
    Ingress,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Deployment => "deployment",
            ObjectKind::Service => "service",
            ObjectKind::Ingress => "ingress",
        }
    }
}

/// Reference to a created cluster object, rendered as `kind/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.name)
    }
}
