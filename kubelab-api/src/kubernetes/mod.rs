//! Kubernetes integration for Kubelab
//!
//! Provides the cluster side of lab workloads:
//! - Cluster connection via kubeconfig or in-cluster config
//! - Deployments and their Pods
//! - NodePort Services and Ingresses
//! - One-shot exec into running containers

pub mod client;
pub mod error;
pub mod exec;
pub mod manifest;
pub mod networking;
pub mod types;
pub mod workloads;

use async_trait::async_trait;
use error::K8sResult;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use std::collections::HashSet;
use types::{ExecOutput, PodInfo};

pub use client::K8sClient;

/// Operations the workload service needs from a cluster
///
/// [`K8sClient`] talks to a real API server; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// NodePorts claimed by NodePort/LoadBalancer Services in the namespace
    async fn used_node_ports(&self, namespace: &str) -> K8sResult<HashSet<i32>>;

    async fn create_deployment(&self, namespace: &str, deployment: &Deployment) -> K8sResult<()>;

    async fn create_service(&self, namespace: &str, service: &Service) -> K8sResult<()>;

    async fn create_ingress(&self, namespace: &str, ingress: &Ingress) -> K8sResult<()>;

    async fn delete_deployment(&self, namespace: &str, name: &str) -> K8sResult<()>;

    async fn delete_service(&self, namespace: &str, name: &str) -> K8sResult<()>;

    async fn delete_ingress(&self, namespace: &str, name: &str) -> K8sResult<()>;

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> K8sResult<Vec<PodInfo>>;

    async fn exec(
        &self,
        namespace: &str,
        pod_name: &str,
        command: Vec<String>,
    ) -> K8sResult<ExecOutput>;
}
