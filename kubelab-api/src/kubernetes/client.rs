//! Kubernetes client wrapper
//!
//! Wraps the kube-rs Client and implements [`ClusterClient`] on top of the
//! per-resource helper functions.

use super::error::{K8sError, K8sResult};
use super::types::{ExecOutput, PodInfo};
use super::{exec, networking, workloads, ClusterClient};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::collections::HashSet;
use std::path::Path;

/// Wrapper around kube-rs Client
#[derive(Clone)]
pub struct K8sClient {
    inner: Client,
    api_server: String,
}

impl K8sClient {
    /// Create client from kubeconfig YAML with optional context
    pub async fn from_kubeconfig(kubeconfig_yaml: &str, context: Option<&str>) -> K8sResult<Self> {
        let kubeconfig = Kubeconfig::from_yaml(kubeconfig_yaml).map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to parse kubeconfig: {}", e))
        })?;

        let config = Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: context.map(String::from),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create config: {}", e)))?;

        Self::from_config(config)
    }

    /// Create client from a kubeconfig file on disk
    pub async fn from_kubeconfig_file(path: &Path) -> K8sResult<Self> {
        let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_kubeconfig(&yaml, None).await
    }

    /// In-cluster config when available, otherwise `$KUBECONFIG` / `~/.kube/config`
    pub async fn infer() -> K8sResult<Self> {
        let config = Config::infer()
            .await
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to infer config: {}", e)))?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> K8sResult<Self> {
        let api_server = config.cluster_url.to_string();

        let client = Client::try_from(config)
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            inner: client,
            api_server,
        })
    }

    /// Get the inner kube-rs Client
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get API server URL
    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    /// Get the API server git version
    pub async fn server_version(&self) -> K8sResult<String> {
        let version = self.inner.apiserver_version().await?;
        Ok(version.git_version)
    }
}

impl std::fmt::Debug for K8sClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("K8sClient")
            .field("api_server", &self.api_server)
            .finish()
    }
}

#[async_trait]
impl ClusterClient for K8sClient {
    async fn used_node_ports(&self, namespace: &str) -> K8sResult<HashSet<i32>> {
        networking::services::list_node_ports(self, namespace).await
    }

    async fn create_deployment(&self, namespace: &str, deployment: &Deployment) -> K8sResult<()> {
        workloads::deployments::create_deployment(self, namespace, deployment).await
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> K8sResult<()> {
        networking::services::create_service(self, namespace, service).await
    }

    async fn create_ingress(&self, namespace: &str, ingress: &Ingress) -> K8sResult<()> {
        networking::ingress::create_ingress(self, namespace, ingress).await
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> K8sResult<()> {
        workloads::deployments::delete_deployment(self, namespace, name).await
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> K8sResult<()> {
        networking::services::delete_service(self, namespace, name).await
    }

    async fn delete_ingress(&self, namespace: &str, name: &str) -> K8sResult<()> {
        networking::ingress::delete_ingress(self, namespace, name).await
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> K8sResult<Vec<PodInfo>> {
        workloads::pods::list_pods(self, namespace, label_selector).await
    }

    async fn exec(
        &self,
        namespace: &str,
        pod_name: &str,
        command: Vec<String>,
    ) -> K8sResult<ExecOutput> {
        exec::exec_command(self, namespace, pod_name, command).await
    }
}
