//! Workload lifecycle
//!
//! Provisioning, listing, teardown and exec for per-user workloads. Each
//! operation works against the record store and a [`ClusterClient`].

pub mod ports;
mod provision;
mod query;
mod teardown;

use crate::config::KubernetesConfig;
use crate::db::pods::PodRecord;
use crate::db::{self, Database};
use crate::error::ApiError;
use crate::kubernetes::ClusterClient;
use crate::naming;
use crate::retry::RetryPolicy;
use kubelab_common::auth::User;
use std::sync::Arc;
use tokio::sync::watch;

/// Status stored for a workload that passed readiness
pub const STATUS_RUNNING: &str = "Running";
/// Status reported when no pod matches the workload
pub const STATUS_NOT_FOUND: &str = "Not Found in Kubernetes";
/// IP reported when the pod has no address
pub const IP_NOT_AVAILABLE: &str = "Not Available";

/// Cluster-facing settings for workload operations
#[derive(Debug, Clone)]
pub struct WorkloadSettings {
    pub namespace: String,
    pub pod_quota: Option<u32>,
    pub ingress_domain: Option<String>,
    pub ingress_class: Option<String>,
    pub readiness: RetryPolicy,
    pub node_port_base: i32,
    pub node_port_max: i32,
}

impl From<&KubernetesConfig> for WorkloadSettings {
    fn from(config: &KubernetesConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            pod_quota: config.pod_quota,
            ingress_domain: config.ingress_domain.clone(),
            ingress_class: config.ingress_class.clone(),
            readiness: RetryPolicy::new(
                config.readiness_timeout(),
                config.poll_interval(),
                config.poll_max_interval(),
            ),
            node_port_base: config.node_port_base,
            node_port_max: config.node_port_max,
        }
    }
}

/// Workload operations shared by all request handlers
#[derive(Clone)]
pub struct WorkloadService {
    database: Arc<Database>,
    cluster: Arc<dyn ClusterClient>,
    settings: WorkloadSettings,
    shutdown: watch::Receiver<bool>,
}

impl WorkloadService {
    pub fn new(
        database: Arc<Database>,
        cluster: Arc<dyn ClusterClient>,
        settings: WorkloadSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            database,
            cluster,
            settings,
            shutdown,
        }
    }

    pub fn settings(&self) -> &WorkloadSettings {
        &self.settings
    }

    /// Load the caller's record for a short name, or 404
    async fn owned_record(&self, user: &User, short_name: &str) -> Result<PodRecord, ApiError> {
        let name = naming::derive_name(&user.username, short_name);

        db::pods::get_owned_pod(self.database.pool(), &name, user.id)
            .await?
            .ok_or_else(|| ApiError::pod_not_found(short_name))
    }
}
