use super::{WorkloadService, IP_NOT_AVAILABLE, STATUS_NOT_FOUND};
use crate::db::{self, pods::PodRecord};
use crate::error::ApiError;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::exec::shell_command;
use crate::kubernetes::manifest;
use crate::kubernetes::types::PodInfo;
use crate::validation;
use kubelab_common::auth::User;
use kubelab_common::{ClusterCheck, ExecRequest, ExecResponse, PodSummary, TerminalInfo};
use tracing::{info, warn};

impl WorkloadService {
    /// Workloads the user owns or reaches through a group, with live status
    pub async fn list(&self, user: &User) -> Result<Vec<PodSummary>, ApiError> {
        let records = db::pods::list_visible_pods(self.database.pool(), user.id).await?;
        let mut summaries = Vec::with_capacity(records.len());

        for mut record in records {
            match self.lookup_pod(&record.name).await {
                Ok(pod) => {
                    let (status, ip) = match pod {
                        Some(pod) => (
                            pod.phase.as_str().to_string(),
                            pod.pod_ip.unwrap_or_else(|| IP_NOT_AVAILABLE.to_string()),
                        ),
                        None => (STATUS_NOT_FOUND.to_string(), IP_NOT_AVAILABLE.to_string()),
                    };

                    if status != record.status || ip != record.ip {
                        if let Err(e) =
                            db::pods::update_observed(self.database.pool(), record.id, &status, &ip).await
                        {
                            warn!(pod = %record.name, "Failed to store observed status: {}", e);
                        }
                        record.status = status;
                        record.ip = ip;
                    }
                }
                Err(e) => {
                    warn!(pod = %record.name, "Cluster lookup failed, reporting stored status: {}", e);
                }
            }

            summaries.push(record.to_summary());
        }

        Ok(summaries)
    }

    /// Connection details for the workload's pod
    pub async fn terminal(&self, user: &User, short_name: &str) -> Result<TerminalInfo, ApiError> {
        let record = self.owned_record(user, short_name).await?;

        let live_ip = match self.lookup_pod(&record.name).await {
            Ok(pod) => pod.and_then(|p| p.pod_ip),
            Err(e) => {
                warn!(pod = %record.name, "Cluster lookup failed, using stored IP: {}", e);
                None
            }
        };

        Ok(TerminalInfo {
            msg: format!("Terminal access for pod '{}'", short_name),
            pod_ip: live_ip.or_else(|| stored_ip(&record)),
        })
    }

    /// Run a shell command inside the workload's running pod
    pub async fn exec(
        &self,
        user: &User,
        short_name: &str,
        request: &ExecRequest,
    ) -> Result<ExecResponse, ApiError> {
        let record = self.owned_record(user, short_name).await?;
        let command = validation::required(request.command.as_deref(), "command")?;

        let pod = self
            .lookup_pod(&record.name)
            .await?
            .filter(PodInfo::is_ready)
            .ok_or_else(|| {
                ApiError::NotFound(format!("No running pod found for '{}'", short_name))
            })?;

        info!(pod = %pod.name, user = %user.username, "Executing command");

        let output = self
            .cluster
            .exec(&self.settings.namespace, &pod.name, shell_command(command))
            .await?;

        Ok(ExecResponse {
            output: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
        })
    }

    /// Pod names in the namespace, proving the cluster is reachable
    pub async fn check(&self) -> Result<ClusterCheck, ApiError> {
        let namespace = &self.settings.namespace;
        let pods = self.cluster.list_pods(namespace, None).await?;

        Ok(ClusterCheck {
            msg: format!("Connected to Kubernetes namespace '{}'", namespace),
            pods: pods.into_iter().map(|p| p.name).collect(),
        })
    }

    /// The workload's pod, preferring a ready one
    async fn lookup_pod(&self, name: &str) -> K8sResult<Option<PodInfo>> {
        let selector = manifest::app_selector(name);
        let pods = self
            .cluster
            .list_pods(&self.settings.namespace, Some(&selector))
            .await?;

        let ready = pods.iter().position(PodInfo::is_ready);
        Ok(match ready {
            Some(index) => pods.into_iter().nth(index),
            None => pods.into_iter().next(),
        })
    }
}

fn stored_ip(record: &PodRecord) -> Option<String> {
    Some(record.ip.clone()).filter(|ip| !ip.is_empty() && ip != IP_NOT_AVAILABLE)
}
