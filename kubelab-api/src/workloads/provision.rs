//! Workload provisioning
//!
//! Validates the request, submits Deployment, Service and optional Ingress,
//! waits for a ready pod and persists the record. Objects created by a
//! failed request are removed again, except after a readiness timeout.

use super::{ports, WorkloadService, STATUS_RUNNING};
use crate::db::{self, pods::NewPod};
use crate::error::ApiError;
use crate::kubernetes::error::{K8sError, K8sResult};
use crate::kubernetes::manifest;
use crate::kubernetes::types::{ObjectKind, ObjectRef, PodInfo, WorkloadSpec};
use crate::naming;
use crate::retry::{self, PollError};
use crate::validation;
use kubelab_common::auth::User;
use kubelab_common::{CreatePodRequest, ProvisionedPod};
use tracing::{info, warn};

impl WorkloadService {
    /// Provision a workload for `user`
    pub async fn provision(
        &self,
        user: &User,
        request: &CreatePodRequest,
    ) -> Result<ProvisionedPod, ApiError> {
        let short_name = validation::required(request.name.as_deref(), "name")?;
        let image = validation::required(request.image.as_deref(), "image")?;
        validation::validate_image(image)?;
        let requested_ports = request
            .ports
            .as_ref()
            .ok_or_else(|| ApiError::missing_field("ports"))?
            .parse()?;
        let name = naming::validated_name(&user.username, short_name)?;

        let pool = self.database.pool();

        if let Some(quota) = self.settings.pod_quota {
            let owned = db::pods::count_owned(pool, user.id).await?;
            if owned >= i64::from(quota) {
                info!(user = %user.username, quota, "Pod quota reached");
                return Err(ApiError::BadRequest(format!(
                    "Pod quota of {} reached",
                    quota
                )));
            }
        }

        if db::pods::pod_exists(pool, &name).await? {
            return Err(ApiError::Conflict(format!(
                "Pod '{}' already exists",
                short_name
            )));
        }

        let namespace = &self.settings.namespace;
        let used = self.cluster.used_node_ports(namespace).await?;
        let node_ports = ports::allocate_node_ports(
            requested_ports.len(),
            &used,
            self.settings.node_port_base,
            self.settings.node_port_max,
        )?;

        let spec = WorkloadSpec {
            hostname: self
                .settings
                .ingress_domain
                .as_deref()
                .map(|domain| naming::hostname(&name, domain)),
            ingress_class: self.settings.ingress_class.clone(),
            name: name.clone(),
            owner: user.username.clone(),
            image: image.to_string(),
            ports: requested_ports,
            node_ports,
        };

        info!(
            pod = %spec.name,
            user = %user.username,
            image = %spec.image,
            node_ports = ?spec.node_ports,
            "Provisioning workload"
        );

        let mut created = Vec::new();
        if let Err(e) = self.submit(&spec, &mut created).await {
            warn!(pod = %spec.name, "Workload submission failed: {}", e);
            self.rollback(&created).await;
            if e.is_conflict() {
                return Err(ApiError::Conflict(format!(
                    "Pod '{}' already exists",
                    short_name
                )));
            }
            return Err(e.into());
        }

        let pod = match self.wait_until_ready(&spec.name).await {
            Ok(pod) => pod,
            Err(PollError::TimedOut { attempts }) => {
                let objects: Vec<String> = created.iter().map(ToString::to_string).collect();
                warn!(
                    pod = %spec.name,
                    attempts,
                    objects = ?objects,
                    "Timed out waiting for readiness; leaving objects in place"
                );
                return Err(K8sError::ReadinessTimeout {
                    name: spec.name.clone(),
                    objects,
                }
                .into());
            }
            Err(PollError::Cancelled) => {
                warn!(pod = %spec.name, "Readiness wait cancelled by shutdown");
                return Err(K8sError::Cancelled.into());
            }
            Err(PollError::Failed(e)) => {
                warn!(pod = %spec.name, "Readiness check failed: {}", e);
                self.rollback(&created).await;
                return Err(e.into());
            }
        };

        let ip = pod.pod_ip.unwrap_or_default();
        let record = NewPod {
            name: &spec.name,
            image: &spec.image,
            ports: &spec.ports,
            node_ports: &spec.node_ports,
            ip: &ip,
            status: STATUS_RUNNING,
            hostname: spec.hostname.as_deref(),
            user_id: user.id,
        };

        if let Err(e) = db::pods::create_pod(pool, &record).await {
            warn!(pod = %spec.name, "Failed to persist workload record: {}", e);
            self.rollback(&created).await;
            if db::is_unique_violation(&e) {
                return Err(ApiError::Conflict(format!(
                    "Pod '{}' already exists",
                    short_name
                )));
            }
            return Err(e.into());
        }

        info!(pod = %spec.name, user = %user.username, ip = %ip, "Workload running");

        Ok(ProvisionedPod {
            name: spec.name,
            ip,
            status: STATUS_RUNNING.to_string(),
            node_ports: spec.node_ports,
            hostname: spec.hostname,
        })
    }

    /// Create the workload's objects in order, recording each success
    async fn submit(&self, spec: &WorkloadSpec, created: &mut Vec<ObjectRef>) -> K8sResult<()> {
        let namespace = &self.settings.namespace;

        let deployment = manifest::build_deployment(spec, namespace);
        self.cluster.create_deployment(namespace, &deployment).await?;
        created.push(ObjectRef::new(ObjectKind::Deployment, &spec.name));

        let service = manifest::build_service(spec, namespace);
        self.cluster.create_service(namespace, &service).await?;
        created.push(ObjectRef::new(ObjectKind::Service, &spec.name));

        if let Some(ingress) = manifest::build_ingress(spec, namespace) {
            self.cluster.create_ingress(namespace, &ingress).await?;
            created.push(ObjectRef::new(ObjectKind::Ingress, &spec.name));
        }

        Ok(())
    }

    async fn wait_until_ready(&self, name: &str) -> Result<PodInfo, PollError<K8sError>> {
        let namespace = self.settings.namespace.as_str();
        let selector = manifest::app_selector(name);

        retry::poll_until(&self.settings.readiness, self.shutdown.clone(), || {
            let selector = selector.as_str();
            async move {
                self.cluster
                    .list_pods(namespace, Some(selector))
                    .await
                    .map(|pods| pods.into_iter().find(PodInfo::is_ready))
            }
        })
        .await
    }

    /// Best-effort removal of objects created by a failed request, newest first
    pub(super) async fn rollback(&self, created: &[ObjectRef]) {
        let namespace = &self.settings.namespace;

        for object in created.iter().rev() {
            let result = match object.kind {
                ObjectKind::Deployment => self.cluster.delete_deployment(namespace, &object.name).await,
                ObjectKind::Service => self.cluster.delete_service(namespace, &object.name).await,
                ObjectKind::Ingress => self.cluster.delete_ingress(namespace, &object.name).await,
            };

            match result {
                Ok(()) => info!(object = %object, "Rolled back"),
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(object = %object, "Rollback failed: {}", e),
            }
        }
    }
}
