use super::WorkloadService;
use crate::db;
use crate::error::ApiError;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::types::{ObjectKind, ObjectRef};
use kubelab_common::auth::{MessageResponse, User};
use tracing::info;

impl WorkloadService {
    /// Delete the caller's workload and its record
    ///
    /// Objects already gone from the cluster count as deleted. Any other
    /// cluster error aborts and keeps the record.
    pub async fn teardown(&self, user: &User, short_name: &str) -> Result<MessageResponse, ApiError> {
        let record = self.owned_record(user, short_name).await?;
        let namespace = &self.settings.namespace;

        let mut objects = Vec::with_capacity(3);
        if self.settings.ingress_domain.is_some() || record.hostname.is_some() {
            objects.push(ObjectRef::new(ObjectKind::Ingress, &record.name));
        }
        objects.push(ObjectRef::new(ObjectKind::Service, &record.name));
        objects.push(ObjectRef::new(ObjectKind::Deployment, &record.name));

        for object in &objects {
            let result = match object.kind {
                ObjectKind::Ingress => self.cluster.delete_ingress(namespace, &object.name).await,
                ObjectKind::Service => self.cluster.delete_service(namespace, &object.name).await,
                ObjectKind::Deployment => self.cluster.delete_deployment(namespace, &object.name).await,
            };
            already_deleted_ok(result)?;
        }

        db::pods::delete_pod(self.database.pool(), record.id).await?;

        info!(pod = %record.name, user = %user.username, "Workload deleted");

        Ok(MessageResponse::new(format!("Pod '{}' deleted", short_name)))
    }
}

fn already_deleted_ok(result: K8sResult<()>) -> K8sResult<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}
