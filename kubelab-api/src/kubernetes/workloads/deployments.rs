//! Deployment operations

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::K8sResult;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, DeleteParams, PostParams};

/// Create a deployment
pub async fn create_deployment(
    client: &K8sClient,
    namespace: &str,
    deployment: &Deployment,
) -> K8sResult<()> {
    let deployments: Api<Deployment> = Api::namespaced(client.inner().clone(), namespace);
    deployments.create(&PostParams::default(), deployment).await?;

    Ok(())
}

/// Delete a deployment and, in the background, its pods
pub async fn delete_deployment(client: &K8sClient, namespace: &str, name: &str) -> K8sResult<()> {
    let deployments: Api<Deployment> = Api::namespaced(client.inner().clone(), namespace);
    deployments
        .delete(name, &DeleteParams::background())
        .await?;

    Ok(())
}
