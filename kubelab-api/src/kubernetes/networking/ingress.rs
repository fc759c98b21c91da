//! Ingress operations

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::K8sResult;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, DeleteParams, PostParams};

/// Create an Ingress
pub async fn create_ingress(client: &K8sClient, namespace: &str, ingress: &Ingress) -> K8sResult<()> {
    let ingresses: Api<Ingress> = Api::namespaced(client.inner().clone(), namespace);
    ingresses.create(&PostParams::default(), ingress).await?;

    Ok(())
}

/// Delete an Ingress
pub async fn delete_ingress(client: &K8sClient, namespace: &str, name: &str) -> K8sResult<()> {
    let ingresses: Api<Ingress> = Api::namespaced(client.inner().clone(), namespace);
    ingresses.delete(name, &DeleteParams::default()).await?;

    Ok(())
}
