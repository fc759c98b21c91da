//! Service operations

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::K8sResult;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use std::collections::HashSet;

/// Create a Service
pub async fn create_service(client: &K8sClient, namespace: &str, service: &Service) -> K8sResult<()> {
    let services: Api<Service> = Api::namespaced(client.inner().clone(), namespace);
    services.create(&PostParams::default(), service).await?;

    Ok(())
}

/// Delete a Service
pub async fn delete_service(client: &K8sClient, namespace: &str, name: &str) -> K8sResult<()> {
    let services: Api<Service> = Api::namespaced(client.inner().clone(), namespace);
    services.delete(name, &DeleteParams::default()).await?;

    Ok(())
}

/// NodePorts currently claimed by Services in the namespace
pub async fn list_node_ports(client: &K8sClient, namespace: &str) -> K8sResult<HashSet<i32>> {
    let services: Api<Service> = Api::namespaced(client.inner().clone(), namespace);
    let list = services.list(&ListParams::default()).await?;

    Ok(node_ports_in_use(&list.items))
}

/// Collect `nodePort` values of NodePort and LoadBalancer Services
pub fn node_ports_in_use(services: &[Service]) -> HashSet<i32> {
    services
        .iter()
        .filter_map(|svc| svc.spec.as_ref())
        .filter(|spec| matches!(spec.type_.as_deref(), Some("NodePort") | Some("LoadBalancer")))
        .flat_map(|spec| spec.ports.iter().flatten())
        .filter_map(|port| port.node_port)
        .collect()
}
