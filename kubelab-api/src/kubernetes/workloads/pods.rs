//! Pod operations

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::types::{PodInfo, PodPhase};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};

/// List pods in a namespace
pub async fn list_pods(
    client: &K8sClient,
    namespace: &str,
    label_selector: Option<&str>,
) -> K8sResult<Vec<PodInfo>> {
    let pods: Api<Pod> = Api::namespaced(client.inner().clone(), namespace);

    let mut lp = ListParams::default();
    if let Some(selector) = label_selector {
        lp = lp.labels(selector);
    }

    let pod_list = pods.list(&lp).await?;

    Ok(pod_list.items.into_iter().map(pod_to_info).collect())
}

/// Convert k8s Pod to PodInfo
pub fn pod_to_info(pod: Pod) -> PodInfo {
    let status = pod.status.unwrap_or_default();

    PodInfo {
        name: pod.metadata.name.unwrap_or_default(),
        phase: PodPhase::from_phase(status.phase.as_deref()),
        pod_ip: status.pod_ip.filter(|ip| !ip.is_empty()),
        labels: pod.metadata.labels.unwrap_or_default(),
    }
}
