//! Manifest construction
//!
//! Pure builders turning a [`WorkloadSpec`] into the Deployment, Service and
//! Ingress objects submitted for a workload.

use super::types::WorkloadSpec;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Label selecting the pods of one workload
pub const APP_LABEL: &str = "app";
/// Label recording the creating user
pub const OWNER_LABEL: &str = "kubelab.io/owner";

/// `app=<name>` selector string for list calls
pub fn app_selector(name: &str) -> String {
    format!("{}={}", APP_LABEL, name)
}

fn selector_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

fn workload_labels(spec: &WorkloadSpec) -> BTreeMap<String, String> {
    let mut labels = selector_labels(&spec.name);
    labels.insert(OWNER_LABEL.to_string(), spec.owner.clone());
    labels
}

fn metadata(spec: &WorkloadSpec, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(spec.name.clone()),
        namespace: Some(namespace.to_string()),
        labels: Some(workload_labels(spec)),
        ..Default::default()
    }
}

/// Single-replica Deployment running the requested image
pub fn build_deployment(spec: &WorkloadSpec, namespace: &str) -> Deployment {
    let labels = workload_labels(spec);

    let container_ports = spec
        .ports
        .iter()
        .map(|&port| ContainerPort {
            container_port: port,
            ..Default::default()
        })
        .collect();

    Deployment {
        metadata: metadata(spec, namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: spec.name.clone(),
                        image: Some(spec.image.clone()),
                        ports: Some(container_ports),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// NodePort Service exposing every requested port
pub fn build_service(spec: &WorkloadSpec, namespace: &str) -> Service {
    let ports = spec
        .ports
        .iter()
        .zip(spec.node_ports.iter())
        .map(|(&port, &node_port)| ServicePort {
            name: Some(format!("port-{}", port)),
            port,
            target_port: Some(IntOrString::Int(port)),
            node_port: Some(node_port),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        })
        .collect();

    Service {
        metadata: metadata(spec, namespace),
        spec: Some(ServiceSpec {
            type_: Some("NodePort".to_string()),
            selector: Some(selector_labels(&spec.name)),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ingress routing `/` on the workload host to the first Service port
///
/// Returns `None` when no hostname was assigned.
pub fn build_ingress(spec: &WorkloadSpec, namespace: &str) -> Option<Ingress> {
    let host = spec.hostname.clone()?;
    let first_port = *spec.ports.first()?;

    let path = HTTPIngressPath {
        path: Some("/".to_string()),
        path_type: "Prefix".to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: spec.name.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(first_port),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    };

    Some(Ingress {
        metadata: metadata(spec, namespace),
        spec: Some(IngressSpec {
            ingress_class_name: spec.ingress_class.clone(),
            rules: Some(vec![IngressRule {
                host: Some(host),
                http: Some(HTTPIngressRuleValue { paths: vec![path] }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}
