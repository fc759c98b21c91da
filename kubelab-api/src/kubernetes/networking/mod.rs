//! Kubernetes networking resources
//!
//! Handles the NodePort Services and Ingresses that expose workloads.

pub mod ingress;
pub mod services;
