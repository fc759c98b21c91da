//! Kubernetes workload objects
//!
//! Deployments backing each lab workload and the Pods they run.

pub mod deployments;
pub mod pods;
