//! kubelab API Library
//!
//! Provisions per-user container workloads on a Kubernetes cluster and keeps
//! a record of them. Exposed as a library so tests can drive the router.

// Core modules
pub mod config;
pub mod error;
pub mod logging;
pub mod shutdown;
pub mod validation;

// Application state
pub mod state;
pub use state::AppState;

// Authentication & Authorization
pub mod auth;
pub mod middleware;

// Database
pub mod db;

// Kubernetes integration
pub mod kubernetes;

// Workloads
pub mod naming;
pub mod retry;
pub mod workloads;

// HTTP
pub mod routes;
