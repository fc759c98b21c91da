//! Common test utilities and helpers
//!
//! [`FakeCluster`] stands in for the Kubernetes API server and [`TestApp`]
//! drives the router in-process.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kubelab_api::config::KubelabConfig;
use kubelab_api::db::{self, Database};
use kubelab_api::kubernetes::error::{K8sError, K8sResult};
use kubelab_api::kubernetes::networking::services::node_ports_in_use;
use kubelab_api::kubernetes::types::{ExecOutput, PodInfo, PodPhase};
use kubelab_api::kubernetes::ClusterClient;
use kubelab_api::shutdown::ShutdownCoordinator;
use kubelab_api::{routes, AppState};
use kubelab_common::Role;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceExt;

/// Objects and knobs of the in-memory cluster
#[derive(Default)]
pub struct FakeState {
    pub deployments: BTreeMap<String, Deployment>,
    pub services: BTreeMap<String, Service>,
    pub ingresses: BTreeMap<String, Ingress>,
    /// NodePorts claimed by services outside the test's control
    pub foreign_node_ports: HashSet<i32>,
    /// Pods stay Pending without an IP
    pub never_ready: bool,
    pub fail_service_create: bool,
    pub fail_list_pods: bool,
    /// Namespace missing on the API server; creates answer 404
    pub missing_namespace: bool,
    pub fail_delete_deployment: bool,
    /// Pods vanish between lookup and exec
    pub exec_pod_gone: bool,
    pub exec_calls: Vec<(String, Vec<String>)>,
}

/// In-memory cluster; every Deployment owns exactly one pod
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn object_count(&self) -> usize {
        let state = self.state();
        state.deployments.len() + state.services.len() + state.ingresses.len()
    }
}

fn object_name(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

/// Error as the API server would report it
pub fn api_error(code: u16, reason: &str, message: &str) -> K8sError {
    K8sError::KubeError(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: reason.to_string(),
        code,
    }))
}

fn not_found(kind: &str, name: &str) -> K8sError {
    K8sError::NotFound {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn used_node_ports(&self, _namespace: &str) -> K8sResult<HashSet<i32>> {
        let state = self.state();
        let services: Vec<Service> = state.services.values().cloned().collect();
        let mut used = node_ports_in_use(&services);
        used.extend(state.foreign_node_ports.iter().copied());
        Ok(used)
    }

    async fn create_deployment(&self, _namespace: &str, deployment: &Deployment) -> K8sResult<()> {
        let name = object_name(&deployment.metadata);
        let mut state = self.state();
        if state.missing_namespace {
            return Err(api_error(404, "NotFound", "namespaces \"default\" not found"));
        }
        if state.deployments.contains_key(&name) {
            return Err(api_error(409, "AlreadyExists", "deployments.apps already exists"));
        }
        state.deployments.insert(name, deployment.clone());
        Ok(())
    }

    async fn create_service(&self, _namespace: &str, service: &Service) -> K8sResult<()> {
        let name = object_name(&service.metadata);
        let mut state = self.state();
        if state.fail_service_create {
            return Err(api_error(403, "Forbidden", "exceeded quota: service quota exceeded"));
        }
        if state.services.contains_key(&name) {
            return Err(api_error(409, "AlreadyExists", "services already exists"));
        }
        state.services.insert(name, service.clone());
        Ok(())
    }

    async fn create_ingress(&self, _namespace: &str, ingress: &Ingress) -> K8sResult<()> {
        let name = object_name(&ingress.metadata);
        self.state().ingresses.insert(name, ingress.clone());
        Ok(())
    }

    async fn delete_deployment(&self, _namespace: &str, name: &str) -> K8sResult<()> {
        let mut state = self.state();
        if state.fail_delete_deployment {
            return Err(api_error(500, "InternalError", "etcd unavailable"));
        }
        state
            .deployments
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("deployment", name))
    }

    async fn delete_service(&self, _namespace: &str, name: &str) -> K8sResult<()> {
        self.state()
            .services
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("service", name))
    }

    async fn delete_ingress(&self, _namespace: &str, name: &str) -> K8sResult<()> {
        self.state()
            .ingresses
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("ingress", name))
    }

    async fn list_pods(
        &self,
        _namespace: &str,
        label_selector: Option<&str>,
    ) -> K8sResult<Vec<PodInfo>> {
        let state = self.state();
        if state.fail_list_pods {
            return Err(api_error(503, "ServiceUnavailable", "api server unavailable"));
        }

        let wanted = label_selector.and_then(|s| s.strip_prefix("app="));

        Ok(state
            .deployments
            .keys()
            .enumerate()
            .filter(|(_, name)| wanted.map_or(true, |w| w == name.as_str()))
            .map(|(index, name)| {
                let mut labels = BTreeMap::new();
                labels.insert("app".to_string(), name.clone());
                PodInfo {
                    name: format!("{}-7d9f8b6c5-x{}", name, index),
                    phase: if state.never_ready {
                        PodPhase::Pending
                    } else {
                        PodPhase::Running
                    },
                    pod_ip: (!state.never_ready).then(|| format!("10.42.0.{}", index + 10)),
                    labels,
                }
            })
            .collect())
    }

    async fn exec(
        &self,
        _namespace: &str,
        pod_name: &str,
        command: Vec<String>,
    ) -> K8sResult<ExecOutput> {
        let script = command.last().cloned().unwrap_or_default();
        let mut state = self.state();
        if state.exec_pod_gone {
            return Err(api_error(
                404,
                "NotFound",
                &format!("pods \"{}\" not found", pod_name),
            ));
        }
        state.exec_calls.push((pod_name.to_string(), command));

        Ok(ExecOutput {
            stdout: format!("ran: {}\n", script),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

/// Configuration with fast readiness polling
pub fn test_config() -> KubelabConfig {
    let mut config = KubelabConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.kubernetes.readiness_timeout_secs = 1;
    config.kubernetes.poll_interval_ms = 10;
    config.kubernetes.poll_max_interval_ms = 50;
    config
}

/// Router, fake cluster and database wired together
pub struct TestApp {
    pub router: Router,
    pub cluster: Arc<FakeCluster>,
    pub state: Arc<AppState>,
    pub shutdown: ShutdownCoordinator,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: KubelabConfig) -> Self {
        let database = Database::new("sqlite::memory:", 1).await.unwrap();
        database.migrate().await.unwrap();

        let cluster = Arc::new(FakeCluster::default());
        let shutdown = ShutdownCoordinator::new();
        let state = Arc::new(AppState::new(
            config,
            Arc::new(database),
            cluster.clone(),
            shutdown.subscribe(),
        ));

        Self {
            router: routes::build_router(state.clone()),
            cluster,
            state,
            shutdown,
        }
    }

    /// Send a request and decode the JSON body (`Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    pub async fn register(&self, username: &str, password: &str) -> StatusCode {
        let body = json!({ "username": username, "password": password });
        self.request(Method::POST, "/register", None, Some(body)).await.0
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let body = json!({ "username": username, "password": password });
        let (status, value) = self.request(Method::POST, "/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", value);
        value["token"].as_str().unwrap().to_string()
    }

    /// Register a user, set its role directly in the store, and log in
    pub async fn user_with_role(&self, username: &str, role: Role) -> String {
        assert_eq!(self.register(username, "password").await, StatusCode::CREATED);

        let pool = self.state.database.pool();
        let user = db::users::get_user_by_username(pool, username)
            .await
            .unwrap()
            .unwrap();
        assert!(db::users::update_role(pool, user.id, role).await.unwrap());

        self.login(username, "password").await
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        db::users::get_user_by_username(self.state.database.pool(), username)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    pub async fn record_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM pods")
            .fetch_one(self.state.database.pool())
            .await
            .unwrap()
    }

    pub async fn create_pod(&self, token: &str, name: &str, ports: Value) -> (StatusCode, Value) {
        let body = json!({ "name": name, "image": "nginx:1.27", "ports": ports });
        self.request(Method::POST, "/pods", Some(token), Some(body)).await
    }
}
