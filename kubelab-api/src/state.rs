//! Application State
//!
//! Shared state for the kubelab API server

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::token::TokenIssuer;
use crate::auth::AuthManager;
use crate::config::KubelabConfig;
use crate::db::Database;
use crate::kubernetes::ClusterClient;
use crate::middleware::cors::CorsPolicy;
use crate::workloads::{WorkloadService, WorkloadSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<KubelabConfig>,
    pub database: Arc<Database>,
    pub auth: AuthManager,
    pub workloads: WorkloadService,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    /// Wire the managers together
    ///
    /// `shutdown` flips to `true` when the server stops; readiness waits
    /// observe it and give up.
    pub fn new(
        config: KubelabConfig,
        database: Arc<Database>,
        cluster: Arc<dyn ClusterClient>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        let auth = AuthManager::new(database.clone(), tokens);
        let workloads = WorkloadService::new(
            database.clone(),
            cluster,
            WorkloadSettings::from(&config.kubernetes),
            shutdown,
        );
        let cors = Arc::new(CorsPolicy::new(&config.cors.allowed_origins));

        Self {
            config: Arc::new(config),
            database,
            auth,
            workloads,
            cors,
        }
    }
}
