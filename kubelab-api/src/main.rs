use anyhow::Context;
use kubelab_api::{
    auth::BOOTSTRAP_ADMIN,
    config::KubelabConfig,
    db::Database,
    kubernetes::{ClusterClient, K8sClient},
    routes, shutdown, AppState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Password the bootstrap admin gets when none is configured
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = KubelabConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = config
        .logging
        .init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(anyhow::anyhow!("Invalid configuration: {}", e));
    }
    info!("Configuration loaded successfully");

    // Initialize database
    let database = Arc::new(
        Database::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to database")?,
    );
    database.migrate().await.context("Failed to run migrations")?;
    info!("Database initialized");

    // Connect to the cluster
    let cluster = match &config.kubernetes.kubeconfig {
        Some(path) => K8sClient::from_kubeconfig_file(path).await,
        None => K8sClient::infer().await,
    }
    .context("Failed to create Kubernetes client")?;
    info!(
        api_server = %cluster.api_server(),
        namespace = %config.kubernetes.namespace,
        "Kubernetes client ready"
    );
    match cluster.server_version().await {
        Ok(version) => info!("Kubernetes version: {}", version),
        Err(e) => warn!("Failed to query Kubernetes version: {}", e),
    }
    let cluster: Arc<dyn ClusterClient> = Arc::new(cluster);

    let coordinator = shutdown::ShutdownCoordinator::new();
    let graceful = shutdown::GracefulShutdown::new(coordinator.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let admin_password = config.auth.admin_password.clone();
    let state = Arc::new(AppState::new(
        config,
        database.clone(),
        cluster,
        coordinator.subscribe(),
    ));

    // Create the admin account on first start
    match state.auth.ensure_bootstrap_admin(&admin_password).await {
        Ok(true) => {
            if admin_password == DEFAULT_ADMIN_PASSWORD {
                warn!(
                    user = BOOTSTRAP_ADMIN,
                    "Using default admin password; set KUBELAB_ADMIN_PASSWORD for production"
                );
            }
        }
        Ok(false) => info!("Existing users found, skipping admin bootstrap"),
        Err(e) => warn!("Failed to bootstrap admin account: {:?}", e),
    }

    let app = routes::build_router(state);

    // Spawn signal handler
    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        signal_coordinator.wait_for_signal().await;
    });

    info!("kubelab API listening on {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful.signal())
        .await?;

    info!("Server stopped, running cleanup...");

    graceful
        .cleanup(|| async move {
            database.close().await;
        })
        .await;

    Ok(())
}
