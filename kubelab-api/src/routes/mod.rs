//! HTTP routes
//!
//! Public endpoints (`/register`, `/login`, `/check`, `/health`) sit beside
//! the protected ones, which pass through [`auth_middleware`] first. CORS
//! wraps everything so preflight requests never reach authentication.

mod groups;
mod pods;
mod users;

use crate::middleware::{auth::auth_middleware, cors::cors_middleware};
use crate::AppState;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the complete application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/check", get(pods::check_cluster))
        .route("/health", get(health_check))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .merge(account_routes())
        .merge(pod_routes())
        .merge(group_routes())
        .with_state(state.clone())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn_with_state(
            state.cors.clone(),
            cors_middleware,
        ))
}

fn account_routes() -> Router<Arc<AppState>> {
    Router::new().route("/change_role", post(users::change_role))
}

fn pod_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pods", get(pods::list_pods).post(pods::create_pod))
        .route("/pods/:name", delete(pods::delete_pod))
        .route("/pods/:name/terminal", get(pods::terminal))
        .route("/pods/:name/exec", post(pods::exec))
}

fn group_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create_group", post(groups::create_group))
        .route("/update_group/:id", put(groups::update_group))
        .route("/delete_group/:id", delete(groups::delete_group))
        .route("/all_groups", get(groups::list_groups))
        .route("/group/:id", get(groups::get_group))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness check
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
