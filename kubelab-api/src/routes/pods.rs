use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::{require_role, POD_ROLES};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use kubelab_common::auth::MessageResponse;
use kubelab_common::{
    ClusterCheck, CreatePodRequest, ExecRequest, ExecResponse, PodSummary, ProvisionedPod,
    TerminalInfo,
};
use std::sync::Arc;

pub(super) async fn list_pods(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PodSummary>>, ApiError> {
    require_role(&user, POD_ROLES)?;
    Ok(Json(state.workloads.list(&user).await?))
}

pub(super) async fn create_pod(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreatePodRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProvisionedPod>), ApiError> {
    require_role(&user, POD_ROLES)?;
    let Json(request) = payload?;

    let pod = state.workloads.provision(&user, &request).await?;
    Ok((StatusCode::CREATED, Json(pod)))
}

pub(super) async fn delete_pod(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&user, POD_ROLES)?;
    Ok(Json(state.workloads.teardown(&user, &name).await?))
}

pub(super) async fn terminal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<TerminalInfo>, ApiError> {
    require_role(&user, POD_ROLES)?;
    Ok(Json(state.workloads.terminal(&user, &name).await?))
}

pub(super) async fn exec(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    payload: Result<Json<ExecRequest>, JsonRejection>,
) -> Result<Json<ExecResponse>, ApiError> {
    require_role(&user, POD_ROLES)?;
    let Json(request) = payload?;

    Ok(Json(state.workloads.exec(&user, &name, &request).await?))
}

pub(super) async fn check_cluster(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClusterCheck>, ApiError> {
    Ok(Json(state.workloads.check().await?))
}
