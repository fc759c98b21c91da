use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::{require_role, ADMIN_ROLES};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use kubelab_common::auth::{
    ChangeRoleRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
};
use std::sync::Arc;

pub(super) async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = payload?;
    let user = state.auth.register(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "User '{}' registered",
            user.username
        ))),
    ))
}

pub(super) async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Malformed bodies count as bad credentials
    let Json(request) = payload.map_err(|_| ApiError::AuthenticationFailed)?;
    Ok(Json(state.auth.login(&request).await?))
}

pub(super) async fn change_role(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&user, ADMIN_ROLES)?;
    let Json(request) = payload?;

    let role = state.auth.change_role(&user, &request).await?;

    Ok(Json(MessageResponse::new(format!(
        "Role updated to '{}'",
        role
    ))))
}
