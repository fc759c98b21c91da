use crate::db::{self, groups};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::{require_role, GROUP_ROLES};
use crate::validation;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use kubelab_common::auth::MessageResponse;
use kubelab_common::{GroupCreated, GroupInfo, GroupRequest};
use std::sync::Arc;
use tracing::info;

pub(super) async fn create_group(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<GroupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GroupCreated>), ApiError> {
    require_role(&user, GROUP_ROLES)?;
    let Json(request) = payload?;

    let name = validation::required(request.name.as_deref(), "name")?;
    validation::validate_group_name(name)?;

    let user_ids = request.users.as_ref().map(|u| u.ids()).unwrap_or_default();
    let pod_ids = request.pods.as_ref().map(|p| p.ids()).unwrap_or_default();

    let group_id = groups::create_group(state.database.pool(), name, &user_ids, &pod_ids)
        .await
        .map_err(|e| duplicate_name(e, name))?;

    info!(group = %name, group_id, by = %user.username, "Group created");

    Ok((
        StatusCode::CREATED,
        Json(GroupCreated {
            msg: format!("Group '{}' created", name),
            group_id,
        }),
    ))
}

pub(super) async fn update_group(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(group_id): Path<i64>,
    payload: Result<Json<GroupRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&user, GROUP_ROLES)?;
    let Json(request) = payload?;

    let name = validation::required(request.name.as_deref(), "name")?;
    validation::validate_group_name(name)?;

    let user_ids = request.users.as_ref().map(|u| u.ids());
    let pod_ids = request.pods.as_ref().map(|p| p.ids());

    let updated = groups::update_group(
        state.database.pool(),
        group_id,
        name,
        user_ids.as_deref(),
        pod_ids.as_deref(),
    )
    .await
    .map_err(|e| duplicate_name(e, name))?;

    if !updated {
        return Err(ApiError::group_not_found(group_id));
    }

    info!(group_id, by = %user.username, "Group updated");

    Ok(Json(MessageResponse::new(format!("Group {} updated", group_id))))
}

pub(super) async fn delete_group(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(group_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&user, GROUP_ROLES)?;

    if !groups::delete_group(state.database.pool(), group_id).await? {
        return Err(ApiError::group_not_found(group_id));
    }

    info!(group_id, by = %user.username, "Group deleted");

    Ok(Json(MessageResponse::new(format!("Group {} deleted", group_id))))
}

pub(super) async fn list_groups(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<GroupInfo>>, ApiError> {
    require_role(&user, GROUP_ROLES)?;
    Ok(Json(groups::list_groups(state.database.pool()).await?))
}

pub(super) async fn get_group(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupInfo>, ApiError> {
    require_role(&user, GROUP_ROLES)?;

    groups::get_group(state.database.pool(), group_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::group_not_found(group_id))
}

fn duplicate_name(err: sqlx::Error, name: &str) -> ApiError {
    if db::is_unique_violation(&err) {
        ApiError::BadRequest(format!("Group '{}' already exists", name))
    } else {
        err.into()
    }
}
