///! Authentication middleware
///!
///! Validates the bearer token and loads the caller's account once per
///! request. Handlers read the result through the [`CurrentUser`] extension.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use kubelab_common::auth::User;
use std::sync::Arc;

/// Authenticated caller, attached by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::AuthenticationFailed)
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(ApiError::AuthenticationFailed)?;

    let user = state
        .auth
        .resolve_token(token)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    tracing::debug!(user = %user.username, role = %user.role, "Authenticated request");

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
