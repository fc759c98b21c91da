///! Authentication and account management

pub mod password;
pub mod token;

use crate::db::{self, Database};
use crate::error::ApiError;
use crate::validation;
use kubelab_common::auth::{
    ChangeRoleRequest, LoginRequest, LoginResponse, RegisterRequest, User,
};
use kubelab_common::Role;
use std::sync::Arc;
use token::TokenIssuer;

/// Username of the account created on an empty database
pub const BOOTSTRAP_ADMIN: &str = "admin";

/// Account operations backed by the users table
#[derive(Clone)]
pub struct AuthManager {
    database: Arc<Database>,
    tokens: TokenIssuer,
}

impl AuthManager {
    pub fn new(database: Arc<Database>, tokens: TokenIssuer) -> Self {
        Self { database, tokens }
    }

    /// Create an account with role `undefined`
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let username = validation::required(request.username.as_deref(), "username")?;
        let password = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::missing_field("password"))?;

        validation::validate_username(username)?;
        validation::validate_password(password)?;

        let password_hash = password::hash_password(password)?;

        let id = db::users::create_user(self.database.pool(), username, &password_hash, Role::Undefined)
            .await
            .map_err(|e| {
                if db::is_unique_violation(&e) {
                    ApiError::BadRequest(format!("User '{}' already exists", username))
                } else {
                    e.into()
                }
            })?;

        tracing::info!(user = %username, "User registered");

        Ok(User {
            id,
            username: username.to_string(),
            password_hash,
            role: Role::Undefined,
        })
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let (Some(username), Some(password)) =
            (request.username.as_deref(), request.password.as_deref())
        else {
            return Err(ApiError::AuthenticationFailed);
        };

        let user = match db::users::get_user_by_username(self.database.pool(), username.trim()).await? {
            Some(user) => user,
            None => {
                password::verify_unknown_user(password);
                tracing::info!(user = %username, "Login failed: unknown user");
                return Err(ApiError::AuthenticationFailed);
            }
        };

        if !password::verify_password(password, &user.password_hash) {
            tracing::info!(user = %user.username, "Login failed: bad password");
            return Err(ApiError::AuthenticationFailed);
        }

        let token = self
            .tokens
            .issue(&user.username)
            .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

        tracing::info!(user = %user.username, role = %user.role, "User logged in");

        Ok(LoginResponse {
            token,
            role: user.role,
        })
    }

    /// Resolve a bearer token to its user
    ///
    /// `Ok(None)` means the token was valid but the account no longer exists.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<User>, ApiError> {
        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            ApiError::AuthenticationFailed
        })?;

        Ok(db::users::get_user_by_username(self.database.pool(), &claims.sub).await?)
    }

    /// Set another account's role to student or teacher
    pub async fn change_role(&self, actor: &User, request: &ChangeRoleRequest) -> Result<Role, ApiError> {
        let user_id = request.user_id.ok_or_else(|| ApiError::missing_field("user_id"))?;
        let role_name = validation::required(request.role.as_deref(), "role")?;

        let role: Role = role_name
            .parse()
            .ok()
            .filter(Role::is_assignable)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Invalid role '{}': must be 'student' or 'teacher'",
                    role_name
                ))
            })?;

        if !db::users::update_role(self.database.pool(), user_id, role).await? {
            return Err(ApiError::user_not_found());
        }

        tracing::info!(admin = %actor.username, target = user_id, role = %role, "Role changed");

        Ok(role)
    }

    /// Create the admin account when no users exist yet
    pub async fn ensure_bootstrap_admin(&self, admin_password: &str) -> Result<bool, ApiError> {
        if db::users::count_users(self.database.pool()).await? > 0 {
            return Ok(false);
        }

        let password_hash = password::hash_password(admin_password)?;
        db::users::create_user(self.database.pool(), BOOTSTRAP_ADMIN, &password_hash, Role::Admin).await?;

        tracing::info!(user = BOOTSTRAP_ADMIN, "Created bootstrap admin account");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;

    async fn manager() -> AuthManager {
        AuthManager::new(Arc::new(test_database().await), TokenIssuer::new("test-secret", 1))
    }

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let auth = manager().await;
        let user = auth.register(&register_request("alice", "pw")).await.unwrap();
        assert_eq!(user.role, Role::Undefined);

        let response = auth
            .login(&LoginRequest {
                username: Some("alice".to_string()),
                password: Some("pw".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.role, Role::Undefined);

        let resolved = auth.resolve_token(&response.token).await.unwrap().unwrap();
        assert_eq!(resolved.username, "alice");
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let auth = manager().await;
        auth.register(&register_request("alice", "pw")).await.unwrap();

        let err = auth.register(&register_request("alice", "other")).await.unwrap_err();
        assert_eq!(err.to_error_response().status, 400);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let auth = manager().await;
        let missing = RegisterRequest {
            username: Some("alice".to_string()),
            password: None,
        };
        assert_eq!(auth.register(&missing).await.unwrap_err().to_error_response().status, 400);
        assert_eq!(
            auth.register(&register_request("Alice!", "pw")).await.unwrap_err().to_error_response().status,
            400
        );
    }

    #[tokio::test]
    async fn test_login_failures() {
        let auth = manager().await;
        auth.register(&register_request("alice", "pw")).await.unwrap();

        for (username, password) in [("alice", "wrong"), ("nobody", "pw")] {
            let err = auth
                .login(&LoginRequest {
                    username: Some(username.to_string()),
                    password: Some(password.to_string()),
                })
                .await
                .unwrap_err();
            assert_eq!(err.to_error_response().status, 401);
        }
    }

    #[tokio::test]
    async fn test_change_role() {
        let auth = manager().await;
        assert!(auth.ensure_bootstrap_admin("root-pw").await.unwrap());
        let admin = db::users::get_user_by_username(auth.database.pool(), BOOTSTRAP_ADMIN)
            .await
            .unwrap()
            .unwrap();
        let alice = auth.register(&register_request("alice", "pw")).await.unwrap();

        let request = ChangeRoleRequest {
            user_id: Some(alice.id),
            role: Some("teacher".to_string()),
        };
        assert_eq!(auth.change_role(&admin, &request).await.unwrap(), Role::Teacher);

        let request = ChangeRoleRequest {
            user_id: Some(alice.id),
            role: Some("admin".to_string()),
        };
        assert_eq!(auth.change_role(&admin, &request).await.unwrap_err().to_error_response().status, 400);

        let request = ChangeRoleRequest {
            user_id: Some(9999),
            role: Some("student".to_string()),
        };
        assert_eq!(auth.change_role(&admin, &request).await.unwrap_err().to_error_response().status, 404);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_once() {
        let auth = manager().await;
        assert!(auth.ensure_bootstrap_admin("pw").await.unwrap());
        assert!(!auth.ensure_bootstrap_admin("pw").await.unwrap());

        let admin = db::users::get_user_by_username(auth.database.pool(), BOOTSTRAP_ADMIN)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
