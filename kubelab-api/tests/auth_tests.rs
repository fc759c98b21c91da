//! Account, token and role tests against the full router
//!
//! Run with: cargo test --test auth_tests

mod common;

use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;
use kubelab_api::db;
use kubelab_common::Role;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_register_twice_keeps_one_row() {
    let app = TestApp::new().await;

    assert_eq!(app.register("alice", "pw").await, StatusCode::CREATED);
    assert_eq!(app.register("alice", "other").await, StatusCode::BAD_REQUEST);

    let count = db::users::count_users(app.state.database.pool()).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::POST, "/register", None, Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    assert_eq!(app.register("Not_Valid", "pw").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_returns_token_and_role() {
    let app = TestApp::new().await;
    app.register("alice", "pw").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "alice", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "undefined");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = app
        .request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/pods", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::GET, "/pods", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_not_found() {
    let app = TestApp::new().await;
    let token = app.user_with_role("alice", Role::Student).await;

    sqlx::query("DELETE FROM users WHERE username = 'alice'")
        .execute(app.state.database.pool())
        .await
        .unwrap();

    let (status, body) = app.request(Method::GET, "/pods", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_undefined_role_is_forbidden() {
    let app = TestApp::new().await;
    app.register("alice", "pw").await;
    let token = app.login("alice", "pw").await;

    let (status, body) = app.request(Method::GET, "/pods", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_change_role_requires_admin() {
    let app = TestApp::new().await;
    let teacher = app.user_with_role("tina", Role::Teacher).await;
    app.register("bob", "pw").await;
    let bob_id = app.user_id("bob").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/change_role",
            Some(&teacher),
            Some(json!({ "user_id": bob_id, "role": "teacher" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let bob = db::users::get_user(app.state.database.pool(), bob_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob.role, Role::Undefined);
}

#[tokio::test]
async fn test_admin_changes_role() {
    let app = TestApp::new().await;
    assert!(app.state.auth.ensure_bootstrap_admin("root-pw").await.unwrap());
    let admin = app.login("admin", "root-pw").await;

    app.register("bob", "pw").await;
    let bob_id = app.user_id("bob").await;
    let bob_token = app.login("bob", "pw").await;

    let (status, _) = app.request(Method::GET, "/pods", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            "/change_role",
            Some(&admin),
            Some(json!({ "user_id": bob_id, "role": "student" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::POST,
            "/change_role",
            Some(&admin),
            Some(json!({ "user_id": bob_id, "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::POST,
            "/change_role",
            Some(&admin),
            Some(json!({ "user_id": 4242, "role": "teacher" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bob = db::users::get_user(app.state.database.pool(), bob_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob.role, Role::Student);

    // Roles are read per request, so the old token picks up the change
    let (status, _) = app.request(Method::GET, "/pods", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_preflight_answered_with_cors_headers() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/pods")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
