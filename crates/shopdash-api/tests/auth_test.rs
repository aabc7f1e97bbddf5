//! Integration tests for the login flow and session handling.

mod helpers;

use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode};
use serde_json::json;
use uuid::Uuid;

use shopdash_api::extractors::{CurrentSession, SessionId};

#[tokio::test]
async fn test_health_needs_no_session() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");

    let response = app.request("GET", "/api/health/database", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "connected");
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/tables", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Please log in to continue");
    assert!(response.cookie().is_some());
}

#[tokio::test]
async fn test_bad_password_is_generic_rejection() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({"username": "sales_manager", "secret": "wrong"})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_without_role_is_forbidden() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({"username": "intern", "secret": helpers::PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blank_login_is_validation_error() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({"username": "", "secret": ""})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_then_me_then_logout() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("sales_manager").await;

    let me = app.request("GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(me.body["data"]["authenticated"], true);
    assert_eq!(me.body["data"]["role"], "sales_manager");
    assert_eq!(me.body["data"]["display_name"], "Sales Manager");

    let tables = app.request("GET", "/api/tables", None, Some(&cookie)).await;
    assert_eq!(tables.status, StatusCode::OK);
    assert_eq!(tables.body["data"]["tables"], json!(["orders"]));

    let logout = app.request("POST", "/api/auth/logout", None, Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);

    let me = app.request("GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(me.body["data"]["authenticated"], false);
    assert!(me.body["data"]["role"].is_null());

    let tables = app.request("GET", "/api/tables", None, Some(&cookie)).await;
    assert_eq!(tables.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disabled_mode_runs_as_default_role() {
    let app = helpers::TestApp::with_auth_mode("disabled").await;

    let me = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(me.body["data"]["authenticated"], true);
    assert_eq!(me.body["data"]["role"], "administrator");

    let tables = app.request("GET", "/api/tables", None, None).await;
    assert_eq!(tables.body["data"]["tables"], json!(["customer", "orders"]));
}

#[tokio::test]
async fn test_login_rotates_the_session_cookie() {
    let app = helpers::TestApp::new().await;
    let anonymous = app
        .request("GET", "/api/auth/me", None, None)
        .await
        .cookie()
        .unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({"username": "sales_manager", "secret": helpers::PASSWORD})),
            Some(&anonymous),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let authenticated = response.cookie().unwrap();
    assert_ne!(authenticated, anonymous);

    let me = app.request("GET", "/api/auth/me", None, Some(&anonymous)).await;
    assert_eq!(me.body["data"]["authenticated"], false);
    let me = app.request("GET", "/api/auth/me", None, Some(&authenticated)).await;
    assert_eq!(me.body["data"]["authenticated"], true);
}

#[tokio::test]
async fn test_expired_session_resolves_to_the_live_id() {
    let app = helpers::TestApp::new().await;
    let (mut parts, _) = Request::builder()
        .uri("/api/auth/me")
        .body(())
        .unwrap()
        .into_parts();
    let expired = Uuid::new_v4();
    parts.extensions.insert(SessionId(expired));

    let session = CurrentSession::from_request_parts(&mut parts, &app.state)
        .await
        .unwrap();

    assert_ne!(session.id, expired);
    assert_eq!(session.id, session.state.id);
    assert!(
        app.state
            .session_manager
            .store()
            .get(session.id)
            .await
            .is_some()
    );
}
