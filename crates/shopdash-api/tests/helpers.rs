//! Shared test helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use shopdash_api::{AppState, build_app, build_state};
use shopdash_auth::Authenticator;
use shopdash_core::config::AppConfig;
use shopdash_core::types::Credentials;
use shopdash_database::{Connector, Statement};

/// Password every stub login accepts.
pub const PASSWORD: &str = "pw";

/// Accepts any login presenting [`PASSWORD`].
struct StubAuthenticator;

#[async_trait]
impl Authenticator for StubAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> bool {
        credentials.secret() == PASSWORD
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Connector for direct setup queries
    pub connector: Arc<Connector>,
    /// Shared state behind the router
    pub state: AppState,
    _dir: tempfile::TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Vec<u8>,
    /// Parsed JSON body, `Null` when not JSON
    pub body: Value,
}

impl TestResponse {
    /// `name=value` of a cookie issued by this response.
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

impl TestApp {
    /// App with database-backed logins.
    pub async fn new() -> Self {
        Self::with_auth_mode("database").await
    }

    /// App with the given `auth.mode`.
    pub async fn with_auth_mode(mode: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("shop.db");
        std::fs::File::create(&path).expect("Failed to create database file");

        let config = AppConfig::from_toml(&format!(
            r#"
            [database]
            engine = "sqlite"
            path = '{}'

            [auth]
            mode = "{mode}"
            default_role = "administrator"

            [roles.administrator]
            display_name = "Administrator"
            tables = ["*"]
            visualizations = ["*"]

            [roles.sales_manager]
            display_name = "Sales Manager"
            tables = ["orders"]
            visualizations = ["order_distribution"]

            [roles.sales_manager.operations]
            orders = ["read", "update"]
            "#,
            path.display()
        ))
        .expect("Failed to parse test config");

        let state = build_state(config, Arc::new(StubAuthenticator)).expect("Failed to build state");
        let connector = Arc::clone(&state.connector);

        let app = Self {
            router: build_app(state.clone()),
            connector,
            state,
            _dir: dir,
        };
        app.execute(
            "CREATE TABLE customer (
                CustomerID INTEGER PRIMARY KEY AUTOINCREMENT,
                FirstName TEXT NOT NULL,
                Gender TEXT CHECK(Gender IN ('Male', 'Female')),
                DOB DATE
            )",
        )
        .await;
        app.execute(
            "CREATE TABLE orders (
                OrderID INTEGER PRIMARY KEY,
                OrderDate DATE,
                TotalAmount REAL,
                ShippingFee REAL
            )",
        )
        .await;
        app
    }

    /// Runs one statement directly against the test database.
    pub async fn execute(&self, sql: &str) {
        let mut conn = self
            .connector
            .connect(&Credentials::new("", ""))
            .await
            .expect("Failed to connect");
        conn.execute(&Statement::raw(sql))
            .await
            .expect("Failed to execute setup statement");
        conn.close().await;
    }

    /// Sends one request, optionally carrying a session cookie.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }

    /// Logs in as `username` and returns the session cookie.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({"username": username, "secret": PASSWORD})),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.cookie().expect("Login did not issue a session cookie")
    }
}
