//! Route definitions for the ShopDash HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to every handler via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(table_routes())
        .merge(screen_routes())
        .merge(analytics_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session::session_cookie,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness and database reachability
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/database", get(handlers::health::database))
}

/// Login, logout, session status
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Table listing, CRUD forms and submits, export
fn table_routes() -> Router<AppState> {
    Router::new()
        .route("/tables", get(handlers::tables::list_tables))
        .route(
            "/tables/{table}/rows",
            get(handlers::crud::read_rows)
                .post(handlers::crud::create_row)
                .put(handlers::crud::update_row),
        )
        .route(
            "/tables/{table}/rows/delete",
            post(handlers::crud::delete_row),
        )
        .route(
            "/tables/{table}/forms/create",
            get(handlers::crud::create_form),
        )
        .route(
            "/tables/{table}/forms/update",
            get(handlers::crud::update_form),
        )
        .route(
            "/tables/{table}/forms/delete",
            get(handlers::crud::delete_preview),
        )
        .route("/tables/{table}/export", get(handlers::export::export_csv))
}

/// View-state driven screens
fn screen_routes() -> Router<AppState> {
    Router::new().route("/screen", post(handlers::screen::render_screen))
}

/// Analytics menu and charts
fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(handlers::analytics::list_analytics))
        .route("/analytics/{id}", get(handlers::analytics::render_analytic))
}
