//! Health check handlers.

use axum::Json;
use axum::extract::State;
use tracing::debug;

use crate::dto::response::{ApiResponse, DatabaseHealthResponse, HealthResponse};
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/health/database
///
/// Connects with the session's current credentials (the default pair
/// before login) and runs a trivial query.
pub async fn database(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<ApiResponse<DatabaseHealthResponse>> {
    let credentials = state
        .session_manager
        .current_connection_credentials(&session.state);

    let result = match state.connector.connect(&credentials).await {
        Ok(mut conn) => {
            let pinged = conn.ping().await;
            conn.close().await;
            pinged
        }
        Err(e) => Err(e),
    };

    let (status, message) = match result {
        Ok(()) => ("connected", None),
        Err(e) => {
            debug!(error = %e, "Database health check failed");
            ("unavailable", Some(e.message))
        }
    };

    Json(ApiResponse::ok(DatabaseHealthResponse {
        status: status.to_string(),
        database: state.config.database.describe(),
        message,
    }))
}
