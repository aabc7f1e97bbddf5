//! Analytics menu and chart handlers.

use axum::Json;
use axum::extract::{Path, State};

use shopdash_service::AnalyticOutput;
use shopdash_service::analytics::AnalyticSummary;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

/// GET /api/analytics
pub async fn list_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Json<ApiResponse<Vec<AnalyticSummary>>> {
    Json(ApiResponse::ok(state.analytics_service.visible(&auth)))
}

/// GET /api/analytics/{id}
pub async fn render_analytic(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AnalyticOutput>>, ApiError> {
    let output = state.analytics_service.render(&auth, &id).await?;
    Ok(Json(ApiResponse::ok(output)))
}
