//! View-state driven screen rendering.

use axum::Json;
use axum::extract::State;

use shopdash_service::{ScreenResponse, ViewState};

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

use super::tables::accessible_tables;

/// POST /api/screen
pub async fn render_screen(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(view): Json<ViewState>,
) -> Result<Json<ApiResponse<ScreenResponse>>, ApiError> {
    let tables = accessible_tables(&state, &auth).await;
    let response = state.screen_service.render(&auth, &tables, view).await?;
    if response.tables_changed {
        state
            .session_manager
            .invalidate_tables(auth.session.id)
            .await;
    }
    Ok(Json(ApiResponse::ok(response)))
}
