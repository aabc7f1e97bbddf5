//! Accessible table listing.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, TablesResponse};
use crate::extractors::AuthContext;
use crate::state::AppState;

/// The caller's accessible tables, cached on the session once non-empty.
pub(crate) async fn accessible_tables(state: &AppState, auth: &AuthContext) -> Vec<String> {
    if let Some(cached) = auth.session.state.cached_tables() {
        return cached.to_vec();
    }

    let tables = state
        .rbac
        .accessible_tables(&auth.role, state.introspector.as_ref(), &auth.credentials)
        .await;
    if !tables.is_empty() {
        state
            .session_manager
            .cache_tables(auth.session.id, tables.clone())
            .await;
    }
    tables
}

/// GET /api/tables
pub async fn list_tables(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Json<ApiResponse<TablesResponse>> {
    let tables = accessible_tables(&state, &auth).await;
    Json(ApiResponse::ok(TablesResponse { tables }))
}
