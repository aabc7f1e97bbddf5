//! CSV download.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

/// GET /api/tables/{table}/export
pub async fn export_csv(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
) -> Result<Response, ApiError> {
    let export = state.crud_service.export(&auth, &table).await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response())
}
