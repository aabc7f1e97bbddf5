//! Table CRUD handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use shopdash_core::types::CellValue;
use shopdash_service::crud::DeletePreview;
use shopdash_service::{DeleteSelector, FormDescription, OperationOutcome, ReadResult};

use crate::dto::request::{DeleteQuery, DeleteRequest, RowQuery, UpdateRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

/// GET /api/tables/{table}/rows
pub async fn read_rows(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
) -> Result<Json<ApiResponse<ReadResult>>, ApiError> {
    let result = state.crud_service.read(&auth, &table).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/tables/{table}/forms/create
pub async fn create_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
) -> Result<Json<ApiResponse<FormDescription>>, ApiError> {
    let form = state.crud_service.create_form(&auth, &table).await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// POST /api/tables/{table}/rows
pub async fn create_row(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
    Json(values): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<Json<ApiResponse<OperationOutcome>>, ApiError> {
    let outcome = state.crud_service.create(&auth, &table, &values).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/tables/{table}/forms/update?row=N
pub async fn update_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
    Query(query): Query<RowQuery>,
) -> Result<Json<ApiResponse<FormDescription>>, ApiError> {
    let form = state
        .crud_service
        .update_form(&auth, &table, query.row)
        .await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// PUT /api/tables/{table}/rows
pub async fn update_row(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<ApiResponse<OperationOutcome>>, ApiError> {
    let outcome = state
        .crud_service
        .update(&auth, &table, &req.key, &req.values)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/tables/{table}/forms/delete?row=N | ?key=V
pub async fn delete_preview(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<DeletePreview>>, ApiError> {
    let selector = match query.key {
        Some(key) => DeleteSelector::Key(CellValue::Text(key)),
        None => DeleteSelector::Index(query.row.unwrap_or(0)),
    };
    let preview = state
        .crud_service
        .delete_preview(&auth, &table, &selector)
        .await?;
    Ok(Json(ApiResponse::ok(preview)))
}

/// POST /api/tables/{table}/rows/delete
pub async fn delete_row(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(table): Path<String>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<ApiResponse<OperationOutcome>>, ApiError> {
    let outcome = state
        .crud_service
        .delete(&auth, &table, &req.key, req.confirmed)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
