//! Auth handlers: login, logout, me.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;

use crate::dto::request::{LoginRequest, validated};
use crate::dto::response::{ApiResponse, MessageResponse, SessionResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::middleware::session::session_cookie_for;
use crate::state::AppState;

fn session_response(state: &AppState, session: &shopdash_auth::SessionState) -> SessionResponse {
    let principal = state.session_manager.principal(session);
    SessionResponse {
        authenticated: principal.is_some(),
        username: principal.as_ref().map(|p| p.username.clone()),
        role: principal.as_ref().map(|p| p.role.clone()),
        display_name: principal.map(|p| p.display_name),
        auth_mode: state.session_manager.mode(),
    }
}

/// POST /api/auth/login
///
/// A successful login moves the caller to a new session id and reissues
/// the cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    session: CurrentSession,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let req = validated(req)?;
    let updated = state
        .session_manager
        .login(session.id, &req.username, &req.secret)
        .await?;

    let jar = jar.add(session_cookie_for(&state.config.session, updated.id));
    Ok((jar, Json(ApiResponse::ok(session_response(&state, &updated)))))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<ApiResponse<MessageResponse>> {
    state.session_manager.logout(session.id).await;

    Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(session_response(&state, &session.state)))
}
