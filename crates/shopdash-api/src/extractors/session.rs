//! `CurrentSession` extractor: loads the state behind the session cookie.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use shopdash_auth::SessionState;
use shopdash_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Session id placed in request extensions by the session middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

/// The caller's session, authenticated or not.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// Id of the stored session. Differs from the cookie only when the
    /// cookie's session expired mid-request.
    pub id: Uuid,
    /// Stored state.
    pub state: SessionState,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionId(id) = parts
            .extensions
            .get::<SessionId>()
            .copied()
            .ok_or_else(|| AppError::session("Session middleware is not installed"))?;

        // The session may have expired since the middleware ran.
        let session = state.session_manager.store().get_or_create(Some(id)).await;
        Ok(Self {
            id: session.id,
            state: session,
        })
    }
}
