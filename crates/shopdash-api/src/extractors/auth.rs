//! `AuthContext` extractor: resolves the acting principal from the session.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use shopdash_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

use super::session::CurrentSession;

/// Request context of a logged-in caller (or the default role in
/// single-tenant mode). Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Context handed to services.
    pub ctx: RequestContext,
    /// The session it came from.
    pub session: CurrentSession,
}

impl std::ops::Deref for AuthContext {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        let principal = state.session_manager.require_principal(&session.state)?;

        Ok(Self {
            ctx: RequestContext::new(session.id, principal),
            session,
        })
    }
}
