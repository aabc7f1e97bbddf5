//! Session cookie middleware.
//!
//! Resolves the opaque session id from the cookie, creating a fresh
//! session when it is missing or expired, and exposes it to handlers as a
//! request extension.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use uuid::Uuid;

use shopdash_core::config::SessionConfig;

use crate::extractors::SessionId;
use crate::state::AppState;

/// Attaches a [`SessionId`] to every request, issuing a cookie when new.
pub async fn session_cookie(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session_config = &state.config.session;
    let presented = jar
        .get(&session_config.cookie_name)
        .and_then(|c| Uuid::parse_str(c.value()).ok());

    let session = state
        .session_manager
        .store()
        .get_or_create(presented)
        .await;
    let issued = presented != Some(session.id);

    request.extensions_mut().insert(SessionId(session.id));
    let response = next.run(request).await;
    // A handler that rotated the session has already set the cookie.
    if !issued || response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }

    (jar.add(session_cookie_for(session_config, session.id)), response).into_response()
}

/// The cookie carrying session `id`.
pub(crate) fn session_cookie_for(config: &SessionConfig, id: Uuid) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .build()
}
