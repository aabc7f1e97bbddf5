//! Request context carrying the acting principal and its session.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shopdash_auth::Principal;
use shopdash_core::types::Credentials;

/// Context for the current request.
///
/// Built by the HTTP layer from the session and passed into service methods
/// so that every operation knows *which role* is acting and *which login*
/// its connections use.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The current session ID.
    pub session_id: Uuid,
    /// Login name.
    pub username: String,
    /// Role identifier checked against the catalog.
    pub role: String,
    /// Human-readable role name.
    pub role_display_name: String,
    /// Engine credentials for this request's connections.
    pub credentials: Credentials,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for `principal` acting in `session_id`.
    pub fn new(session_id: Uuid, principal: Principal) -> Self {
        Self {
            session_id,
            username: principal.username,
            role: principal.role,
            role_display_name: principal.display_name,
            credentials: principal.credentials,
            request_time: Utc::now(),
        }
    }
}
