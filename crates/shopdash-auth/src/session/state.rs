//! Per-browser session state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shopdash_core::types::Credentials;

/// The authenticated part of a session. Present as a whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Engine login used for every later connection.
    pub credentials: Credentials,
    /// Resolved role identifier.
    pub role: String,
    /// Human-readable role name.
    pub display_name: String,
    /// When the login succeeded.
    pub authenticated_at: DateTime<Utc>,
}

/// State kept for one browser session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Session identifier carried in the session cookie.
    pub id: Uuid,
    identity: Option<AuthenticatedIdentity>,
    table_cache: Option<Vec<String>>,
    /// When the session was first seen.
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// A fresh, unauthenticated session.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            identity: None,
            table_cache: None,
            created_at: Utc::now(),
        }
    }

    /// Whether a login has succeeded in this session.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The authenticated identity, if any.
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.identity.as_ref()
    }

    /// Stores a verified identity and its role in one step.
    ///
    /// Any table list cached for a previous identity is discarded.
    pub fn login(&mut self, credentials: Credentials, role: &str, display_name: &str) {
        self.identity = Some(AuthenticatedIdentity {
            credentials,
            role: role.to_string(),
            display_name: display_name.to_string(),
            authenticated_at: Utc::now(),
        });
        self.table_cache = None;
    }

    /// Clears every field, leaving only the identifier.
    pub fn logout(&mut self) {
        *self = Self::new(self.id);
    }

    /// The stored credentials, or `defaults` when unauthenticated.
    pub fn current_connection_credentials(&self, defaults: &Credentials) -> Credentials {
        self.identity
            .as_ref()
            .map(|i| i.credentials.clone())
            .unwrap_or_else(|| defaults.clone())
    }

    /// Table list cached for the current identity.
    pub fn cached_tables(&self) -> Option<&[String]> {
        self.table_cache.as_deref()
    }

    /// Caches the table list for the current identity.
    pub fn cache_tables(&mut self, tables: Vec<String>) {
        self.table_cache = Some(tables);
    }

    /// Drops the cached table list so the next lookup introspects again.
    pub fn clear_table_cache(&mut self) {
        self.table_cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_sets_identity_and_role_together() {
        let mut state = SessionState::new(Uuid::new_v4());
        assert!(!state.is_authenticated());

        state.login(Credentials::new("sales_manager", "pw"), "sales_manager", "Sales Manager");
        let identity = state.identity().unwrap();
        assert_eq!(identity.role, "sales_manager");
        assert_eq!(identity.credentials.username(), "sales_manager");
    }

    #[test]
    fn test_logout_clears_everything_including_table_cache() {
        let id = Uuid::new_v4();
        let defaults = Credentials::new("guest", "");
        let mut state = SessionState::new(id);
        state.login(Credentials::new("administrator", "pw"), "administrator", "Administrator");
        state.cache_tables(vec!["orders".into()]);

        state.logout();

        assert_eq!(state.id, id);
        assert!(!state.is_authenticated());
        assert!(state.cached_tables().is_none());
        assert_eq!(state.current_connection_credentials(&defaults), defaults);
    }

    #[test]
    fn test_new_login_drops_previous_table_cache() {
        let mut state = SessionState::new(Uuid::new_v4());
        state.login(Credentials::new("administrator", "pw"), "administrator", "Administrator");
        state.cache_tables(vec!["audit_log".into(), "orders".into()]);

        state.login(Credentials::new("sales_manager", "pw"), "sales_manager", "Sales Manager");
        assert!(state.cached_tables().is_none());
    }
}
