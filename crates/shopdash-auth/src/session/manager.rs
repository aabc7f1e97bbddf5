//! Session lifecycle manager: login, logout, and credential lookup.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use shopdash_core::config::{AuthConfig, AuthMode};
use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_core::types::Credentials;

use crate::authenticator::Authenticator;
use crate::rbac::RoleCatalog;

use super::state::SessionState;
use super::store::SessionStore;

/// Who a request runs as: a role plus the credentials for its connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Login name.
    pub username: String,
    /// Role identifier.
    pub role: String,
    /// Human-readable role name.
    pub display_name: String,
    /// Engine credentials for every connection made on this request.
    pub credentials: Credentials,
}

/// Drives session login/logout and resolves the acting principal.
#[derive(Clone)]
pub struct SessionManager {
    /// Session persistence.
    store: SessionStore,
    /// Credential verification.
    authenticator: Arc<dyn Authenticator>,
    /// Role lookup.
    catalog: Arc<RoleCatalog>,
    /// Auth configuration.
    auth_config: AuthConfig,
    /// Pair used before login and in single-tenant mode.
    default_credentials: Credentials,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("mode", &self.auth_config.mode)
            .field("roles", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        store: SessionStore,
        authenticator: Arc<dyn Authenticator>,
        catalog: Arc<RoleCatalog>,
        auth_config: AuthConfig,
        default_credentials: Credentials,
    ) -> Self {
        Self {
            store,
            authenticator,
            catalog,
            auth_config,
            default_credentials,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The configured authentication mode.
    pub fn mode(&self) -> AuthMode {
        self.auth_config.mode
    }

    /// Verifies a login and records it in a freshly issued session.
    ///
    /// Bad credentials and an unreachable engine produce the same generic
    /// authentication error. A login the engine accepts but the catalog does
    /// not know is an authorization error. In neither case is the session
    /// modified. On success the pre-login session is discarded and the
    /// returned state carries a new id, so a cookie handed out before
    /// authentication never becomes an authenticated one.
    pub async fn login(&self, session_id: Uuid, username: &str, secret: &str) -> AppResult<SessionState> {
        if username.trim().is_empty() || secret.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        let credentials = Credentials::new(username.trim(), secret);
        if !self.authenticator.authenticate(&credentials).await {
            warn!(username = %credentials.username(), "Login rejected");
            return Err(AppError::authentication("Invalid username or password"));
        }

        let Some(role) = self.catalog.resolve_role(credentials.username()) else {
            warn!(username = %credentials.username(), "Login has no role in the catalog");
            return Err(AppError::authorization(format!(
                "User '{}' authenticated but has no assigned role",
                credentials.username()
            )));
        };

        let mut state = SessionState::new(Uuid::new_v4());
        state.login(credentials, &role.id, &role.display_name);
        self.store.put(state.clone()).await;
        self.store.remove(session_id).await;

        info!(session_id = %state.id, role = %role.id, "Login succeeded");
        Ok(state)
    }

    /// Clears the session so the next request is unauthenticated.
    pub async fn logout(&self, session_id: Uuid) -> SessionState {
        let mut state = self.store.get_or_create(Some(session_id)).await;
        let role = state.identity().map(|i| i.role.clone());
        state.logout();
        self.store.put(state.clone()).await;

        if let Some(role) = role {
            info!(session_id = %state.id, role = %role, "Logged out");
        }
        state
    }

    /// Credentials for the next connection made on behalf of `state`.
    pub fn current_connection_credentials(&self, state: &SessionState) -> Credentials {
        match self.auth_config.mode {
            AuthMode::Disabled => self.default_credentials.clone(),
            AuthMode::Database => state.current_connection_credentials(&self.default_credentials),
        }
    }

    /// The acting principal, or `None` when the session is not logged in.
    ///
    /// In single-tenant mode every session acts as the configured default
    /// role with the default credentials.
    pub fn principal(&self, state: &SessionState) -> Option<Principal> {
        match self.auth_config.mode {
            AuthMode::Disabled => {
                let role = &self.auth_config.default_role;
                let display_name = self
                    .catalog
                    .resolve_role(role)
                    .map(|r| r.display_name.clone())
                    .unwrap_or_else(|| role.clone());
                Some(Principal {
                    username: self.default_credentials.username().to_string(),
                    role: role.clone(),
                    display_name,
                    credentials: self.default_credentials.clone(),
                })
            }
            AuthMode::Database => state.identity().map(|identity| Principal {
                username: identity.credentials.username().to_string(),
                role: identity.role.clone(),
                display_name: identity.display_name.clone(),
                credentials: identity.credentials.clone(),
            }),
        }
    }

    /// Like [`Self::principal`], failing with an authentication error.
    pub fn require_principal(&self, state: &SessionState) -> AppResult<Principal> {
        self.principal(state)
            .ok_or_else(|| AppError::authentication("Please log in to continue"))
    }

    /// Stores a table list on the session for the current identity.
    pub async fn cache_tables(&self, session_id: Uuid, tables: Vec<String>) {
        if let Some(mut state) = self.store.get(session_id).await {
            state.cache_tables(tables);
            self.store.put(state).await;
        }
    }

    /// Forgets the session's cached table list.
    pub async fn invalidate_tables(&self, session_id: Uuid) {
        if let Some(mut state) = self.store.get(session_id).await {
            state.clear_table_cache();
            self.store.put(state).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use shopdash_core::config::{RoleConfig, SessionConfig};
    use shopdash_core::error::ErrorKind;

    use super::*;

    /// Accepts exactly one password for every login.
    struct FixedPassword(&'static str);

    #[async_trait]
    impl Authenticator for FixedPassword {
        async fn authenticate(&self, credentials: &Credentials) -> bool {
            credentials.secret() == self.0
        }
    }

    fn manager(mode: AuthMode) -> SessionManager {
        let mut roles = BTreeMap::new();
        roles.insert(
            "sales_manager".to_string(),
            RoleConfig {
                display_name: "Sales Manager".into(),
                tables: vec!["orders".into()],
                operations: BTreeMap::new(),
                visualizations: vec![],
            },
        );
        roles.insert(
            "administrator".to_string(),
            RoleConfig {
                display_name: "Administrator".into(),
                tables: vec!["*".into()],
                operations: BTreeMap::new(),
                visualizations: vec!["*".into()],
            },
        );
        SessionManager::new(
            SessionStore::new(&SessionConfig::default()),
            Arc::new(FixedPassword("correct")),
            Arc::new(RoleCatalog::from_config(&roles).unwrap()),
            AuthConfig {
                mode,
                default_role: "administrator".into(),
            },
            Credentials::new("guest", "guest"),
        )
    }

    #[tokio::test]
    async fn test_successful_login_populates_session() {
        let mgr = manager(AuthMode::Database);
        let session = mgr.store().get_or_create(None).await;

        let state = mgr.login(session.id, "sales_manager", "correct").await.unwrap();
        assert_eq!(mgr.store().get(state.id).await.unwrap().identity(), state.identity());
        let principal = mgr.principal(&state).unwrap();
        assert_eq!(principal.role, "sales_manager");
        assert_eq!(principal.display_name, "Sales Manager");
        assert_eq!(mgr.current_connection_credentials(&state).username(), "sales_manager");
    }

    #[tokio::test]
    async fn test_bad_password_leaves_session_untouched() {
        let mgr = manager(AuthMode::Database);
        let session = mgr.store().get_or_create(None).await;

        let err = mgr.login(session.id, "sales_manager", "wrong").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        let stored = mgr.store().get(session.id).await.unwrap();
        assert!(!stored.is_authenticated());
    }

    #[tokio::test]
    async fn test_unrolled_login_is_rejected_distinctly() {
        let mgr = manager(AuthMode::Database);
        let session = mgr.store().get_or_create(None).await;

        let err = mgr.login(session.id, "warehouse_bot", "correct").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(!mgr.store().get(session.id).await.unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_equals_never_authenticated() {
        let mgr = manager(AuthMode::Database);
        let fresh = mgr.store().get_or_create(None).await;
        let session = mgr.store().get_or_create(None).await;
        let session = mgr.login(session.id, "administrator", "correct").await.unwrap();
        mgr.cache_tables(session.id, vec!["audit_log".into()]).await;

        let state = mgr.logout(session.id).await;

        assert_eq!(mgr.principal(&state), mgr.principal(&fresh));
        assert!(mgr.require_principal(&state).is_err());
        assert_eq!(
            mgr.current_connection_credentials(&state),
            mgr.current_connection_credentials(&fresh)
        );
        assert!(mgr.store().get(session.id).await.unwrap().cached_tables().is_none());
    }

    #[tokio::test]
    async fn test_invalidated_tables_are_forgotten() {
        let mgr = manager(AuthMode::Database);
        let session = mgr.store().get_or_create(None).await;
        let session = mgr.login(session.id, "administrator", "correct").await.unwrap();
        mgr.cache_tables(session.id, vec!["orders".into()]).await;

        mgr.invalidate_tables(session.id).await;

        let stored = mgr.store().get(session.id).await.unwrap();
        assert!(stored.cached_tables().is_none());
        assert!(stored.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_issues_a_new_session_id() {
        let mgr = manager(AuthMode::Database);
        let anonymous = mgr.store().get_or_create(None).await;

        let state = mgr.login(anonymous.id, "sales_manager", "correct").await.unwrap();

        assert_ne!(state.id, anonymous.id);
        assert!(mgr.store().get(anonymous.id).await.is_none());
        assert!(mgr.store().get(state.id).await.unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_disabled_mode_uses_default_role() {
        let mgr = manager(AuthMode::Disabled);
        let session = mgr.store().get_or_create(None).await;

        let principal = mgr.require_principal(&session).unwrap();
        assert_eq!(principal.role, "administrator");
        assert_eq!(principal.credentials.username(), "guest");
    }
}
