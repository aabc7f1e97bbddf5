//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use shopdash_auth::{RbacEnforcer, SessionManager};
use shopdash_core::config::AppConfig;
use shopdash_database::{Connector, SchemaIntrospector};
use shopdash_service::{AnalyticsService, CrudService, ScreenService};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Connection factory.
    pub connector: Arc<Connector>,
    /// Schema discovery.
    pub introspector: Arc<dyn SchemaIntrospector>,
    /// Permission checks.
    pub rbac: Arc<RbacEnforcer>,
    /// Session lifecycle.
    pub session_manager: Arc<SessionManager>,
    /// Table screens.
    pub crud_service: Arc<CrudService>,
    /// Canned analytics.
    pub analytics_service: Arc<AnalyticsService>,
    /// View-state dispatch.
    pub screen_service: Arc<ScreenService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("database", &self.config.database.describe())
            .field("session_manager", &self.session_manager)
            .finish_non_exhaustive()
    }
}
