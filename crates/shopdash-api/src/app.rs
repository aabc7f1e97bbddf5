//! Application builder: wires router, middleware, and state into an Axum app.

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use shopdash_auth::{
    Authenticator, DatabaseAuthenticator, RbacEnforcer, RoleCatalog, SessionManager, SessionStore,
};
use shopdash_core::config::{AppConfig, AuthMode, DatabaseEngine};
use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_database::{Connector, EngineIntrospector, SchemaIntrospector};
use shopdash_service::{AnalyticsService, CrudService, ScreenService};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Wires services together around `authenticator`.
///
/// Fails when the role catalog is inconsistent, or when single-tenant mode
/// names a default role the catalog does not define.
pub fn build_state(config: AppConfig, authenticator: Arc<dyn Authenticator>) -> AppResult<AppState> {
    let catalog = Arc::new(RoleCatalog::from_config(&config.roles)?);
    info!(roles = catalog.len(), "Role catalog loaded");

    if config.auth.mode == AuthMode::Disabled
        && catalog.resolve_role(&config.auth.default_role).is_none()
    {
        return Err(AppError::configuration(format!(
            "auth.default_role '{}' is not defined in [roles]",
            config.auth.default_role
        )));
    }
    if config.auth.mode == AuthMode::Database && config.database.engine == DatabaseEngine::Sqlite {
        warn!("SQLite does not verify credentials; every login with a known role will succeed");
    }

    let connector = Arc::new(Connector::new(config.database.clone()));
    let introspector: Arc<dyn SchemaIntrospector> =
        Arc::new(EngineIntrospector::new(Arc::clone(&connector)));
    let rbac = Arc::new(RbacEnforcer::new(Arc::clone(&catalog)));

    let session_manager = Arc::new(SessionManager::new(
        SessionStore::new(&config.session),
        authenticator,
        Arc::clone(&catalog),
        config.auth.clone(),
        config.database.default_credentials(),
    ));

    let crud = CrudService::new(
        Arc::clone(&connector),
        Arc::clone(&introspector),
        Arc::clone(&rbac),
    );
    let analytics = AnalyticsService::new(Arc::clone(&connector), Arc::clone(&rbac));
    let screens = ScreenService::new(crud.clone(), analytics.clone(), Arc::clone(&rbac));

    Ok(AppState {
        config: Arc::new(config),
        connector,
        introspector,
        rbac,
        session_manager,
        crud_service: Arc::new(crud),
        analytics_service: Arc::new(analytics),
        screen_service: Arc::new(screens),
    })
}

/// Runs the ShopDash server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!("Starting ShopDash server...");

    let connector = Arc::new(Connector::new(config.database.clone()));
    let authenticator: Arc<dyn Authenticator> = Arc::new(DatabaseAuthenticator::new(connector));
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = build_app(build_state(config, authenticator)?);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(address = %addr, "ShopDash server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("ShopDash server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
