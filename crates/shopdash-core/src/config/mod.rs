//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod roles;
pub mod session;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::{AuthConfig, AuthMode};
pub use self::database::{DatabaseConfig, DatabaseEngine};
pub use self::logging::LoggingConfig;
pub use self::roles::RoleConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Browser session settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Role catalog keyed by login name.
    #[serde(default)]
    pub roles: BTreeMap<String, RoleConfig>,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SHOPDASH__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SHOPDASH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            engine = "sqlite"
            path = "shop.db"

            [roles.sales_manager]
            display_name = "Sales Manager"
            tables = ["orders", "customer"]
            visualizations = ["product_sales"]

            [roles.sales_manager.operations]
            orders = ["read", "update"]
            "#,
        )
        .unwrap();

        assert_eq!(config.database.engine, DatabaseEngine::Sqlite);
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.auth.mode, AuthMode::Database);
        assert_eq!(config.session.cookie_name, "shopdash_session");
        let role = &config.roles["sales_manager"];
        assert_eq!(role.tables, vec!["orders", "customer"]);
        assert_eq!(role.operations["orders"], vec!["read", "update"]);
    }

    #[test]
    fn test_missing_database_section_is_rejected() {
        let err = AppConfig::from_toml("[server]\nport = 9000\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
