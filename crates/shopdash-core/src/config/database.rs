//! Database configuration.

use serde::{Deserialize, Serialize};

use crate::types::Credentials;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    /// Embedded single-file database; credentials are not verified.
    Sqlite,
    /// Client-server database whose native grants back the role catalog.
    Mysql,
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Mysql => write!(f, "mysql"),
        }
    }
}

/// Database connection configuration.
///
/// There is no pool: every operation opens a fresh connection with the
/// caller's credentials and closes it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Engine selector.
    pub engine: DatabaseEngine,
    /// Database file path (`sqlite`).
    #[serde(default)]
    pub path: String,
    /// Server host (`mysql`).
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (`mysql`).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Schema name (`mysql`).
    #[serde(default)]
    pub name: String,
    /// Login used before authentication and in single-tenant mode.
    #[serde(default)]
    pub default_username: String,
    /// Secret paired with `default_username`.
    #[serde(default)]
    pub default_password: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// The configured fallback credential pair.
    pub fn default_credentials(&self) -> Credentials {
        Credentials::new(&self.default_username, &self.default_password)
    }

    /// A log-safe description of the target database.
    pub fn describe(&self) -> String {
        match self.engine {
            DatabaseEngine::Sqlite => format!("sqlite://{}", self.path),
            DatabaseEngine::Mysql => format!("mysql://{}:{}/{}", self.host, self.port, self.name),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_connect_timeout() -> u64 {
    10
}
