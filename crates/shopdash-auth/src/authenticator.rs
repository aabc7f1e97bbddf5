//! Credential verification delegated to the database engine.
//!
//! There is no local password store. A login is valid exactly when the
//! engine accepts it: a connection opened with the literal credentials must
//! succeed and answer `SELECT 1`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use shopdash_core::types::Credentials;
use shopdash_database::Connector;

/// Verifies a claimed identity.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns whether the engine accepts `credentials`.
    ///
    /// Every failure cause collapses into `false`.
    async fn authenticate(&self, credentials: &Credentials) -> bool;
}

/// Authenticator that opens a real connection per attempt.
#[derive(Debug, Clone)]
pub struct DatabaseAuthenticator {
    connector: Arc<Connector>,
}

impl DatabaseAuthenticator {
    /// Creates an authenticator over the given connector.
    pub fn new(connector: Arc<Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl Authenticator for DatabaseAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> bool {
        let mut conn = match self.connector.connect(credentials).await {
            Ok(conn) => conn,
            Err(e) => {
                debug!(username = %credentials.username(), error = %e, "Login connection refused");
                return false;
            }
        };

        let verified = match conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!(username = %credentials.username(), error = %e, "Login probe query failed");
                false
            }
        };
        conn.close().await;

        if verified {
            info!(username = %credentials.username(), "Engine accepted credentials");
        }
        verified
    }
}

#[cfg(test)]
mod tests {
    use shopdash_core::config::{DatabaseConfig, DatabaseEngine};

    use super::*;

    fn connector(path: &str) -> Arc<Connector> {
        Arc::new(Connector::new(DatabaseConfig {
            engine: DatabaseEngine::Sqlite,
            path: path.to_string(),
            host: "localhost".into(),
            port: 3306,
            name: String::new(),
            default_username: String::new(),
            default_password: String::new(),
            connect_timeout_seconds: 5,
        }))
    }

    #[tokio::test]
    async fn test_unreachable_database_is_plain_false() {
        let auth = DatabaseAuthenticator::new(connector("/nonexistent/dir/shop.db"));
        assert!(!auth.authenticate(&Credentials::new("admin", "pw")).await);
    }

    #[tokio::test]
    async fn test_reachable_database_accepts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        std::fs::File::create(&path).unwrap();

        let auth = DatabaseAuthenticator::new(connector(path.to_str().unwrap()));
        assert!(auth.authenticate(&Credentials::new("admin", "pw")).await);
    }
}
