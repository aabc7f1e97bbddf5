//! Browser session configuration.

use serde::{Deserialize, Serialize};

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the opaque session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Idle timeout in minutes after which a session is discarded.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
    /// Upper bound on live sessions kept in memory.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    /// Whether the session cookie is marked `Secure`.
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            idle_timeout_minutes: default_idle_timeout(),
            max_sessions: default_max_sessions(),
            secure_cookie: false,
        }
    }
}

fn default_cookie_name() -> String {
    "shopdash_session".to_string()
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_max_sessions() -> u64 {
    10_000
}
