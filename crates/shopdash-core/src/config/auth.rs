//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// How logins are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Every login is verified by connecting to the database engine with the
    /// supplied credentials; the login name selects the role.
    #[default]
    Database,
    /// Single-tenant mode: no login screen, every request runs with the
    /// configured default credentials and [`AuthConfig::default_role`].
    Disabled,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Verification mode.
    #[serde(default)]
    pub mode: AuthMode,
    /// Role used for every request when `mode = "disabled"`.
    #[serde(default = "default_role")]
    pub default_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            default_role: default_role(),
        }
    }
}

fn default_role() -> String {
    "administrator".to_string()
}
