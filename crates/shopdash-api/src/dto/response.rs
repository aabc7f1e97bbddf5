//! Response DTOs.

use serde::{Deserialize, Serialize};

use shopdash_core::config::AuthMode;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Database reachability with the caller's current credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealthResponse {
    /// `connected` or `unavailable`.
    pub status: String,
    /// Log-safe target description.
    pub database: String,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Session status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Whether requests run as a role.
    pub authenticated: bool,
    /// Login name.
    pub username: Option<String>,
    /// Role identifier.
    pub role: Option<String>,
    /// Role display name.
    pub display_name: Option<String>,
    /// Configured authentication mode.
    pub auth_mode: AuthMode,
}

/// Accessible tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    /// Sorted table and view names.
    pub tables: Vec<String>,
}
