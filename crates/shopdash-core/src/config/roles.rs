//! Role catalog configuration as written in TOML.
//!
//! The raw form is validated and compiled into an immutable catalog by
//! `shopdash-auth` at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Marker used in `tables` and `visualizations` to grant everything.
pub const ALL_MARKER: &str = "*";

/// One role entry, keyed in [`super::AppConfig::roles`] by login name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Human-readable role name.
    pub display_name: String,
    /// Accessible tables and views, or `["*"]` for all of them.
    #[serde(default)]
    pub tables: Vec<String>,
    /// Table name to permitted operations (`create`, `read`, `update`, `delete`).
    #[serde(default)]
    pub operations: BTreeMap<String, Vec<String>>,
    /// Visible analytics identifiers, or `["*"]` for all of them.
    #[serde(default)]
    pub visualizations: Vec<String>,
}
