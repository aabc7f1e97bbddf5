//! Role catalog definitions.
//!
//! The catalog is compiled once from configuration at startup and shared
//! read-only afterwards. Each entry is keyed by the literal database login
//! name it describes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use shopdash_core::config::RoleConfig;
use shopdash_core::config::roles::ALL_MARKER;
use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_core::types::Operation;

/// A grant over a set of named things.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "names")]
pub enum Grant {
    /// Everything, including names that appear later.
    All,
    /// Exactly the listed names.
    Only(BTreeSet<String>),
}

impl Grant {
    /// Builds a grant from configuration entries, where `"*"` means all.
    pub fn from_entries(entries: &[String]) -> Self {
        if entries.iter().any(|e| e.trim() == ALL_MARKER) {
            Self::All
        } else {
            Self::Only(entries.iter().map(|e| e.trim().to_string()).collect())
        }
    }

    /// Whether `name` is covered.
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }

    /// The listed spelling of `name`, matched without regard to case.
    ///
    /// Configuration loaders may fold map keys to lower case while list
    /// values keep theirs, so operations keys are resolved through this.
    pub fn canonical(&self, name: &str) -> Option<String> {
        match self {
            Self::All => Some(name.to_string()),
            Self::Only(names) => names
                .get(name)
                .or_else(|| names.iter().find(|n| n.eq_ignore_ascii_case(name)))
                .cloned(),
        }
    }

    /// Whether this is the unrestricted grant.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(names) if names.is_empty() => write!(f, "none"),
            Self::Only(names) => {
                let list: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, "{}", list.join(", "))
            }
        }
    }
}

/// One compiled role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Role identifier, equal to the login name.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Accessible tables and views.
    pub tables: Grant,
    /// Per-table operations. Ignored when `tables` is [`Grant::All`].
    pub operations: BTreeMap<String, BTreeSet<Operation>>,
    /// Visible analytics identifiers.
    pub visualizations: Grant,
}

impl RoleDefinition {
    /// Compiles and validates one configured role.
    pub fn from_config(id: &str, config: &RoleConfig) -> AppResult<Self> {
        let tables = Grant::from_entries(&config.tables);

        let mut operations = BTreeMap::new();
        for (key, ops) in &config.operations {
            let Some(table) = tables.canonical(key) else {
                return Err(AppError::configuration(format!(
                    "Role '{id}' grants operations on '{key}', which is not in its tables"
                )));
            };
            let parsed = ops
                .iter()
                .map(|op| {
                    op.parse::<Operation>().map_err(|e| {
                        AppError::configuration(format!(
                            "Role '{id}', table '{table}': {}",
                            e.message
                        ))
                    })
                })
                .collect::<AppResult<BTreeSet<_>>>()?;
            operations.insert(table, parsed);
        }

        let display_name = if config.display_name.trim().is_empty() {
            id.to_string()
        } else {
            config.display_name.clone()
        };

        Ok(Self {
            id: id.to_string(),
            display_name,
            tables,
            operations,
            visualizations: Grant::from_entries(&config.visualizations),
        })
    }
}

/// Immutable mapping from login name to role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: BTreeMap<String, RoleDefinition>,
}

impl RoleCatalog {
    /// Compiles the configured catalog, rejecting inconsistent entries.
    pub fn from_config(roles: &BTreeMap<String, RoleConfig>) -> AppResult<Self> {
        let roles = roles
            .iter()
            .map(|(id, config)| RoleDefinition::from_config(id, config).map(|r| (id.clone(), r)))
            .collect::<AppResult<BTreeMap<_, _>>>()?;
        Ok(Self { roles })
    }

    /// Resolves a login name to its role. Role identity is the login name.
    pub fn resolve_role(&self, username: &str) -> Option<&RoleDefinition> {
        self.roles.get(username)
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the catalog defines no roles.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Role identifiers in sorted order.
    pub fn role_ids(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }
}
