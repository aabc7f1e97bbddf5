//! Schema discovery: tables, columns, and primary keys.
//!
//! Every identifier later interpolated into SQL must have come back from
//! here first.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_core::types::Credentials;

use crate::connection::{Connector, DbConnection};

/// Numeric family of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericClass {
    /// Whole numbers.
    Integral,
    /// Real or fixed-point numbers.
    Fractional,
}

const INTEGRAL_TYPES: &[&str] = &[
    "int", "integer", "tinyint", "smallint", "mediumint", "bigint", "year",
];

const FRACTIONAL_TYPES: &[&str] = &[
    "real", "float", "double", "double precision", "decimal", "numeric", "dec", "fixed",
];

/// Classifies a declared type such as `INTEGER`, `int(11) unsigned` or
/// `decimal(10,2)`.
pub fn numeric_class(data_type: &str) -> Option<NumericClass> {
    let lowered = data_type.to_lowercase();
    let base = lowered
        .split('(')
        .next()
        .unwrap_or_default()
        .trim_end_matches(" unsigned")
        .trim_end_matches(" zerofill")
        .trim();

    if INTEGRAL_TYPES.contains(&base) {
        Some(NumericClass::Integral)
    } else if FRACTIONAL_TYPES.contains(&base) {
        Some(NumericClass::Fractional)
    } else {
        None
    }
}

/// Metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name as stored.
    pub name: String,
    /// Declared type text.
    pub data_type: String,
    /// Whether `NULL` is allowed.
    pub nullable: bool,
    /// Whether the engine assigns the value automatically.
    pub autoincrement: bool,
    /// Whether the column declares a default.
    pub has_default: bool,
}

impl ColumnInfo {
    /// Numeric family, if any.
    pub fn numeric_class(&self) -> Option<NumericClass> {
        numeric_class(&self.data_type)
    }

    /// A value must be supplied on insert.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default && !self.autoincrement
    }
}

/// Columns and key of one table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table or view name.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<ColumnInfo>,
    /// Key columns. Falls back to the first column when none is declared.
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Assembles a schema, applying the first-column key fallback.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>, declared_key: Vec<String>) -> Self {
        let primary_key = if declared_key.is_empty() {
            columns.first().map(|c| vec![c.name.clone()]).unwrap_or_default()
        } else {
            declared_key
        };
        Self {
            name: name.into(),
            columns,
            primary_key,
        }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether `name` is part of the key.
    pub fn is_key(&self, name: &str) -> bool {
        self.primary_key.iter().any(|k| k == name)
    }

    /// Whether the key spans more than one column.
    pub fn has_composite_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// The single integer key column the engine numbers itself, if any.
    pub fn auto_increment_key(&self) -> Option<&ColumnInfo> {
        let [key] = self.primary_key.as_slice() else {
            return None;
        };
        self.column(key).filter(|c| {
            c.autoincrement && c.numeric_class() == Some(NumericClass::Integral)
        })
    }
}

/// Schema discovery over one connection per call.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Every table and view the login can see, sorted.
    async fn table_names(&self, credentials: &Credentials) -> AppResult<Vec<String>>;

    /// Full description of a table the login can see.
    ///
    /// Returns a not-found error when `table` is not reported by
    /// [`Self::table_names`].
    async fn describe_table(&self, credentials: &Credentials, table: &str) -> AppResult<TableSchema>;

    /// The stored creation statement of a table, if the engine keeps one.
    async fn table_definition(
        &self,
        credentials: &Credentials,
        table: &str,
    ) -> AppResult<Option<String>>;
}

/// Introspector backed by the engine's own catalog.
#[derive(Debug, Clone)]
pub struct EngineIntrospector {
    connector: Arc<Connector>,
}

impl EngineIntrospector {
    /// Creates an introspector over the given connector.
    pub fn new(connector: Arc<Connector>) -> Self {
        Self { connector }
    }
}

async fn require_table(conn: &mut DbConnection, table: &str) -> AppResult<()> {
    if conn.table_names().await?.iter().any(|t| t == table) {
        Ok(())
    } else {
        Err(AppError::not_found(format!("Table '{table}' does not exist")))
    }
}

#[async_trait]
impl SchemaIntrospector for EngineIntrospector {
    async fn table_names(&self, credentials: &Credentials) -> AppResult<Vec<String>> {
        let mut conn = self.connector.connect(credentials).await?;
        let result = conn.table_names().await;
        conn.close().await;
        result
    }

    async fn describe_table(&self, credentials: &Credentials, table: &str) -> AppResult<TableSchema> {
        let mut conn = self.connector.connect(credentials).await?;
        let result = describe(&mut conn, table).await;
        conn.close().await;

        let schema = result?;
        debug!(
            table = %schema.name,
            columns = schema.columns.len(),
            primary_key = ?schema.primary_key,
            "Described table"
        );
        Ok(schema)
    }

    async fn table_definition(
        &self,
        credentials: &Credentials,
        table: &str,
    ) -> AppResult<Option<String>> {
        let mut conn = self.connector.connect(credentials).await?;
        let result = match require_table(&mut conn, table).await {
            Ok(()) => conn.table_definition(table).await,
            Err(e) => Err(e),
        };
        conn.close().await;
        result
    }
}

async fn describe(conn: &mut DbConnection, table: &str) -> AppResult<TableSchema> {
    require_table(conn, table).await?;
    let columns = conn.columns(table).await?;
    let declared = conn.declared_primary_key(table).await?;
    Ok(TableSchema::new(table, columns, declared))
}
