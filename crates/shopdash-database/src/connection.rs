//! Per-operation database connections.
//!
//! A [`Connector`] turns a credential pair into a live [`DbConnection`] for
//! the configured engine. Connections are never pooled or shared: a caller
//! opens one, runs a single statement or introspection call, and closes it.

use std::path::Path;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row};
use tracing::{debug, info};

use shopdash_core::config::{DatabaseConfig, DatabaseEngine};
use shopdash_core::error::{AppError, ErrorKind};
use shopdash_core::result::AppResult;
use shopdash_core::types::{CellValue, Credentials};

use crate::dialect::Dialect;
use crate::introspect::ColumnInfo;
use crate::rows::{TableSnapshot, decode_mysql_row, decode_sqlite_row};
use crate::statement::Statement;

/// Opens connections to the configured database.
#[derive(Debug, Clone)]
pub struct Connector {
    /// Connection settings.
    config: DatabaseConfig,
}

impl Connector {
    /// Creates a connector from configuration.
    pub fn new(config: DatabaseConfig) -> Self {
        info!(
            target_db = %config.describe(),
            engine = %config.engine,
            "Database connector configured"
        );
        Self { config }
    }

    /// The configured engine.
    pub fn engine(&self) -> DatabaseEngine {
        self.config.engine
    }

    /// Identifier quoting rules for the configured engine.
    pub fn dialect(&self) -> Dialect {
        Dialect::from(self.config.engine)
    }

    /// The configuration this connector was built from.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Opens a connection using `credentials` as the literal engine login.
    ///
    /// The configured connect timeout is the only bound on how long this
    /// may take.
    pub async fn connect(&self, credentials: &Credentials) -> AppResult<DbConnection> {
        let timeout = Duration::from_secs(self.config.connect_timeout_seconds);

        let attempt = async {
            match self.config.engine {
                DatabaseEngine::Sqlite => {
                    if !Path::new(&self.config.path).exists() {
                        return Err(AppError::database(format!(
                            "Database file '{}' does not exist",
                            self.config.path
                        )));
                    }
                    SqliteConnectOptions::new()
                        .filename(&self.config.path)
                        .create_if_missing(false)
                        .connect()
                        .await
                        .map(DbConnection::Sqlite)
                        .map_err(|e| connect_error(&self.config, e))
                }
                DatabaseEngine::Mysql => MySqlConnectOptions::new()
                    .host(&self.config.host)
                    .port(self.config.port)
                    .database(&self.config.name)
                    .username(credentials.username())
                    .password(credentials.secret())
                    .connect()
                    .await
                    .map(DbConnection::Mysql)
                    .map_err(|e| connect_error(&self.config, e)),
            }
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(AppError::database(format!(
                "Timed out connecting to {} after {}s",
                self.config.describe(),
                self.config.connect_timeout_seconds
            ))),
        }
    }
}

fn connect_error(config: &DatabaseConfig, err: sqlx::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Database,
        format!("Failed to connect to {}: {err}", config.describe()),
        err,
    )
}

fn query_error(context: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{context}: {err}"), err)
}

/// Binds every [`CellValue`] parameter of a statement onto a sqlx query.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match &param.value {
                CellValue::Null => query.bind(None::<String>),
                CellValue::Bool(b) => query.bind(*b),
                CellValue::Integer(i) => query.bind(*i),
                CellValue::Real(f) => query.bind(*f),
                CellValue::Text(s) => query.bind(s.clone()),
                CellValue::Blob(bytes) => query.bind(bytes.clone()),
            };
        }
        query
    }};
}

/// A single live connection.
#[derive(Debug)]
pub enum DbConnection {
    /// Embedded SQLite file.
    Sqlite(SqliteConnection),
    /// MySQL server session.
    Mysql(MySqlConnection),
}

impl DbConnection {
    /// Identifier quoting rules for this connection.
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Sqlite(_) => Dialect::Sqlite,
            Self::Mysql(_) => Dialect::Mysql,
        }
    }

    /// Runs the trivial `SELECT 1` query.
    pub async fn ping(&mut self) -> AppResult<()> {
        let result = match self {
            Self::Sqlite(conn) => sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ()),
            Self::Mysql(conn) => sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ()),
        };
        result.map_err(|e| query_error("Connectivity check failed", e))
    }

    /// Runs a query and materializes every row.
    pub async fn fetch(&mut self, stmt: &Statement) -> AppResult<TableSnapshot> {
        debug!(sql = %stmt.sql, params = ?stmt.param_names(), "Fetching rows");

        match self {
            Self::Sqlite(conn) => {
                let rows = bind_params!(sqlx::query(&stmt.sql), &stmt.params)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| query_error("Query failed", e))?;
                let columns = match rows.first() {
                    Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
                    None => match (&mut *conn).describe(&stmt.sql).await {
                        Ok(desc) => desc.columns().iter().map(|c| c.name().to_string()).collect(),
                        Err(_) => Vec::new(),
                    },
                };
                Ok(TableSnapshot {
                    columns,
                    rows: rows.iter().map(decode_sqlite_row).collect(),
                })
            }
            Self::Mysql(conn) => {
                let rows = bind_params!(sqlx::query(&stmt.sql), &stmt.params)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| query_error("Query failed", e))?;
                let columns = match rows.first() {
                    Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
                    None => match (&mut *conn).describe(&stmt.sql).await {
                        Ok(desc) => desc.columns().iter().map(|c| c.name().to_string()).collect(),
                        Err(_) => Vec::new(),
                    },
                };
                Ok(TableSnapshot {
                    columns,
                    rows: rows.iter().map(decode_mysql_row).collect(),
                })
            }
        }
    }

    /// Executes a write statement and returns the number of affected rows.
    pub async fn execute(&mut self, stmt: &Statement) -> AppResult<u64> {
        debug!(sql = %stmt.sql, params = ?stmt.param_names(), "Executing statement");

        let result = match self {
            Self::Sqlite(conn) => bind_params!(sqlx::query(&stmt.sql), &stmt.params)
                .execute(&mut *conn)
                .await
                .map(|r| r.rows_affected()),
            Self::Mysql(conn) => bind_params!(sqlx::query(&stmt.sql), &stmt.params)
                .execute(&mut *conn)
                .await
                .map(|r| r.rows_affected()),
        };
        result.map_err(|e| query_error("Statement failed", e))
    }

    /// Closes the connection, ignoring shutdown errors.
    pub async fn close(self) {
        let result = match self {
            Self::Sqlite(conn) => conn.close().await,
            Self::Mysql(conn) => conn.close().await,
        };
        if let Err(e) = result {
            debug!(error = %e, "Error while closing connection");
        }
    }

    /// Names of every table and view visible to this login, sorted.
    pub(crate) async fn table_names(&mut self) -> AppResult<Vec<String>> {
        let result = match self {
            Self::Sqlite(conn) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT name FROM sqlite_master \
                     WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
                     ORDER BY name",
                )
                .fetch_all(&mut *conn)
                .await
            }
            Self::Mysql(conn) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
                     WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME",
                )
                .fetch_all(&mut *conn)
                .await
            }
        };
        let mut names = result.map_err(|e| query_error("Failed to list tables", e))?;
        names.sort();
        Ok(names)
    }

    /// Column metadata for one table or view, in ordinal order.
    pub(crate) async fn columns(&mut self, table: &str) -> AppResult<Vec<ColumnInfo>> {
        match self {
            Self::Sqlite(conn) => {
                let rows = sqlx::query(
                    "SELECT name, type, \"notnull\", dflt_value IS NOT NULL, pk \
                     FROM pragma_table_info(?) ORDER BY cid",
                )
                .bind(table)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| query_error("Failed to read columns", e))?;

                let pk_count = rows
                    .iter()
                    .filter(|r| r.try_get::<i64, _>(4).unwrap_or(0) > 0)
                    .count();

                let columns = rows
                    .iter()
                    .map(|row| {
                        let data_type: String = row.try_get(1).unwrap_or_default();
                        let in_pk = row.try_get::<i64, _>(4).unwrap_or(0) > 0;
                        ColumnInfo {
                            name: row.try_get(0).unwrap_or_default(),
                            nullable: row.try_get::<i64, _>(2).unwrap_or(0) == 0,
                            has_default: row.try_get::<i64, _>(3).unwrap_or(0) != 0,
                            // Only a lone `INTEGER PRIMARY KEY` aliases the rowid.
                            autoincrement: in_pk
                                && pk_count == 1
                                && data_type.eq_ignore_ascii_case("INTEGER"),
                            data_type,
                        }
                    })
                    .collect();
                Ok(columns)
            }
            Self::Mysql(conn) => {
                let rows = sqlx::query(
                    "SELECT CAST(COLUMN_NAME AS CHAR), CAST(COLUMN_TYPE AS CHAR), \
                            CAST(IS_NULLABLE AS CHAR), CAST(EXTRA AS CHAR), \
                            CAST(COLUMN_DEFAULT IS NOT NULL AS SIGNED) \
                     FROM information_schema.COLUMNS \
                     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
                     ORDER BY ORDINAL_POSITION",
                )
                .bind(table)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| query_error("Failed to read columns", e))?;

                let columns = rows
                    .iter()
                    .map(|row| {
                        let extra: String = row.try_get_unchecked(3).unwrap_or_default();
                        let nullable: String = row.try_get_unchecked(2).unwrap_or_default();
                        ColumnInfo {
                            name: row.try_get_unchecked(0).unwrap_or_default(),
                            data_type: row.try_get_unchecked(1).unwrap_or_default(),
                            nullable: nullable.eq_ignore_ascii_case("YES"),
                            autoincrement: extra.to_lowercase().contains("auto_increment"),
                            has_default: row.try_get_unchecked::<i64, _>(4).unwrap_or(0) != 0,
                        }
                    })
                    .collect();
                Ok(columns)
            }
        }
    }

    /// Declared primary-key columns in key order (possibly empty).
    pub(crate) async fn declared_primary_key(&mut self, table: &str) -> AppResult<Vec<String>> {
        let result = match self {
            Self::Sqlite(conn) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk",
                )
                .bind(table)
                .fetch_all(&mut *conn)
                .await
            }
            Self::Mysql(conn) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.KEY_COLUMN_USAGE \
                     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
                     AND CONSTRAINT_NAME = 'PRIMARY' ORDER BY ORDINAL_POSITION",
                )
                .bind(table)
                .fetch_all(&mut *conn)
                .await
            }
        };
        result.map_err(|e| query_error("Failed to read primary key", e))
    }

    /// The stored creation statement of a table or view.
    ///
    /// `table` must already be confirmed by [`Self::table_names`]; on MySQL it
    /// is interpolated as a quoted identifier because `SHOW CREATE TABLE`
    /// takes no parameters.
    pub(crate) async fn table_definition(&mut self, table: &str) -> AppResult<Option<String>> {
        match self {
            Self::Sqlite(conn) => sqlx::query_scalar::<_, Option<String>>(
                "SELECT sql FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?",
            )
            .bind(table)
            .fetch_optional(&mut *conn)
            .await
            .map(Option::flatten)
            .map_err(|e| query_error("Failed to read table definition", e)),
            Self::Mysql(conn) => {
                let sql = format!("SHOW CREATE TABLE {}", Dialect::Mysql.quote_ident(table));
                let row = sqlx::query(&sql)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(|e| query_error("Failed to read table definition", e))?;
                Ok(row.and_then(|r| r.try_get_unchecked::<String, _>(1).ok()))
            }
        }
    }
}
