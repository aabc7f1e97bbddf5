//! CRUD service with role checks ahead of every statement.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shopdash_auth::RbacEnforcer;
use shopdash_core::error::{AppError, ErrorKind};
use shopdash_core::result::AppResult;
use shopdash_core::types::{CellValue, Operation};
use shopdash_database::{
    ConstraintExtractor, Connector, NumericClass, SchemaIntrospector, Statement, TableSchema,
    TableSnapshot, cells_match,
};

use crate::context::RequestContext;
use crate::export::{self, CsvExport};

use super::form::{self, Control, FormDescription, NextId};
use super::validate;

/// Result of a write: a success flag plus a message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Whether the statement succeeded.
    pub success: bool,
    /// Operator-facing message.
    pub message: String,
    /// Rows written.
    pub rows_affected: u64,
}

impl OperationOutcome {
    fn succeeded(message: impl Into<String>, rows_affected: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            rows_affected,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            rows_affected: 0,
        }
    }
}

/// A whole-table snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    /// Table or view.
    pub table: String,
    /// Column names and rows.
    #[serde(flatten)]
    pub snapshot: TableSnapshot,
    /// Number of rows.
    pub record_count: usize,
    /// Set when the read degraded to an empty result.
    pub notice: Option<String>,
}

/// How the row to delete is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteSelector {
    /// By display index. Required for composite keys.
    Index(usize),
    /// By key value. Single-column keys only.
    Key(CellValue),
    /// By every key column, as returned in an earlier preview.
    FullKey(BTreeMap<String, CellValue>),
}

/// One entry of the delete row selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorOption {
    /// Key value, or display index for composite keys.
    pub value: CellValue,
    /// Label shown to the operator.
    pub label: String,
}

/// The row about to be deleted, awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePreview {
    /// Table or view.
    pub table: String,
    /// Key columns.
    pub key_columns: Vec<String>,
    /// Every selectable row.
    pub options: Vec<SelectorOption>,
    /// Display index of the selected row.
    pub row_index: usize,
    /// Values of the selected row.
    pub row: BTreeMap<String, CellValue>,
    /// Full key of the selected row, to be echoed back on confirmation.
    pub key: BTreeMap<String, CellValue>,
    /// Always true: deletion needs a second, confirmed request.
    pub confirmation_required: bool,
}

/// Generic CRUD over introspected tables.
#[derive(Clone)]
pub struct CrudService {
    /// Connection factory.
    connector: Arc<Connector>,
    /// Schema discovery.
    introspector: Arc<dyn SchemaIntrospector>,
    /// Enumerated-value lookup.
    constraints: ConstraintExtractor,
    /// Permission checks.
    rbac: Arc<RbacEnforcer>,
}

impl std::fmt::Debug for CrudService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudService")
            .field("engine", &self.connector.engine())
            .finish_non_exhaustive()
    }
}

impl CrudService {
    /// Creates a new CRUD service.
    pub fn new(
        connector: Arc<Connector>,
        introspector: Arc<dyn SchemaIntrospector>,
        rbac: Arc<RbacEnforcer>,
    ) -> Self {
        let constraints = ConstraintExtractor::new(Arc::clone(&introspector));
        Self {
            connector,
            introspector,
            constraints,
            rbac,
        }
    }

    /// Checks the grant, then confirms `table` exists for this login.
    async fn authorized_schema(
        &self,
        ctx: &RequestContext,
        operation: Operation,
        table: &str,
    ) -> AppResult<TableSchema> {
        self.rbac.require_operation(&ctx.role, operation, table)?;
        self.introspector.describe_table(&ctx.credentials, table).await
    }

    async fn enumerations(
        &self,
        ctx: &RequestContext,
        schema: &TableSchema,
    ) -> HashMap<String, Vec<String>> {
        let names: Vec<String> = schema.columns.iter().map(|c| c.name.clone()).collect();
        self.constraints
            .enumerations_for(&ctx.credentials, &schema.name, &names)
            .await
    }

    async fn fetch(&self, ctx: &RequestContext, stmt: &Statement) -> AppResult<TableSnapshot> {
        let mut conn = self.connector.connect(&ctx.credentials).await?;
        let result = conn.fetch(stmt).await;
        conn.close().await;
        result
    }

    async fn execute(&self, ctx: &RequestContext, stmt: &Statement) -> AppResult<u64> {
        let mut conn = self.connector.connect(&ctx.credentials).await?;
        let result = conn.execute(stmt).await;
        conn.close().await;
        result
    }

    async fn snapshot(&self, ctx: &RequestContext, table: &str) -> AppResult<TableSnapshot> {
        let stmt = Statement::select_all(self.connector.dialect(), table);
        self.fetch(ctx, &stmt).await
    }

    /// Whether `table` still exists for this login.
    ///
    /// Only a definite "does not exist" answers `false`; engine failures are
    /// left for the operation itself to report.
    pub async fn table_exists(&self, ctx: &RequestContext, table: &str) -> bool {
        match self.introspector.describe_table(&ctx.credentials, table).await {
            Err(e) if e.kind == ErrorKind::NotFound => false,
            _ => true,
        }
    }

    /// Number of rows in `table`, checked against the `operation` grant
    /// rather than Read.
    pub async fn row_count(
        &self,
        ctx: &RequestContext,
        table: &str,
        operation: Operation,
    ) -> AppResult<usize> {
        self.authorized_schema(ctx, operation, table).await?;
        Ok(self.snapshot(ctx, table).await?.len())
    }

    /// Reads the whole table.
    ///
    /// Engine failures and a table that has since disappeared degrade to an
    /// empty snapshot with a notice.
    pub async fn read(&self, ctx: &RequestContext, table: &str) -> AppResult<ReadResult> {
        let schema = match self.authorized_schema(ctx, Operation::Read, table).await {
            Ok(schema) => schema,
            Err(e) if e.is_database() || e.kind == ErrorKind::NotFound => {
                return Ok(degraded_read(table, Vec::new(), &e));
            }
            Err(e) => return Err(e),
        };

        match self.snapshot(ctx, table).await {
            Ok(snapshot) => {
                let record_count = snapshot.len();
                let notice = (record_count == 0).then(|| format!("No records found in {table}"));
                Ok(ReadResult {
                    table: table.to_string(),
                    snapshot,
                    record_count,
                    notice,
                })
            }
            Err(e) => {
                let columns = schema.columns.iter().map(|c| c.name.clone()).collect();
                Ok(degraded_read(table, columns, &e))
            }
        }
    }

    /// Describes the create form, including the next engine-assigned key.
    pub async fn create_form(&self, ctx: &RequestContext, table: &str) -> AppResult<FormDescription> {
        let schema = self.authorized_schema(ctx, Operation::Create, table).await?;
        let enums = self.enumerations(ctx, &schema).await;

        let next_id = match schema.auto_increment_key() {
            Some(key) => {
                let stmt = Statement::max_of(self.connector.dialect(), table, &key.name);
                let max = match self.fetch(ctx, &stmt).await {
                    Ok(snapshot) => snapshot.value(0, "max_id").cloned().unwrap_or(CellValue::Null),
                    Err(e) => {
                        debug!(table = %table, error = %e, "Could not read current maximum key");
                        CellValue::Null
                    }
                };
                Some(NextId {
                    column: key.name.clone(),
                    value: form::next_id_after(&max),
                })
            }
            None => None,
        };

        Ok(FormDescription {
            table: table.to_string(),
            operation: Operation::Create,
            fields: form::create_fields(&schema, &enums),
            next_id,
            row_index: None,
            row_labels: Vec::new(),
            key: BTreeMap::new(),
        })
    }

    /// Inserts one row built from exactly the create form's fields.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        table: &str,
        values: &serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<OperationOutcome> {
        let schema = self.authorized_schema(ctx, Operation::Create, table).await?;
        let enums = self.enumerations(ctx, &schema).await;

        let mut pairs = Vec::new();
        for field in form::create_fields(&schema, &enums) {
            let Some(column) = schema.column(&field.name) else {
                continue;
            };
            let raw = values.get(&field.name).unwrap_or(&serde_json::Value::Null);
            let value = validate::coerce_value(column, &field.control, raw)?;
            // Leave defaulted columns to the engine.
            if value.is_null() && column.has_default {
                continue;
            }
            pairs.push((field.name, value));
        }

        let stmt = Statement::insert(self.connector.dialect(), table, &pairs)?;
        Ok(match self.execute(ctx, &stmt).await {
            Ok(rows) => {
                info!(table = %table, role = %ctx.role, rows, "Record created");
                OperationOutcome::succeeded(format!("Record created successfully in {table}"), rows)
            }
            Err(e) => {
                warn!(table = %table, role = %ctx.role, error = %e, "Create failed");
                OperationOutcome::failed(format!("Error creating record: {}", e.message))
            }
        })
    }

    /// Describes the update form for the row at `row_index`.
    pub async fn update_form(
        &self,
        ctx: &RequestContext,
        table: &str,
        row_index: usize,
    ) -> AppResult<FormDescription> {
        let schema = self.authorized_schema(ctx, Operation::Update, table).await?;
        let snapshot = self.snapshot(ctx, table).await?;
        if snapshot.is_empty() {
            return Err(AppError::not_found(format!(
                "No records available to update in {table}"
            )));
        }
        let row = row_map(&snapshot, row_index).ok_or_else(|| {
            AppError::validation(format!(
                "Row {row_index} does not exist; {table} has {} rows",
                snapshot.len()
            ))
        })?;

        let enums = self.enumerations(ctx, &schema).await;
        let key = key_of(&schema, &row);
        let row_labels = (0..snapshot.len())
            .filter_map(|i| snapshot.row_label(i))
            .collect();

        Ok(FormDescription {
            table: table.to_string(),
            operation: Operation::Update,
            fields: form::update_fields(&schema, &enums, &row),
            next_id: None,
            row_index: Some(row_index),
            row_labels,
            key,
        })
    }

    /// Updates the row identified by its original key.
    ///
    /// Key columns submitted among `values` are ignored. A blank date input
    /// leaves the stored value alone, since the form only pre-fills dates
    /// that parse as `YYYY-MM-DD`.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        table: &str,
        key: &serde_json::Map<String, serde_json::Value>,
        values: &serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<OperationOutcome> {
        let schema = self.authorized_schema(ctx, Operation::Update, table).await?;
        let key = key_values(&schema, key)?;
        let enums = self.enumerations(ctx, &schema).await;

        let mut pairs = Vec::new();
        for column in schema.columns.iter().filter(|c| !schema.is_key(&c.name)) {
            let Some(raw) = values.get(&column.name) else {
                continue;
            };
            let control = match form::control_for(column, enums.get(&column.name)) {
                Control::Choice { options } => Control::Choice {
                    options: std::iter::once(String::new()).chain(options).collect(),
                },
                other => other,
            };
            if matches!(control, Control::Date) && validate::is_blank(raw) {
                continue;
            }
            pairs.push((column.name.clone(), validate::coerce_value(column, &control, raw)?));
        }

        let stmt = Statement::update(self.connector.dialect(), table, &pairs, &key)?;
        Ok(match self.execute(ctx, &stmt).await {
            Ok(0) => OperationOutcome::failed(format!(
                "No record in {table} matched the selected key"
            )),
            Ok(rows) => {
                info!(table = %table, role = %ctx.role, rows, "Record updated");
                OperationOutcome::succeeded(format!("Record updated successfully in {table}"), rows)
            }
            Err(e) => {
                warn!(table = %table, role = %ctx.role, error = %e, "Update failed");
                OperationOutcome::failed(format!("Error updating record: {}", e.message))
            }
        })
    }

    /// Shows the row a delete would remove.
    pub async fn delete_preview(
        &self,
        ctx: &RequestContext,
        table: &str,
        selector: &DeleteSelector,
    ) -> AppResult<DeletePreview> {
        let schema = self.authorized_schema(ctx, Operation::Delete, table).await?;
        let snapshot = self.snapshot(ctx, table).await?;
        if snapshot.is_empty() {
            return Err(AppError::not_found(format!(
                "No records available to delete in {table}"
            )));
        }

        let single_key = match schema.primary_key.as_slice() {
            [key] => Some(key.as_str()),
            _ => None,
        };

        let row_index = match (selector, single_key) {
            (DeleteSelector::Index(i), _) => *i,
            (DeleteSelector::Key(value), Some(key)) => {
                snapshot.find_row(key, value).ok_or_else(|| {
                    AppError::not_found(format!("No record in {table} has {key} = {value}"))
                })?
            }
            (DeleteSelector::Key(_), None) => {
                return Err(AppError::validation(format!(
                    "{table} has a composite key; select the row by index"
                )));
            }
            (DeleteSelector::FullKey(key), _) => {
                find_by_key(&schema, &snapshot, key).ok_or_else(|| {
                    AppError::not_found(format!("The selected record in {table} no longer exists"))
                })?
            }
        };
        let row = row_map(&snapshot, row_index).ok_or_else(|| {
            AppError::validation(format!(
                "Row {row_index} does not exist; {table} has {} rows",
                snapshot.len()
            ))
        })?;

        let options = (0..snapshot.len())
            .filter_map(|i| match single_key {
                Some(key) => snapshot.value(i, key).map(|v| SelectorOption {
                    value: v.clone(),
                    label: format!("{key}: {v}"),
                }),
                None => snapshot.row_label(i).map(|label| SelectorOption {
                    value: CellValue::Integer(i as i64),
                    label,
                }),
            })
            .collect();

        Ok(DeletePreview {
            table: table.to_string(),
            key_columns: schema.primary_key.clone(),
            options,
            row_index,
            key: key_of(&schema, &row),
            row,
            confirmation_required: true,
        })
    }

    /// Deletes the row with the given full key once confirmed.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        table: &str,
        key: &serde_json::Map<String, serde_json::Value>,
        confirmed: bool,
    ) -> AppResult<OperationOutcome> {
        let schema = self.authorized_schema(ctx, Operation::Delete, table).await?;
        if !confirmed {
            return Err(AppError::conflict(
                "Deleting a record requires explicit confirmation",
            ));
        }
        let key = key_values(&schema, key)?;

        let stmt = Statement::delete(self.connector.dialect(), table, &key)?;
        Ok(match self.execute(ctx, &stmt).await {
            Ok(0) => OperationOutcome::failed(format!(
                "No record in {table} matched the selected key"
            )),
            Ok(rows) => {
                info!(table = %table, role = %ctx.role, rows, "Record deleted");
                OperationOutcome::succeeded(format!("Record deleted successfully from {table}"), rows)
            }
            Err(e) => {
                warn!(table = %table, role = %ctx.role, error = %e, "Delete failed");
                OperationOutcome::failed(format!("Error deleting record: {}", e.message))
            }
        })
    }

    /// Dumps the whole table as CSV.
    pub async fn export(&self, ctx: &RequestContext, table: &str) -> AppResult<CsvExport> {
        self.authorized_schema(ctx, Operation::Read, table).await?;
        let snapshot = self.snapshot(ctx, table).await?;
        export::to_csv(table, &snapshot, chrono::Local::now().naive_local())
    }
}

fn degraded_read(table: &str, columns: Vec<String>, err: &AppError) -> ReadResult {
    warn!(table = %table, error = %err, "Read degraded to empty result");
    ReadResult {
        table: table.to_string(),
        snapshot: TableSnapshot {
            columns,
            rows: Vec::new(),
        },
        record_count: 0,
        notice: Some(format!("Error fetching data from {table}: {}", err.message)),
    }
}

fn row_map(snapshot: &TableSnapshot, index: usize) -> Option<BTreeMap<String, CellValue>> {
    let row = snapshot.row(index)?;
    Some(
        snapshot
            .columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect(),
    )
}

fn key_of(schema: &TableSchema, row: &BTreeMap<String, CellValue>) -> BTreeMap<String, CellValue> {
    schema
        .primary_key
        .iter()
        .map(|k| (k.clone(), row.get(k).cloned().unwrap_or(CellValue::Null)))
        .collect()
}

/// Index of the row whose key columns all match `key`.
fn find_by_key(
    schema: &TableSchema,
    snapshot: &TableSnapshot,
    key: &BTreeMap<String, CellValue>,
) -> Option<usize> {
    if schema.primary_key.is_empty() {
        return None;
    }
    (0..snapshot.len()).find(|&i| {
        schema.primary_key.iter().all(|column| {
            match (snapshot.value(i, column), key.get(column)) {
                (Some(stored), Some(wanted)) => cells_match(stored, wanted),
                _ => false,
            }
        })
    })
}

/// Converts a submitted key into one value per key column, in key order.
fn key_values(
    schema: &TableSchema,
    submitted: &serde_json::Map<String, serde_json::Value>,
) -> AppResult<Vec<(String, CellValue)>> {
    schema
        .primary_key
        .iter()
        .map(|column| {
            let raw = submitted.get(column).ok_or_else(|| {
                AppError::validation(format!("Missing key value for '{column}'"))
            })?;
            let value = CellValue::from_json(raw);
            if value.is_null() {
                return Err(AppError::validation(format!(
                    "Key value for '{column}' cannot be empty"
                )));
            }
            let integral = schema
                .column(column)
                .is_some_and(|c| c.numeric_class() == Some(NumericClass::Integral));
            let value = match value.as_i64() {
                Some(i) if integral => CellValue::Integer(i),
                _ => value,
            };
            Ok((column.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shopdash_database::ColumnInfo;

    use super::*;

    fn link_table() -> TableSchema {
        let col = |name: &str| ColumnInfo {
            name: name.into(),
            data_type: "INTEGER".into(),
            nullable: false,
            autoincrement: false,
            has_default: false,
        };
        TableSchema::new(
            "productDiscount",
            vec![col("ProductID"), col("DiscountID")],
            vec!["ProductID".into(), "DiscountID".into()],
        )
    }

    #[test]
    fn test_key_values_follow_key_order_and_coerce() {
        let submitted = json!({"DiscountID": "5", "ProductID": 3});
        let key = key_values(&link_table(), submitted.as_object().unwrap()).unwrap();
        assert_eq!(
            key,
            vec![
                ("ProductID".to_string(), CellValue::Integer(3)),
                ("DiscountID".to_string(), CellValue::Integer(5)),
            ]
        );
    }

    #[test]
    fn test_partial_key_is_rejected() {
        let submitted = json!({"ProductID": 3});
        let err = key_values(&link_table(), submitted.as_object().unwrap()).unwrap_err();
        assert!(err.message.contains("DiscountID"));
    }
}
