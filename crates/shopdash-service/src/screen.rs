//! View-state driven screen rendering.
//!
//! The browser keeps no state of its own: every interaction posts the last
//! [`ViewState`] it received, edited by the operator, and gets back the
//! normalized state together with the screen to draw.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shopdash_auth::RbacEnforcer;
use shopdash_core::error::ErrorKind;
use shopdash_core::result::AppResult;
use shopdash_core::types::{CellValue, Operation};

use crate::analytics::{AnalyticOutput, AnalyticSummary, AnalyticsService};
use crate::context::RequestContext;
use crate::crud::{
    CrudService, DeletePreview, DeleteSelector, FormDescription, OperationOutcome, ReadResult,
};

/// Top-level dashboard mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Table screens.
    #[default]
    Crud,
    /// Chart screens.
    Analytics,
}

/// Everything the operator has selected so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    /// Current mode.
    pub mode: Mode,
    /// Selected table or view.
    pub table: Option<String>,
    /// Selected operation.
    pub operation: Option<Operation>,
    /// Display index of the selected row.
    pub selected_row: usize,
    /// Selected key value (single-column keys, delete only).
    pub selected_key: Option<CellValue>,
    /// Set by the confirm button of the delete screen.
    pub confirm_delete: bool,
    /// The row the last delete preview showed. Confirmation deletes exactly
    /// this key and nothing else.
    pub pending_delete: Option<PendingDelete>,
    /// Selected analytic.
    pub visualization: Option<String>,
}

/// A previewed row awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDelete {
    /// Table the preview was taken from.
    pub table: String,
    /// Full key of the previewed row.
    pub key: BTreeMap<String, CellValue>,
}

/// What to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// A table snapshot.
    Read(ReadResult),
    /// A create or update form.
    Form(FormDescription),
    /// The row a delete would remove.
    DeletePreview(DeletePreview),
    /// Result of a confirmed delete.
    Outcome(OperationOutcome),
    /// One rendered analytic.
    Analytics(AnalyticOutput),
    /// Nothing to show.
    Empty {
        /// Operator-facing message.
        message: String,
    },
}

/// A screen plus the selector contents around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenResponse {
    /// The normalized view state to post back next time.
    pub view: ViewState,
    /// The screen body.
    #[serde(flatten)]
    pub screen: Screen,
    /// Table selector.
    pub tables: Vec<String>,
    /// Operation selector for the chosen table.
    pub operations: Vec<Operation>,
    /// Analytics menu.
    pub visualizations: Vec<AnalyticSummary>,
    /// Set when the selected table turned out to be gone, so any cached
    /// table list is stale.
    pub tables_changed: bool,
}

fn empty(message: impl Into<String>) -> Screen {
    Screen::Empty {
        message: message.into(),
    }
}

/// Picks `current` when it is among `allowed`, else the first allowed value.
fn normalize<T: Clone + PartialEq>(current: Option<T>, allowed: &[T]) -> Option<T> {
    match current {
        Some(value) if allowed.contains(&value) => Some(value),
        _ => allowed.first().cloned(),
    }
}

fn clamp_row(row: usize, len: usize) -> usize {
    row.min(len.saturating_sub(1))
}

/// Dispatches a [`ViewState`] to the CRUD and analytics services.
#[derive(Debug, Clone)]
pub struct ScreenService {
    crud: CrudService,
    analytics: AnalyticsService,
    rbac: Arc<RbacEnforcer>,
}

impl ScreenService {
    /// Creates a new screen service.
    pub fn new(crud: CrudService, analytics: AnalyticsService, rbac: Arc<RbacEnforcer>) -> Self {
        Self {
            crud,
            analytics,
            rbac,
        }
    }

    /// Normalizes `view` against the role's grants and renders it.
    ///
    /// `tables` is the role's accessible table list. A stale table,
    /// operation, row or analytic falls back to the first permitted one.
    pub async fn render(
        &self,
        ctx: &RequestContext,
        tables: &[String],
        mut view: ViewState,
    ) -> AppResult<ScreenResponse> {
        let visualizations = self.analytics.visible(ctx);

        let (screen, operations) = match view.mode {
            Mode::Analytics => {
                let ids: Vec<String> = visualizations.iter().map(|v| v.id.clone()).collect();
                view.visualization = normalize(view.visualization.take(), &ids);
                let screen = match &view.visualization {
                    Some(id) => Screen::Analytics(self.analytics.render(ctx, id).await?),
                    None => empty("No analytics are available for your role"),
                };
                (screen, Vec::new())
            }
            Mode::Crud => {
                view.table = normalize(view.table.take(), tables);
                let Some(table) = view.table.clone() else {
                    view.operation = None;
                    return Ok(ScreenResponse {
                        view,
                        screen: empty("No tables are accessible for your role"),
                        tables: Vec::new(),
                        operations: Vec::new(),
                        visualizations,
                        tables_changed: false,
                    });
                };
                if !self.crud.table_exists(ctx, &table).await {
                    warn!(table = %table, role = %ctx.role, "Selected table no longer exists");
                    return Ok(ScreenResponse {
                        view: ViewState::default(),
                        screen: empty(format!("Table {table} is no longer available")),
                        tables: tables.iter().filter(|t| **t != table).cloned().collect(),
                        operations: Vec::new(),
                        visualizations,
                        tables_changed: true,
                    });
                }
                let operations = self.rbac.permitted_operations(&ctx.role, &table);
                view.operation = normalize(view.operation, &operations);
                let screen = match view.operation {
                    Some(operation) => self.crud_screen(ctx, &table, operation, &mut view).await?,
                    None => empty(format!("No operations are permitted on {table}")),
                };
                (screen, operations)
            }
        };

        Ok(ScreenResponse {
            view,
            screen,
            tables: tables.to_vec(),
            operations,
            visualizations,
            tables_changed: false,
        })
    }

    async fn crud_screen(
        &self,
        ctx: &RequestContext,
        table: &str,
        operation: Operation,
        view: &mut ViewState,
    ) -> AppResult<Screen> {
        if operation != Operation::Delete {
            view.selected_key = None;
            view.confirm_delete = false;
            view.pending_delete = None;
        }

        match operation {
            Operation::Read => Ok(Screen::Read(self.crud.read(ctx, table).await?)),
            Operation::Create => Ok(Screen::Form(self.crud.create_form(ctx, table).await?)),
            Operation::Update => {
                let rows = self.crud.row_count(ctx, table, Operation::Update).await?;
                if rows == 0 {
                    return Ok(empty(format!("No records available to update in {table}")));
                }
                view.selected_row = clamp_row(view.selected_row, rows);
                Ok(Screen::Form(
                    self.crud.update_form(ctx, table, view.selected_row).await?,
                ))
            }
            Operation::Delete => self.delete_screen(ctx, table, view).await,
        }
    }

    /// Confirms the pending delete, or previews the selected row.
    async fn delete_screen(
        &self,
        ctx: &RequestContext,
        table: &str,
        view: &mut ViewState,
    ) -> AppResult<Screen> {
        let confirmed = std::mem::take(&mut view.confirm_delete);
        let pending = view.pending_delete.take().filter(|p| p.table == table);

        if let (true, Some(pending)) = (confirmed, pending) {
            let selector = DeleteSelector::FullKey(pending.key);
            match self.crud.delete_preview(ctx, table, &selector).await {
                Ok(preview) => {
                    view.selected_key = None;
                    view.selected_row = 0;
                    let key: serde_json::Map<String, serde_json::Value> = preview
                        .key
                        .iter()
                        .map(|(column, value)| (column.clone(), value.to_json()))
                        .collect();
                    let outcome = self.crud.delete(ctx, table, &key, true).await?;
                    return Ok(Screen::Outcome(outcome));
                }
                Err(e) if e.kind == ErrorKind::NotFound => {
                    debug!(table = %table, error = %e, "Previewed record is gone; confirmation dropped");
                    view.selected_key = None;
                }
                Err(e) => return Err(e),
            }
        }

        let rows = self.crud.row_count(ctx, table, Operation::Delete).await?;
        if rows == 0 {
            return Ok(empty(format!("No records available to delete in {table}")));
        }
        view.selected_row = clamp_row(view.selected_row, rows);

        let by_index = DeleteSelector::Index(view.selected_row);
        let preview = match view.selected_key.clone() {
            Some(key) => match self
                .crud
                .delete_preview(ctx, table, &DeleteSelector::Key(key))
                .await
            {
                Err(e) if matches!(e.kind, ErrorKind::NotFound | ErrorKind::Validation) => {
                    debug!(table = %table, error = %e, "Stale delete selection");
                    view.selected_key = None;
                    self.crud.delete_preview(ctx, table, &by_index).await?
                }
                other => other?,
            },
            None => self.crud.delete_preview(ctx, table, &by_index).await?,
        };

        view.selected_row = preview.row_index;
        view.pending_delete = Some(PendingDelete {
            table: table.to_string(),
            key: preview.key.clone(),
        });
        Ok(Screen::DeletePreview(preview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_permitted_choice() {
        let tables = vec!["customer".to_string(), "orders".to_string()];
        assert_eq!(
            normalize(Some("orders".to_string()), &tables),
            Some("orders".to_string())
        );
    }

    #[test]
    fn test_normalize_falls_back_to_first() {
        let ops = vec![Operation::Read, Operation::Update];
        assert_eq!(normalize(Some(Operation::Delete), &ops), Some(Operation::Read));
        assert_eq!(normalize(None, &ops), Some(Operation::Read));
        assert_eq!(normalize::<Operation>(Some(Operation::Read), &[]), None);
    }

    #[test]
    fn test_clamp_row() {
        assert_eq!(clamp_row(7, 3), 2);
        assert_eq!(clamp_row(1, 3), 1);
        assert_eq!(clamp_row(0, 0), 0);
    }

    #[test]
    fn test_view_state_defaults_missing_fields() {
        let view: ViewState = serde_json::from_str(r#"{"table": "orders"}"#).unwrap();
        assert_eq!(view.mode, Mode::Crud);
        assert_eq!(view.table.as_deref(), Some("orders"));
        assert_eq!(view.selected_row, 0);
        assert!(!view.confirm_delete);
    }
}
