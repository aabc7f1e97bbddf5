//! Analytics service: permission check, query, render.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shopdash_auth::RbacEnforcer;
use shopdash_core::error::AppError;
use shopdash_core::result::AppResult;
use shopdash_database::{Connector, Statement, TableSnapshot};

use crate::context::RequestContext;

use super::catalog::Analytic;
use super::chart::{AnalyticOutput, ChartKind};
use super::render;

/// Menu entry for one visible analytic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticSummary {
    /// Identifier.
    pub id: String,
    /// Menu title.
    pub title: String,
    /// Chart shape.
    pub kind: ChartKind,
}

impl From<Analytic> for AnalyticSummary {
    fn from(analytic: Analytic) -> Self {
        Self {
            id: analytic.id().to_string(),
            title: analytic.title().to_string(),
            kind: analytic.chart_kind(),
        }
    }
}

/// Runs the canned analytics for a role.
#[derive(Clone)]
pub struct AnalyticsService {
    connector: Arc<Connector>,
    rbac: Arc<RbacEnforcer>,
}

impl std::fmt::Debug for AnalyticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsService")
            .field("engine", &self.connector.engine())
            .finish_non_exhaustive()
    }
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(connector: Arc<Connector>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { connector, rbac }
    }

    /// Analytics the acting role may open, in menu order.
    pub fn visible(&self, ctx: &RequestContext) -> Vec<AnalyticSummary> {
        Analytic::ALL
            .into_iter()
            .filter(|a| self.rbac.can_view(&ctx.role, a.id()))
            .map(AnalyticSummary::from)
            .collect()
    }

    /// Runs one analytic.
    ///
    /// Unknown identifiers and missing grants are errors; query failures
    /// come back as [`AnalyticOutput::Failed`] so the rest of the page
    /// still renders.
    pub async fn render(&self, ctx: &RequestContext, id: &str) -> AppResult<AnalyticOutput> {
        let analytic = Analytic::from_id(id)
            .ok_or_else(|| AppError::not_found(format!("Unknown analytic '{id}'")))?;
        self.rbac.require_visualization(&ctx.role, analytic.id())?;

        match self.fetch(ctx, analytic).await {
            Ok(snapshot) => {
                debug!(analytic = %id, rows = snapshot.len(), "Analytic source loaded");
                Ok(render::render(
                    analytic,
                    snapshot,
                    chrono::Local::now().date_naive(),
                ))
            }
            Err(e) => {
                warn!(analytic = %id, role = %ctx.role, error = %e, "Analytic query failed");
                Ok(AnalyticOutput::Failed {
                    id: analytic.id().to_string(),
                    message: format!("Error generating {}: {}", analytic.title(), e.message),
                })
            }
        }
    }

    async fn fetch(&self, ctx: &RequestContext, analytic: Analytic) -> AppResult<TableSnapshot> {
        let mut conn = self.connector.connect(&ctx.credentials).await?;
        let result = conn.fetch(&Statement::raw(analytic.sql())).await;
        conn.close().await;
        result
    }
}
