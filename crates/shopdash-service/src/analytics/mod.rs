//! Canned analytics over the shop schema.

pub mod catalog;
pub mod chart;
pub mod render;
pub mod service;

pub use catalog::Analytic;
pub use chart::{AnalyticOutput, ChartKind, ChartSpec, DataPoint, MapPoint, Metric};
pub use service::{AnalyticSummary, AnalyticsService};
