//! # shopdash-service
//!
//! Business logic for ShopDash. Every service method takes a
//! [`RequestContext`] naming the acting role and the credentials its
//! connections are opened with, and checks the role's grants before any
//! statement is built.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod analytics;
pub mod context;
pub mod crud;
pub mod export;
pub mod screen;

pub use analytics::{AnalyticOutput, AnalyticsService};
pub use context::RequestContext;
pub use crud::{CrudService, DeleteSelector, FormDescription, OperationOutcome, ReadResult};
pub use export::CsvExport;
pub use screen::{Mode, PendingDelete, Screen, ScreenResponse, ScreenService, ViewState};
