//! # shopdash-api
//!
//! HTTP API layer for ShopDash built on Axum.
//!
//! Provides the REST endpoints, the session-cookie middleware, request
//! logging, CORS, extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::{ApiError, ApiErrorResponse};
pub use state::AppState;
