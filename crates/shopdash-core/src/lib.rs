//! # shopdash-core
//!
//! Core crate for ShopDash. Contains configuration schemas, the dynamic
//! cell value model shared by every database-facing crate, credential and
//! operation types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ShopDash crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
