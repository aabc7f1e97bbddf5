//! Convenience result type alias for ShopDash.

use crate::error::AppError;

/// A specialized `Result` type for ShopDash operations.
pub type AppResult<T> = Result<T, AppError>;
