//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use shopdash_core::error::AppError;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Database login name.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Database password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub secret: String,
}

/// Update submit: the row's original key plus the new values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Original primary key values.
    pub key: serde_json::Map<String, serde_json::Value>,
    /// New values by column.
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// Delete submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Full primary key of the row.
    pub key: serde_json::Map<String, serde_json::Value>,
    /// Must be true for the delete to run.
    #[serde(default)]
    pub confirmed: bool,
}

/// `?row=N` selector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowQuery {
    /// Display index.
    #[serde(default)]
    pub row: usize,
}

/// `?row=N` or `?key=V` selector for the delete preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteQuery {
    /// Display index.
    pub row: Option<usize>,
    /// Key value (single-column keys).
    pub key: Option<String>,
}

/// Runs `validator` rules, joining every failure into one message.
pub fn validated<T: Validate>(request: T) -> Result<T, AppError> {
    match request.validate() {
        Ok(()) => Ok(request),
        Err(errors) => {
            let mut messages: Vec<String> = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            messages.sort();
            Err(AppError::validation(messages.join("; ")))
        }
    }
}
