//! Shared domain types.

pub mod credentials;
pub mod operation;
pub mod value;

pub use credentials::Credentials;
pub use operation::Operation;
pub use value::CellValue;
