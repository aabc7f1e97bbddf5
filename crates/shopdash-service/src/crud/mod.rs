//! Generic Create/Read/Update/Delete over any table the role may open.

pub mod form;
pub mod service;
pub mod validate;

pub use form::{Control, FormDescription, FormField, NextId};
pub use service::{CrudService, DeletePreview, DeleteSelector, OperationOutcome, ReadResult};
