//! Role-based access control over tables, operations, and analytics.

pub mod enforcer;
pub mod policies;

pub use enforcer::RbacEnforcer;
pub use policies::{Grant, RoleCatalog, RoleDefinition};
