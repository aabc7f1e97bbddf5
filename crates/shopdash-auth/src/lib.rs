//! # shopdash-auth
//!
//! Authorization and authentication for ShopDash.
//!
//! ## Modules
//!
//! - `rbac`: immutable role catalog and the permission predicates over it
//! - `authenticator`: credential verification by opening a real engine connection
//! - `session`: per-browser session state, its in-memory store, and the login/logout flows

pub mod authenticator;
pub mod rbac;
pub mod session;

pub use authenticator::{Authenticator, DatabaseAuthenticator};
pub use rbac::{Grant, RbacEnforcer, RoleCatalog, RoleDefinition};
pub use session::{Principal, SessionManager, SessionState, SessionStore};
