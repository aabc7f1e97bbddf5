//! Browser session lifecycle: state, storage, and the login/logout flows.

pub mod manager;
pub mod state;
pub mod store;

pub use manager::{Principal, SessionManager};
pub use state::SessionState;
pub use store::SessionStore;
