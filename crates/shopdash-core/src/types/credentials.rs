//! Engine-level login credentials.

use std::fmt;

use zeroize::Zeroizing;

/// A (username, secret) pair passed verbatim to the database engine.
///
/// The secret is never hashed or persisted; its buffer is wiped when the
/// value is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    secret: Zeroizing<String>,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// The engine login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The raw secret.
    pub fn secret(&self) -> &str {
        self.secret.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"****")
            .finish()
    }
}
