//! Session state
//!
//! A session is the signed-in username plus the bearer token held by a
//! [`CredentialStore`]. Having no token means anonymous mode: the sync engine
//! then reads the public device feed.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

/// Answers whether the caller is authenticated
///
/// Implementations are queried once per poll tick, so they must be cheap and
/// free of side effects. The token is opaque; nobody here checks whether it
/// has expired.
pub trait SessionOracle: Send + Sync {
    fn current_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }
}

/// A session oracle whose token can be replaced or removed
pub trait CredentialStore: SessionOracle {
    fn store(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// The signed-in identity for this process
#[derive(Clone)]
pub struct Session {
    username: Arc<RwLock<Option<String>>>,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &*self.username.read())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            username: Arc::new(RwLock::new(None)),
            credentials,
        }
    }

    pub fn username(&self) -> Option<String> {
        self.username.read().clone()
    }

    pub fn set_username(&self, username: impl Into<String>) {
        *self.username.write() = Some(username.into());
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Forget the username and discard the token
    ///
    /// The username is cleared even when removing the token fails.
    pub fn clear(&self) -> Result<()> {
        *self.username.write() = None;
        self.credentials.clear()
    }
}

impl SessionOracle for Session {
    fn current_token(&self) -> Option<String> {
        self.credentials.current_token()
    }
}
