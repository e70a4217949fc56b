//! Sync error handling
//!
//! Every backend call fails with a [`SyncError`]. A failed fetch never
//! touches the directory; callers decide whether to surface or ignore it.

use thiserror::Error;

/// Errors that can occur while talking to the device backend
#[derive(Error, Debug)]
pub enum SyncError {
    /// Request could not be sent, timed out, or the body could not be read
    #[error("Request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-2xx status
    #[error("{endpoint} returned HTTP {status}")]
    Http { endpoint: String, status: u16 },

    /// Response body was not the expected JSON
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Operation needs a bearer token and there is none
    #[error("Not signed in. Run `devtrack login` first.")]
    NotAuthenticated,

    /// Credential store could not be updated
    #[error("Credential store error: {0:#}")]
    Credentials(anyhow::Error),
}

impl SyncError {
    /// Whether retrying later might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network { .. } => true,
            SyncError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the backend rejected the bearer token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Http { status: 401 | 403, .. })
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SyncError::Network { .. } => {
                Some("Check that the backend is running and backend_url is correct.")
            }
            SyncError::Http { status: 401 | 403, .. } => {
                Some("Your token was rejected. Sign in again with `devtrack login`.")
            }
            SyncError::NotAuthenticated => Some("Run `devtrack login --token <TOKEN>`."),
            _ => None,
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
