//! Session lifecycle
//!
//! Login and logout change which feed the sync engine reads, so both end in a
//! device refresh. Logout also wipes the directory first; private settings of
//! the previous owner must never linger in anonymous mode.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::session::{Session, SessionOracle};
use crate::sync::{DeviceBackend, FetchReport, SyncEngine, SyncError};

/// Outcome of a successful login
///
/// The login itself succeeded once the profile was read. The device refresh
/// that follows may still fail; that is reported here rather than undoing
/// the login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginReport {
    pub username: String,
    /// The refresh that followed, when it succeeded
    pub devices: Option<FetchReport>,
    /// Why the refresh failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

/// Drives login, logout and session restore
#[derive(Clone)]
pub struct SessionLifecycle {
    session: Session,
    engine: SyncEngine,
    backend: Arc<dyn DeviceBackend>,
}

impl SessionLifecycle {
    pub fn new(session: Session, engine: SyncEngine, backend: Arc<dyn DeviceBackend>) -> Self {
        Self {
            session,
            engine,
            backend,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn username(&self) -> Option<String> {
        self.session.username()
    }

    /// Sign in with a bearer token
    ///
    /// The token is stored first, then the profile is fetched. Only when the
    /// profile call succeeds is the username set and the device list refreshed.
    /// A failed profile call leaves the username as it was and is the only
    /// backend failure returned as `Err`; the stored token is kept and the
    /// caller decides whether to discard it. A failed refresh leaves the
    /// directory as it was and is reported in the [`LoginReport`].
    pub async fn login(&self, token: &str) -> Result<LoginReport, SyncError> {
        self.session
            .credentials()
            .store(token)
            .map_err(SyncError::Credentials)?;

        let token = self
            .session
            .current_token()
            .ok_or(SyncError::NotAuthenticated)?;
        let profile = self.backend.profile(&token).await?;

        self.session.set_username(profile.username.clone());
        info!("Logged in as {}", profile.username);

        let (devices, refresh_error) = match self.engine.fetch_devices().await {
            Ok(report) => (Some(report), None),
            Err(e) => {
                warn!("Device refresh after login failed: {}", e);
                (None, Some(e.to_string()))
            }
        };
        Ok(LoginReport {
            username: profile.username,
            devices,
            refresh_error,
        })
    }

    /// Sign out and fall back to the public feed
    ///
    /// Identity and directory are cleared before the final public fetch. If
    /// the token could not be removed the fetch still runs, and that error is
    /// returned afterwards.
    pub async fn logout(&self) -> Result<FetchReport, SyncError> {
        let cleared = self.session.clear();
        if let Err(e) = &cleared {
            warn!("Failed to clear credentials: {:#}", e);
        }
        self.engine.directory().reset();
        info!("Logged out");

        let report = self.engine.fetch_devices().await?;
        cleared.map_err(SyncError::Credentials)?;
        Ok(report)
    }

    /// Repopulate the username from a persisted token
    ///
    /// Returns `Ok(None)` in anonymous mode. Devices are not refreshed; the
    /// caller is expected to fetch or start polling.
    pub async fn restore(&self) -> Result<Option<String>, SyncError> {
        let Some(token) = self.session.current_token() else {
            return Ok(None);
        };

        let profile = self.backend.profile(&token).await?;
        self.session.set_username(profile.username.clone());
        info!("Restored session for {}", profile.username);
        Ok(Some(profile.username))
    }
}
