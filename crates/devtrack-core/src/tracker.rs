//! Tracker entry point
//!
//! The `Tracker` wires configuration, credentials, the HTTP backend, the
//! device directory and the sync engine together.
//!
//! ## Usage
//!
//! ```ignore
//! let tracker = Tracker::open()?;
//! tracker.lifecycle().restore().await?;
//! tracker.engine().fetch_devices().await?;
//!
//! for device in tracker.directory().visible() {
//!     println!("{}", device.label());
//! }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::credentials::TokenFile;
use crate::directory::Directory;
use crate::lifecycle::SessionLifecycle;
use crate::polling::{PollingController, TokioScheduler, VisibilitySource};
use crate::session::{CredentialStore, Session};
use crate::sync::{DeviceBackend, HttpBackend, SyncEngine};

/// Fully wired device tracker
pub struct Tracker {
    config: Config,
    session: Session,
    engine: SyncEngine,
    lifecycle: SessionLifecycle,
}

impl Tracker {
    /// Open the tracker using the configuration from disk and environment
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::from_config(config)
    }

    /// Open the tracker with a specific configuration
    ///
    /// The bearer token lives in the data directory, so every invocation
    /// sharing a config shares a login.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let credentials =
            TokenFile::open(config.token_path()).context("Failed to open token file")?;
        let backend =
            HttpBackend::from_config(&config).context("Failed to create HTTP backend")?;

        Ok(Self::with_parts(
            config,
            Arc::new(credentials),
            Arc::new(backend),
        ))
    }

    /// Assemble a tracker from explicit parts
    pub fn with_parts(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        backend: Arc<dyn DeviceBackend>,
    ) -> Self {
        let session = Session::new(credentials);
        let engine = SyncEngine::new(
            backend.clone(),
            Arc::new(session.clone()),
            Directory::new(),
        );
        let lifecycle = SessionLifecycle::new(session.clone(), engine.clone(), backend);

        Self {
            config,
            session,
            engine,
            lifecycle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn directory(&self) -> &Directory {
        self.engine.directory()
    }

    pub fn lifecycle(&self) -> &SessionLifecycle {
        &self.lifecycle
    }

    /// Create a polling controller driven by tokio timers
    ///
    /// Must be called from within a tokio runtime once polling starts.
    pub fn polling(&self, visibility: Arc<dyn VisibilitySource>) -> PollingController {
        PollingController::new(
            self.engine.clone(),
            Arc::new(TokioScheduler::new()),
            visibility,
        )
    }
}
