//! Sync engine
//!
//! Pulls device state from the backend into the [`Directory`]. The session
//! decides which feed is read: owners get their private settings, anonymous
//! viewers get public locations only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::backend::DeviceBackend;
use super::error::SyncError;
use crate::directory::Directory;
use crate::session::SessionOracle;

/// Fetch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No fetch attempted yet
    Idle,
    /// A fetch is in flight
    Fetching,
    /// Last fetch succeeded
    Synced,
    /// Last fetch failed; the directory holds the previous state
    Error,
}

/// Which feed a fetch read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    /// Owner feed with private settings
    Private,
    /// Anonymous location feed
    Public,
}

/// Outcome of a successful fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchReport {
    pub source: FeedSource,
    pub device_count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Reconciles the directory with the backend
///
/// Cloning is cheap; clones share status and the last report. Concurrent
/// fetches are not coalesced: whichever response completes last is what the
/// directory ends up holding.
#[derive(Clone)]
pub struct SyncEngine {
    backend: Arc<dyn DeviceBackend>,
    oracle: Arc<dyn SessionOracle>,
    directory: Directory,
    status: Arc<watch::Sender<SyncStatus>>,
    last_report: Arc<Mutex<Option<FetchReport>>>,
}

impl SyncEngine {
    pub fn new(
        backend: Arc<dyn DeviceBackend>,
        oracle: Arc<dyn SessionOracle>,
        directory: Directory,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            backend,
            oracle,
            directory,
            status: Arc::new(status),
            last_report: Arc::new(Mutex::new(None)),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Get the current status
    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Report of the most recent successful fetch
    pub fn last_report(&self) -> Option<FetchReport> {
        self.last_report.lock().clone()
    }

    /// Fetch devices and replace the directory contents
    ///
    /// The directory is replaced only after the whole body decoded. On any
    /// failure it keeps its previous contents and the error is returned.
    pub async fn fetch_devices(&self) -> Result<FetchReport, SyncError> {
        self.set_status(SyncStatus::Fetching);

        let (source, result) = match self.oracle.current_token() {
            Some(token) => (
                FeedSource::Private,
                self.backend.device_settings(&token).await,
            ),
            None => (FeedSource::Public, self.backend.device_locations().await),
        };

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                warn!("Device fetch failed ({:?} feed): {}", source, e);
                self.set_status(SyncStatus::Error);
                return Err(e);
            }
        };

        let report = FetchReport {
            source,
            device_count: records.len(),
            fetched_at: Utc::now(),
        };
        self.directory.replace_all(records);
        *self.last_report.lock() = Some(report.clone());
        self.set_status(SyncStatus::Synced);
        debug!(
            "Fetched {} device(s) from {:?} feed",
            report.device_count, report.source
        );

        Ok(report)
    }

    /// Rename a device locally and push the change to the backend
    ///
    /// The local edit is applied first (no-op for unknown ids) and kept even if
    /// the push fails. Returns whether a local record was changed.
    pub async fn update_nickname(&self, device_id: &str, nickname: &str) -> Result<bool, SyncError> {
        let changed = self.directory.set_nickname(device_id, nickname);
        let token = self.require_token()?;
        self.backend
            .change_nickname(&token, device_id, nickname)
            .await?;
        info!("Renamed device {} to {:?}", device_id, nickname);
        Ok(changed)
    }

    /// Recolor a device locally and push the change to the backend
    pub async fn update_color(&self, device_id: &str, color: &str) -> Result<bool, SyncError> {
        let changed = self.directory.set_color(device_id, color);
        let token = self.require_token()?;
        self.backend.change_color(&token, device_id, color).await?;
        info!("Set color of device {} to {}", device_id, color);
        Ok(changed)
    }

    /// Hide or show a device locally and push the change to the backend
    pub async fn set_device_hidden(&self, device_id: &str, hidden: bool) -> Result<bool, SyncError> {
        let changed = self.directory.set_hidden(device_id, hidden);
        let token = self.require_token()?;
        self.backend.hide_device(&token, device_id, hidden).await?;
        info!(
            "Device {} is now {}",
            device_id,
            if hidden { "hidden" } else { "shown" }
        );
        Ok(changed)
    }

    fn require_token(&self) -> Result<String, SyncError> {
        self.oracle
            .current_token()
            .ok_or(SyncError::NotAuthenticated)
    }

    fn set_status(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }
}
