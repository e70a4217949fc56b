//! Device sync
//!
//! Pull-based synchronization of the local [`Directory`](crate::Directory)
//! with the device backend.
//!
//! ## Flow
//!
//! 1. Ask the session oracle for a bearer token
//! 2. With a token: `GET /get-device-settings` (owner feed, private settings)
//! 3. Without: `GET /device-locations` (public feed)
//! 4. Decode the full body, then bulk-replace the directory
//!
//! ## Usage
//!
//! ```ignore
//! let engine = SyncEngine::new(backend, session, directory.clone());
//! let report = engine.fetch_devices().await?;
//! ```

mod backend;
mod engine;
mod error;

pub use backend::{
    DeviceBackend, HttpBackend, CHANGE_COLOR_PATH, CHANGE_NICKNAME_PATH, DEVICE_LOCATIONS_PATH,
    DEVICE_SETTINGS_PATH, HIDE_DEVICE_PATH, PROFILE_PATH,
};
pub use engine::{FeedSource, FetchReport, SyncEngine, SyncStatus};
pub use error::{SyncError, SyncResult};
