//! devtrack core library
//!
//! This crate keeps a live, in-memory directory of tracked devices in sync
//! with a remote device-location backend.
//!
//! # Architecture
//!
//! - **Directory**: ordered device records plus the current selection; the
//!   single source of truth for readers
//! - **Sync engine**: pulls the owner feed or the public feed, depending on
//!   whether the session holds a bearer token, and bulk-replaces the directory
//! - **Polling**: repeats the fetch on an interval and pauses while the client
//!   is hidden
//! - **Session lifecycle**: login and logout, each ending in a refresh
//!
//! # Quick Start
//!
//! ```text
//! let tracker = Tracker::open()?;
//!
//! // Fetch once
//! tracker.engine().fetch_devices().await?;
//!
//! // Or keep polling
//! let polling = tracker.polling(Arc::new(VisibilitySignal::default()));
//! polling.start_polling(tracker.config().poll_interval()).await;
//! ```
//!
//! # Modules
//!
//! - `tracker`: wires everything together (main entry point)
//! - `models`: device records and the user profile
//! - `directory`: the device directory
//! - `session`, `credentials`: session state and token storage
//! - `sync`: backend transport and the sync engine
//! - `polling`: scheduler, visibility and polling controller
//! - `lifecycle`: login and logout
//! - `config`: application configuration

pub mod config;
pub mod credentials;
pub mod directory;
pub mod lifecycle;
pub mod models;
pub mod polling;
pub mod session;
pub mod sync;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use credentials::{MemoryCredentials, TokenFile};
pub use directory::Directory;
pub use lifecycle::{LoginReport, SessionLifecycle};
pub use models::{DeviceRecord, Profile};
pub use polling::{
    PollingController, PollingPhase, Scheduler, TokioScheduler, Visibility, VisibilitySignal,
    VisibilitySource,
};
pub use session::{CredentialStore, Session, SessionOracle};
pub use sync::{
    DeviceBackend, FeedSource, FetchReport, HttpBackend, SyncEngine, SyncError, SyncStatus,
};
pub use tracker::Tracker;
