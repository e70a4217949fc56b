//! Device setting edits
//!
//! Each edit refreshes the directory first so the local change lands on the
//! current record, then pushes the change to the backend.

use anyhow::Result;

use devtrack_core::{SessionOracle, SyncError, Tracker};

use super::with_hint;
use crate::output::Output;

/// A change to one owner-only setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Nickname(String),
    Color(String),
    Hidden(bool),
}

impl Edit {
    fn describe(&self, device_id: &str) -> String {
        match self {
            Edit::Nickname(nickname) if nickname.is_empty() => {
                format!("Cleared nickname of {}", device_id)
            }
            Edit::Nickname(nickname) => format!("Renamed {} to {}", device_id, nickname),
            Edit::Color(color) => format!("Set color of {} to {}", device_id, color),
            Edit::Hidden(true) => format!("Hid {}", device_id),
            Edit::Hidden(false) => format!("Unhid {}", device_id),
        }
    }
}

pub async fn apply(tracker: &Tracker, device_id: &str, edit: Edit, output: &Output) -> Result<()> {
    let engine = tracker.engine();

    // Editing needs a token either way; fail before touching the network
    if !tracker.session().is_authenticated() {
        return Err(with_hint(SyncError::NotAuthenticated));
    }
    engine.fetch_devices().await.map_err(with_hint)?;

    let known = match &edit {
        Edit::Nickname(nickname) => engine.update_nickname(device_id, nickname).await,
        Edit::Color(color) => engine.update_color(device_id, color).await,
        Edit::Hidden(hidden) => engine.set_device_hidden(device_id, *hidden).await,
    }
    .map_err(with_hint)?;

    if !known {
        output.warn(&format!(
            "Device {} is not in your device list; change sent anyway",
            device_id
        ));
    }
    output.success(&edit.describe(device_id));
    Ok(())
}
