//! Device listing handlers

use anyhow::{bail, Result};

use devtrack_core::{DeviceRecord, Tracker};

use super::with_hint;
use crate::output::Output;

/// Fetch once and list devices
///
/// Hidden devices are left out unless `all` is set.
pub async fn list(tracker: &Tracker, all: bool, output: &Output) -> Result<()> {
    tracker.engine().fetch_devices().await.map_err(with_hint)?;

    let devices = listing(tracker, all);
    output.print_devices(&devices);
    Ok(())
}

/// Fetch once and show a single device
pub async fn show(tracker: &Tracker, device_id: &str, output: &Output) -> Result<()> {
    tracker.engine().fetch_devices().await.map_err(with_hint)?;

    let directory = tracker.directory();
    if !directory.select_id(device_id) {
        bail!("Device not found: {}", device_id);
    }
    let Some(device) = directory.selected() else {
        bail!("Device not found: {}", device_id);
    };

    output.print_device(&device);
    Ok(())
}

pub(crate) fn listing(tracker: &Tracker, all: bool) -> Vec<DeviceRecord> {
    if all {
        tracker.directory().records()
    } else {
        tracker.directory().visible()
    }
}
