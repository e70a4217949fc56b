//! Watch mode
//!
//! Polls the backend and reprints the device list whenever what it shows
//! changes, until interrupted with Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tracing::debug;

use devtrack_core::{DeviceRecord, SyncStatus, Tracker, VisibilitySignal};

use super::devices::listing;
use crate::output::{Output, OutputFormat};

pub async fn watch(
    tracker: &Tracker,
    interval_secs: Option<u64>,
    all: bool,
    output: &Output,
) -> Result<()> {
    let rate = match interval_secs {
        Some(0) => anyhow::bail!("Interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => tracker.config().poll_interval(),
    };

    // A terminal session stays visible for its whole lifetime
    let polling = tracker.polling(Arc::new(VisibilitySignal::default()));
    let mut revisions = tracker.directory().subscribe();
    let mut status = tracker.engine().subscribe_status();

    output.message(&format!(
        "Watching {} every {}s (Ctrl-C to stop)",
        tracker.config().backend_url,
        rate.as_secs()
    ));

    polling.start_polling(rate).await;
    let mut shown = listing(tracker, all);
    print_snapshot(&shown, output);
    revisions.borrow_and_update();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                revisions.borrow_and_update();
                if replace_if_changed(&mut shown, listing(tracker, all)) {
                    print_snapshot(&shown, output);
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                if *status.borrow_and_update() == SyncStatus::Error {
                    output.warn("Fetch failed; showing last known devices");
                }
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted, stopping watch");
                break;
            }
        }
    }

    polling.stop_polling();
    Ok(())
}

/// Keep `current` as the shown listing; returns whether it differs
///
/// A refetch bumps the directory revision even when nothing visible moved.
fn replace_if_changed(shown: &mut Vec<DeviceRecord>, current: Vec<DeviceRecord>) -> bool {
    if *shown == current {
        return false;
    }
    *shown = current;
    true
}

fn print_snapshot(devices: &[DeviceRecord], output: &Output) {
    if output.format == OutputFormat::Human {
        println!();
        println!("── {} ──", Local::now().format("%H:%M:%S"));
    }
    output.print_devices(devices);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_if_changed() {
        let bike = DeviceRecord::new("a", "Bike");
        let mut shown = vec![bike.clone()];

        assert!(!replace_if_changed(&mut shown, vec![bike.clone()]));

        let moved = DeviceRecord {
            latitude: 52.5,
            ..bike.clone()
        };
        assert!(replace_if_changed(&mut shown, vec![moved.clone()]));
        assert_eq!(shown, vec![moved.clone()]);

        assert!(!replace_if_changed(&mut shown, vec![moved]));
        assert!(replace_if_changed(&mut shown, Vec::new()));
        assert!(shown.is_empty());
    }
}
