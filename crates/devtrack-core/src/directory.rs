//! Device directory
//!
//! The client's local, authoritative view of the tracked devices. Records are
//! keyed by `device_id` and keep the order the backend returned them in.
//!
//! ## Selection
//!
//! The selected device is stored as an id and resolved against the current
//! collection on every read, so a caller asking for the selection always sees
//! edits applied through the id-based setters and never a stale copy. A bulk
//! replace keeps the selection only when the new collection still contains
//! that id.
//!
//! ## Sharing
//!
//! `Directory` is a cheap handle over shared state; clones observe and mutate
//! the same collection. Each operation holds the lock for its whole duration
//! and never across an `.await`.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::models::DeviceRecord;

#[derive(Debug, Default)]
struct DirectoryState {
    records: IndexMap<String, DeviceRecord>,
    selected: Option<String>,
}

impl DirectoryState {
    /// Store the selection; returns whether it changed
    fn set_selected(&mut self, selected: Option<String>) -> bool {
        let changed = self.selected != selected;
        self.selected = selected;
        changed
    }
}

/// Keyed collection of device records with an optional selection
#[derive(Debug, Clone)]
pub struct Directory {
    state: Arc<Mutex<DirectoryState>>,
    /// Bumped after every mutation
    revision: Arc<watch::Sender<u64>>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(DirectoryState::default())),
            revision: Arc::new(revision),
        }
    }

    /// Replace the whole collection
    ///
    /// Nothing from the previous collection survives: stale ids disappear and
    /// matching ids take the new record as-is. When the input repeats an id,
    /// the later record wins and keeps the first one's position.
    pub fn replace_all(&self, records: impl IntoIterator<Item = DeviceRecord>) {
        let records: IndexMap<String, DeviceRecord> = records
            .into_iter()
            .map(|record| (record.device_id.clone(), record))
            .collect();

        {
            let mut state = self.state.lock();
            if let Some(ref id) = state.selected {
                if !records.contains_key(id) {
                    state.selected = None;
                }
            }
            state.records = records;
        }
        self.bump();
    }

    /// Set a device's nickname; returns false when the id is unknown
    pub fn set_nickname(&self, device_id: &str, nickname: impl Into<String>) -> bool {
        let nickname = nickname.into();
        self.update(device_id, |record| record.nickname = nickname)
    }

    /// Set a device's display color; returns false when the id is unknown
    pub fn set_color(&self, device_id: &str, color: impl Into<String>) -> bool {
        let color = color.into();
        self.update(device_id, |record| record.color = color)
    }

    /// Hide or show a device; returns false when the id is unknown
    pub fn set_hidden(&self, device_id: &str, hidden: bool) -> bool {
        self.update(device_id, |record| record.is_hidden = hidden)
    }

    /// Select a device, or clear the selection with `None`
    ///
    /// Selecting a record that is not in the directory clears the selection
    /// and returns false.
    pub fn select(&self, record: Option<&DeviceRecord>) -> bool {
        match record {
            Some(record) => self.select_id(&record.device_id),
            None => {
                self.clear_selection();
                true
            }
        }
    }

    /// Select a device by id
    pub fn select_id(&self, device_id: &str) -> bool {
        let (found, changed) = {
            let mut state = self.state.lock();
            let found = state.records.contains_key(device_id);
            let changed = state.set_selected(found.then(|| device_id.to_string()));
            (found, changed)
        };
        if changed {
            self.bump();
        }
        found
    }

    pub fn clear_selection(&self) {
        let changed = self.state.lock().set_selected(None);
        if changed {
            self.bump();
        }
    }

    /// The currently selected device, resolved against the live collection
    pub fn selected(&self) -> Option<DeviceRecord> {
        let state = self.state.lock();
        state
            .selected
            .as_ref()
            .and_then(|id| state.records.get(id))
            .cloned()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    /// Empty the collection and clear the selection
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.records.clear();
            state.selected = None;
        }
        self.bump();
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceRecord> {
        self.state.lock().records.get(device_id).cloned()
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.state.lock().records.contains_key(device_id)
    }

    /// Snapshot of all records in order
    pub fn records(&self) -> Vec<DeviceRecord> {
        self.state.lock().records.values().cloned().collect()
    }

    /// Snapshot of the records that are not hidden
    pub fn visible(&self) -> Vec<DeviceRecord> {
        self.state
            .lock()
            .records
            .values()
            .filter(|record| !record.is_hidden)
            .cloned()
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.lock().records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Current revision number
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribe to revision changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Mutate the record with `device_id` in place
    fn update(&self, device_id: &str, f: impl FnOnce(&mut DeviceRecord)) -> bool {
        let found = match self.state.lock().records.get_mut(device_id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        };
        if found {
            self.bump();
        }
        found
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
