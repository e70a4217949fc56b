//! Test doubles shared by the unit tests

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::models::{DeviceRecord, Profile};
use crate::polling::{Scheduler, TaskHandle, Tick};
use crate::sync::{DeviceBackend, SyncError};

/// The single owner-feed device used across scenarios
pub fn bike() -> DeviceRecord {
    DeviceRecord::new("a", "Bike1").at(1.0, 2.0)
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Status(u16),
    Decode,
}

#[derive(Default)]
struct FakeState {
    private: Vec<DeviceRecord>,
    public: Vec<DeviceRecord>,
    username: Option<String>,
    failure: Option<Failure>,
    device_failure: Option<u16>,
    calls: Vec<String>,
}

/// In-memory backend that records every call
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_private(&self, records: Vec<DeviceRecord>) {
        self.state.lock().private = records;
    }

    pub fn set_public(&self, records: Vec<DeviceRecord>) {
        self.state.lock().public = records;
    }

    /// `None` makes `/profile` answer 401
    pub fn set_username(&self, username: Option<&str>) {
        self.state.lock().username = username.map(str::to_string);
    }

    pub fn fail_with_status(&self, status: u16) {
        self.state.lock().failure = Some(Failure::Status(status));
    }

    /// Fail only the two device feeds; other calls keep working
    pub fn fail_devices_with_status(&self, status: u16) {
        self.state.lock().device_failure = Some(status);
    }

    pub fn fail_decoding(&self) {
        self.state.lock().failure = Some(Failure::Decode);
    }

    pub fn recover(&self) {
        let mut state = self.state.lock();
        state.failure = None;
        state.device_failure = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn record_device_call(&self, call: String, endpoint: &str) -> Result<(), SyncError> {
        self.record(call, endpoint)?;
        match self.state.lock().device_failure {
            None => Ok(()),
            Some(status) => Err(SyncError::Http {
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }

    fn record(&self, call: String, endpoint: &str) -> Result<(), SyncError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.failure {
            None => Ok(()),
            Some(Failure::Status(status)) => Err(SyncError::Http {
                endpoint: endpoint.to_string(),
                status,
            }),
            Some(Failure::Decode) => Err(SyncError::Decode {
                endpoint: endpoint.to_string(),
                source: serde_json::from_str::<Vec<DeviceRecord>>("{").unwrap_err(),
            }),
        }
    }
}

/// Strip the private settings the public feed never carries
fn public_view(record: &DeviceRecord) -> DeviceRecord {
    DeviceRecord {
        is_hidden: false,
        nickname: String::new(),
        color: String::new(),
        ..record.clone()
    }
}

#[async_trait]
impl DeviceBackend for FakeBackend {
    async fn device_settings(&self, token: &str) -> Result<Vec<DeviceRecord>, SyncError> {
        self.record_device_call(
            format!("GET /get-device-settings {}", token),
            "/get-device-settings",
        )?;
        Ok(self.state.lock().private.clone())
    }

    async fn device_locations(&self) -> Result<Vec<DeviceRecord>, SyncError> {
        self.record_device_call("GET /device-locations".to_string(), "/device-locations")?;
        Ok(self.state.lock().public.iter().map(public_view).collect())
    }

    async fn profile(&self, token: &str) -> Result<Profile, SyncError> {
        self.record(format!("GET /profile {}", token), "/profile")?;
        match self.state.lock().username.clone() {
            Some(username) => Ok(Profile { username }),
            None => Err(SyncError::Http {
                endpoint: "/profile".to_string(),
                status: 401,
            }),
        }
    }

    async fn change_nickname(
        &self,
        token: &str,
        device_id: &str,
        nickname: &str,
    ) -> Result<(), SyncError> {
        self.record(
            format!("POST /change-nickname {} {} {}", token, device_id, nickname),
            "/change-nickname",
        )
    }

    async fn change_color(
        &self,
        token: &str,
        device_id: &str,
        color: &str,
    ) -> Result<(), SyncError> {
        self.record(
            format!("POST /change-color {} {} {}", token, device_id, color),
            "/change-color",
        )
    }

    async fn hide_device(&self, token: &str, device_id: &str, hide: bool) -> Result<(), SyncError> {
        self.record(
            format!("POST /hide-device {} {} {}", token, device_id, hide),
            "/hide-device",
        )
    }
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    live: BTreeMap<u64, (Duration, Tick)>,
    scheduled_total: usize,
}

/// Scheduler driven by hand: ticks run only when the test fires them
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of live repeating tasks
    pub fn live(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Intervals of the live tasks
    pub fn intervals(&self) -> Vec<Duration> {
        self.state.lock().live.values().map(|(i, _)| *i).collect()
    }

    /// Number of tasks ever scheduled
    pub fn scheduled_total(&self) -> usize {
        self.state.lock().scheduled_total
    }

    /// Run one tick of every live task
    pub async fn fire(&self) {
        let ticks: Vec<Tick> = self
            .state
            .lock()
            .live
            .values()
            .map(|(_, tick)| tick.clone())
            .collect();
        for tick in ticks {
            tick().await;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, tick: Tick) -> TaskHandle {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id, (interval, tick));
        state.scheduled_total += 1;
        TaskHandle::new(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.state.lock().live.remove(&handle.id());
    }
}
