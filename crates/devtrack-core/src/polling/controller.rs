//! Polling controller
//!
//! Owns the repeating device fetch and its pause/resume lifecycle:
//!
//! ```text
//! Stopped --start--> Active --hidden--> Paused --visible--> Active ...
//!    ^                  |                  |
//!    +------stop--------+-------stop-------+
//! ```
//!
//! At most one tick task is live at any time. Resuming does not fetch right
//! away; the next fetch happens one full interval after the page is visible
//! again.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::scheduler::{Scheduler, TaskHandle, Tick};
use super::visibility::{Subscription, Visibility, VisibilityObserver, VisibilitySource};
use crate::sync::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingPhase {
    Stopped,
    Active,
    Paused,
}

#[derive(Debug)]
struct PollingState {
    phase: PollingPhase,
    rate: Duration,
    handle: Option<TaskHandle>,
    subscription: Option<Subscription>,
}

/// Periodically runs [`SyncEngine::fetch_devices`] while the client is visible
pub struct PollingController {
    engine: SyncEngine,
    scheduler: Arc<dyn Scheduler>,
    visibility: Arc<dyn VisibilitySource>,
    state: Arc<Mutex<PollingState>>,
}

impl PollingController {
    pub fn new(
        engine: SyncEngine,
        scheduler: Arc<dyn Scheduler>,
        visibility: Arc<dyn VisibilitySource>,
    ) -> Self {
        Self {
            engine,
            scheduler,
            visibility,
            state: Arc::new(Mutex::new(PollingState {
                phase: PollingPhase::Stopped,
                rate: Duration::ZERO,
                handle: None,
                subscription: None,
            })),
        }
    }

    pub fn phase(&self) -> PollingPhase {
        self.state.lock().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() != PollingPhase::Stopped
    }

    /// Interval of the current (or last) polling run
    pub fn rate(&self) -> Duration {
        self.state.lock().rate
    }

    /// Start polling every `rate`
    ///
    /// Fetches once right away, then on every tick. If the client is hidden
    /// at this point the controller starts out paused. Returns false, doing
    /// nothing, when polling is already running or `rate` is zero.
    pub async fn start_polling(&self, rate: Duration) -> bool {
        if rate.is_zero() {
            warn!("Refusing to poll with a zero interval");
            return false;
        }

        let tick = fetch_tick(self.engine.clone());

        {
            let mut state = self.state.lock();
            if state.phase != PollingPhase::Stopped {
                debug!("Polling already running, ignoring start");
                return false;
            }
            state.rate = rate;
            if self.visibility.current() == Visibility::Visible {
                state.handle = Some(self.scheduler.schedule_repeating(rate, tick.clone()));
                state.phase = PollingPhase::Active;
            } else {
                state.phase = PollingPhase::Paused;
            }
        }

        // Subscribing outside the lock: a source may call back immediately
        let subscription = self.visibility.subscribe(visibility_observer(
            Arc::downgrade(&self.state),
            self.scheduler.clone(),
            tick.clone(),
        ));
        {
            let visibility = self.visibility.current();
            let mut state = self.state.lock();
            if state.phase == PollingPhase::Stopped {
                // Stopped while subscribing; let the subscription drop
                return false;
            }
            state.subscription = Some(subscription);
            // Catch a transition that happened before the observer was live
            on_visibility_change(&mut state, self.scheduler.as_ref(), &tick, visibility);
        }

        info!("Polling started every {:?}", rate);

        // Failures are logged and recorded by the engine
        let _ = self.engine.fetch_devices().await;
        true
    }

    /// Stop polling and deregister the visibility observer
    ///
    /// Returns false when polling was not running. An in-flight fetch is not
    /// interrupted.
    pub fn stop_polling(&self) -> bool {
        let subscription = {
            let mut state = self.state.lock();
            if state.phase == PollingPhase::Stopped {
                return false;
            }
            if let Some(handle) = state.handle.take() {
                self.scheduler.cancel(handle);
            }
            state.phase = PollingPhase::Stopped;
            state.subscription.take()
        };

        drop(subscription);
        info!("Polling stopped");
        true
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

/// Tick that runs one device fetch
fn fetch_tick(engine: SyncEngine) -> Tick {
    Arc::new(move || {
        let engine = engine.clone();
        async move {
            if let Err(e) = engine.fetch_devices().await {
                debug!("Poll tick failed: {}", e);
            }
        }
        .boxed()
    })
}

fn visibility_observer(
    state: Weak<Mutex<PollingState>>,
    scheduler: Arc<dyn Scheduler>,
    tick: Tick,
) -> VisibilityObserver {
    Arc::new(move |visibility: Visibility| {
        let Some(state) = state.upgrade() else {
            return;
        };
        on_visibility_change(&mut state.lock(), scheduler.as_ref(), &tick, visibility);
    })
}

fn on_visibility_change(
    state: &mut PollingState,
    scheduler: &dyn Scheduler,
    tick: &Tick,
    visibility: Visibility,
) {
    match (state.phase, visibility) {
        (PollingPhase::Active, Visibility::Hidden) => {
            if let Some(handle) = state.handle.take() {
                scheduler.cancel(handle);
            }
            state.phase = PollingPhase::Paused;
            info!("Client hidden, polling paused");
        }
        (PollingPhase::Paused, Visibility::Visible) => {
            if let Some(stale) = state.handle.take() {
                scheduler.cancel(stale);
            }
            state.handle = Some(scheduler.schedule_repeating(state.rate, tick.clone()));
            state.phase = PollingPhase::Active;
            info!("Client visible, polling resumed every {:?}", state.rate);
        }
        _ => {}
    }
}
