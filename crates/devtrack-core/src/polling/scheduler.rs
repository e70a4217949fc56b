//! Repeating task scheduling
//!
//! The polling controller never touches timers directly; it asks a
//! [`Scheduler`] for a repeating task and cancels it by handle. That keeps the
//! state machine testable without real time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Work run on every tick
pub type Tick = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifies one scheduled repeating task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Runs a tick repeatedly until cancelled
pub trait Scheduler: Send + Sync {
    /// Run `tick` every `interval`, first after one full interval
    fn schedule_repeating(&self, interval: Duration, tick: Tick) -> TaskHandle;

    /// Stop a repeating task; unknown or already-cancelled handles are ignored
    fn cancel(&self, handle: TaskHandle);
}

/// Shortest period a tokio interval accepts
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Commands sent to a repeating task
#[derive(Debug)]
enum TaskCommand {
    Shutdown,
}

#[derive(Default)]
struct TokioSchedulerState {
    next_id: u64,
    tasks: HashMap<u64, mpsc::Sender<TaskCommand>>,
}

/// Scheduler backed by spawned tokio tasks
///
/// Must be used from within a tokio runtime. A tick that is already running
/// when its task is cancelled runs to completion; only later ticks are
/// dropped.
#[derive(Default)]
pub struct TokioScheduler {
    state: Mutex<TokioSchedulerState>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks not yet cancelled
    pub fn active_tasks(&self) -> usize {
        self.state.lock().tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, tick: Tick) -> TaskHandle {
        let (command_tx, command_rx) = mpsc::channel(1);

        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.tasks.insert(id, command_tx);
            id
        };

        tokio::spawn(repeating_task(id, interval, tick, command_rx));
        debug!("Scheduled task {} every {:?}", id, interval);
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        let Some(command_tx) = self.state.lock().tasks.remove(&handle.0) else {
            return;
        };
        // A full channel means a shutdown is already queued; dropping the
        // sender below closes it either way
        let _ = command_tx.try_send(TaskCommand::Shutdown);
        debug!("Cancelled task {}", handle.0);
    }
}

/// Tick loop for one scheduled task
async fn repeating_task(
    id: u64,
    period: Duration,
    tick: Tick,
    mut command_rx: mpsc::Receiver<TaskCommand>,
) {
    let period = period.max(MIN_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick().await;
            }
            cmd = command_rx.recv() => {
                if matches!(cmd, Some(TaskCommand::Shutdown) | None) {
                    break;
                }
            }
        }
    }

    debug!("Task {} stopped", id);
}
