//! Periodic device polling
//!
//! - `scheduler`: repeating-task capability ([`Scheduler`]) and its tokio
//!   implementation
//! - `visibility`: visibility source the controller pauses and resumes on
//! - `controller`: the [`PollingController`] state machine

mod controller;
mod scheduler;
mod visibility;

pub use controller::{PollingController, PollingPhase};
pub use scheduler::{Scheduler, TaskHandle, Tick, TokioScheduler};
pub use visibility::{
    Subscription, Visibility, VisibilityObserver, VisibilitySignal, VisibilitySource,
};
