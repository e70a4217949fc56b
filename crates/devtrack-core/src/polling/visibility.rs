//! Visibility tracking
//!
//! Polling only runs while the client is visible. A [`VisibilitySource`]
//! reports the current state and notifies observers on transitions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Callback invoked on every visibility transition
pub type VisibilityObserver = Arc<dyn Fn(Visibility) + Send + Sync>;

/// Something that can tell whether the client is visible
pub trait VisibilitySource: Send + Sync {
    fn current(&self) -> Visibility;

    /// Register an observer; it stays registered until the returned
    /// [`Subscription`] is dropped
    fn subscribe(&self, observer: VisibilityObserver) -> Subscription;
}

/// Keeps an observer registered; dropping it deregisters
#[must_use = "dropping a Subscription deregisters the observer"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to undo
    pub fn detached() -> Self {
        Self { unsubscribe: None }
    }

    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

struct SignalState {
    current: Visibility,
    next_id: u64,
    observers: Vec<(u64, VisibilityObserver)>,
}

/// Visibility set by the application
///
/// Observers are notified only when the value actually changes, outside the
/// internal lock, so an observer may safely query the signal.
#[derive(Clone)]
pub struct VisibilitySignal {
    state: Arc<Mutex<SignalState>>,
}

impl Default for VisibilitySignal {
    fn default() -> Self {
        Self::new(Visibility::Visible)
    }
}

impl VisibilitySignal {
    pub fn new(initial: Visibility) -> Self {
        Self {
            state: Arc::new(Mutex::new(SignalState {
                current: initial,
                next_id: 0,
                observers: Vec::new(),
            })),
        }
    }

    /// Change visibility, notifying observers on a transition
    pub fn set(&self, visibility: Visibility) {
        let observers: Vec<VisibilityObserver> = {
            let mut state = self.state.lock();
            if state.current == visibility {
                return;
            }
            state.current = visibility;
            state.observers.iter().map(|(_, o)| o.clone()).collect()
        };

        for observer in observers {
            observer(visibility);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }
}

impl VisibilitySource for VisibilitySignal {
    fn current(&self) -> Visibility {
        self.state.lock().current
    }

    fn subscribe(&self, observer: VisibilityObserver) -> Subscription {
        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.observers.push((id, observer));
            id
        };

        let weak = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state.lock().observers.retain(|(other, _)| *other != id);
            }
        })
    }
}

impl fmt::Debug for VisibilitySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VisibilitySignal")
            .field("current", &state.current)
            .field("observers", &state.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (VisibilityObserver, Arc<Mutex<Vec<Visibility>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: VisibilityObserver = Arc::new(move |v: Visibility| sink.lock().push(v));
        (observer, seen)
    }

    #[test]
    fn test_notifies_on_transitions_only() {
        let signal = VisibilitySignal::default();
        let (observer, seen) = recorder();
        let _subscription = signal.subscribe(observer);

        signal.set(Visibility::Visible);
        signal.set(Visibility::Hidden);
        signal.set(Visibility::Hidden);
        signal.set(Visibility::Visible);

        assert_eq!(*seen.lock(), vec![Visibility::Hidden, Visibility::Visible]);
        assert_eq!(signal.current(), Visibility::Visible);
    }

    #[test]
    fn test_drop_subscription_deregisters() {
        let signal = VisibilitySignal::new(Visibility::Hidden);
        let (observer, seen) = recorder();

        let subscription = signal.subscribe(observer);
        assert_eq!(signal.observer_count(), 1);
        drop(subscription);
        assert_eq!(signal.observer_count(), 0);

        signal.set(Visibility::Visible);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe_leaves_other_observers() {
        let signal = VisibilitySignal::default();
        let (first, first_seen) = recorder();
        let (second, second_seen) = recorder();

        let first_sub = signal.subscribe(first);
        let _second_sub = signal.subscribe(second);
        first_sub.unsubscribe();

        signal.set(Visibility::Hidden);
        assert!(first_seen.lock().is_empty());
        assert_eq!(*second_seen.lock(), vec![Visibility::Hidden]);
    }

    #[test]
    fn test_observer_may_read_signal() {
        let signal = VisibilitySignal::default();
        let reader = signal.clone();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let _subscription = signal.subscribe(Arc::new(move |_: Visibility| {
            *sink.lock() = Some(reader.current());
        }));
        signal.set(Visibility::Hidden);

        assert_eq!(*seen.lock(), Some(Visibility::Hidden));
    }
}
