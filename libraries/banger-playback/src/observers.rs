//! Observer fan-out
//!
//! Presentation surfaces register as [`PlaybackObserver`]s. The registry
//! only keeps weak references: a surface that is dropped simply stops
//! receiving callbacks and is pruned on the next notification.

use banger_core::types::Track;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::error;

/// Presentation-side listener
pub trait PlaybackObserver: Send + Sync {
    fn on_playback_state_changed(&self, is_playing: bool);

    fn on_track_changed(&self, track: Option<&Track>);
}

/// Registered observers
///
/// Cloning shares the same membership set.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    observers: Arc<Mutex<Vec<Weak<dyn PlaybackObserver>>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    ///
    /// Returns `false` if it was already registered.
    pub fn add(&self, observer: &Arc<dyn PlaybackObserver>) -> bool {
        let weak = Arc::downgrade(observer);
        let mut observers = self.lock();
        if observers.iter().any(|o| Weak::ptr_eq(o, &weak)) {
            return false;
        }
        observers.push(weak);
        true
    }

    /// Deregister an observer
    ///
    /// Returns `false` if it was not registered.
    pub fn remove(&self, observer: &Arc<dyn PlaybackObserver>) -> bool {
        let weak = Arc::downgrade(observer);
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|o| !Weak::ptr_eq(o, &weak));
        observers.len() != before
    }

    /// Live registrations
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|o| o.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_playback_state_changed(&self, is_playing: bool) {
        self.for_each("on_playback_state_changed", |o| {
            o.on_playback_state_changed(is_playing);
        });
    }

    pub fn notify_track_changed(&self, track: Option<&Track>) {
        self.for_each("on_track_changed", |o| o.on_track_changed(track));
    }

    /// Invoke `f` on a snapshot of the membership set
    ///
    /// The lock is released before any callback runs, so callbacks may add
    /// or remove observers. A panicking observer is logged and skipped.
    fn for_each(&self, callback: &'static str, f: impl Fn(&dyn PlaybackObserver)) {
        let snapshot: Vec<Arc<dyn PlaybackObserver>> = {
            let mut observers = self.lock();
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };

        for observer in snapshot {
            if catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))).is_err() {
                error!(callback, "Observer panicked during notification");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn PlaybackObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        states: AtomicUsize,
        tracks: AtomicUsize,
    }

    impl PlaybackObserver for Counter {
        fn on_playback_state_changed(&self, _is_playing: bool) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }

        fn on_track_changed(&self, _track: Option<&Track>) {
            self.tracks.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicker;

    impl PlaybackObserver for Panicker {
        fn on_playback_state_changed(&self, _is_playing: bool) {
            panic!("observer failure");
        }

        fn on_track_changed(&self, _track: Option<&Track>) {
            panic!("observer failure");
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = ObserverRegistry::new();
        let counter: Arc<dyn PlaybackObserver> = Arc::new(Counter::default());

        assert!(registry.add(&counter));
        assert!(!registry.add(&counter));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&counter));
        assert!(!registry.remove(&counter));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let registry = ObserverRegistry::new();
        let counter: Arc<dyn PlaybackObserver> = Arc::new(Counter::default());
        registry.add(&counter);
        drop(counter);

        registry.notify_playback_state_changed(true);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_observer_does_not_stop_fan_out() {
        let registry = ObserverRegistry::new();
        let first = Arc::new(Counter::default());
        let last = Arc::new(Counter::default());
        let first_dyn: Arc<dyn PlaybackObserver> = first.clone();
        let panicker: Arc<dyn PlaybackObserver> = Arc::new(Panicker);
        let last_dyn: Arc<dyn PlaybackObserver> = last.clone();

        registry.add(&first_dyn);
        registry.add(&panicker);
        registry.add(&last_dyn);

        registry.notify_playback_state_changed(false);
        registry.notify_track_changed(None);

        assert_eq!(first.states.load(Ordering::SeqCst), 1);
        assert_eq!(last.states.load(Ordering::SeqCst), 1);
        assert_eq!(first.tracks.load(Ordering::SeqCst), 1);
        assert_eq!(last.tracks.load(Ordering::SeqCst), 1);
    }
}
