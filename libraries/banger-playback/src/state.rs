//! Session state machine
//!
//! Every change of [`SessionState`] goes through [`next_state`], a pure
//! function over `(state, event)`. [`StateMachine`] holds the current value
//! in a `watch` channel so any number of readers can observe it.

use crate::types::SessionState;
use tokio::sync::watch;
use tracing::debug;

/// Discrete inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A track was handed to the engine
    LoadRequested,
    /// Engine is waiting for data
    EngineBuffering,
    /// Engine confirmed it is rendering
    EngineStarted,
    PauseRequested,
    ResumeRequested,
    /// Current track reached its end
    TrackEnded,
    /// No next or previous track under the current repeat mode
    QueueExhausted,
    /// Engine fault or missing engine
    EngineFailed,
    Stopped,
}

/// Transition function
///
/// Returns `None` when the event does not apply to `current`, including
/// events that would leave the state unchanged.
pub fn next_state(current: SessionState, event: SessionEvent) -> Option<SessionState> {
    use SessionEvent as E;
    use SessionState as S;

    let next = match (current, event) {
        (_, E::LoadRequested) => S::Loading,
        (S::Playing | S::Loading, E::EngineBuffering) => S::Loading,
        (_, E::EngineStarted) => S::Playing,
        (S::Playing | S::Loading, E::PauseRequested) => S::Paused,
        (S::Paused | S::Ended, E::ResumeRequested) => S::Playing,
        (S::Playing | S::Loading | S::Paused, E::TrackEnded) => S::Ended,
        (_, E::QueueExhausted) => S::Ended,
        (_, E::EngineFailed) => S::Error,
        (_, E::Stopped) => S::Idle,
        _ => return None,
    };

    (next != current).then_some(next)
}

/// Current session state, observable through `watch` receivers
#[derive(Debug)]
pub struct StateMachine {
    tx: watch::Sender<SessionState>,
}

impl StateMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Idle);
        Self { tx }
    }

    pub fn current(&self) -> SessionState {
        *self.tx.borrow()
    }

    /// Receiver that always holds the latest state
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Feed an event, returning `(from, to)` when the state changed
    pub fn apply(&self, event: SessionEvent) -> Option<(SessionState, SessionState)> {
        let from = self.current();
        match next_state(from, event) {
            Some(to) => {
                self.tx.send_replace(to);
                Some((from, to))
            }
            None => {
                debug!(state = %from, event = ?event, "Ignoring event");
                None
            }
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
