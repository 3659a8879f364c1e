//! Playback Events
//!
//! Session transitions are published on a broadcast bus so presentation
//! surfaces can follow the session without holding a reference to it.
//! Events are emitted at key points:
//! - State machine transitions
//! - Track changes (before the matching "playing" confirmation)
//! - Queue and mode changes
//! - Seeks

use crate::types::SessionState;
use banger_core::types::RepeatMode;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// State machine moved
    StateChanged {
        from: SessionState,
        to: SessionState,
    },

    /// A different track was handed to the engine
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished { track_id: String },

    /// Playhead moved by a seek
    PositionUpdate { position_ms: u64, duration_ms: u64 },

    /// Queue replaced or reordered
    QueueChanged {
        length: usize,
        index: Option<usize>,
    },

    /// Shuffle or repeat changed
    ModeChanged { shuffle: bool, repeat: RepeatMode },

    /// Engine fault
    Error { message: String },
}

/// Broadcast fan-out for [`PlaybackEvent`]
///
/// Slow subscribers lag and lose the oldest events; the session never
/// waits on them.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to every current subscriber
    pub fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
