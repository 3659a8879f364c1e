//! Core types for playback management

use banger_core::types::{RepeatMode, Track};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing loaded, or stopped
    Idle,

    /// A track was handed to the engine and is settling
    Loading,

    /// Engine is rendering
    Playing,

    /// Paused mid-track
    Paused,

    /// Track or queue reached its end
    Ended,

    /// Engine fault, or no engine at all
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback configuration
///
/// Optional surfaces (history, notification, mini player) are switched on
/// and off here instead of living in separate session variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Recently played entries kept by the store
    pub history_size: usize,

    /// Position under which an "ended" event steps back instead of forward
    pub restart_threshold_ms: u64,

    /// Apply the near-start step-back rule on track end
    pub previous_on_early_end: bool,

    /// Delay before "confirmed playing" is fanned out after a track starts
    /// (0 confirms synchronously)
    pub settle_delay_ms: u64,

    /// Position ticker interval
    pub ticker_interval_ms: u64,

    /// Capacity of the transition broadcast channel
    pub event_capacity: usize,

    pub enable_history: bool,
    pub enable_notification: bool,
    pub enable_mini_player: bool,

    pub initial_repeat: RepeatMode,
    pub initial_shuffle: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            restart_threshold_ms: 3000,
            previous_on_early_end: true,
            settle_delay_ms: 100,
            ticker_interval_ms: 50,
            event_capacity: 64,
            enable_history: true,
            enable_notification: true,
            enable_mini_player: true,
            initial_repeat: RepeatMode::Off,
            initial_shuffle: false,
        }
    }
}

impl PlaybackConfig {
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_millis(self.restart_threshold_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ticker_interval(&self) -> Duration {
        Duration::from_millis(self.ticker_interval_ms.max(1))
    }
}

/// Point-in-time view of the session for presentation surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub track: Option<Track>,
    pub is_playing: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub queue_len: usize,
    pub index: Option<usize>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}
