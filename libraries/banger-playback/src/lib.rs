//! Banger Player - Playback Session
//!
//! Platform-agnostic playback core for Banger Player.
//!
//! This crate provides:
//! - Queue sequencing with shuffle and repeat (Off, All, One)
//! - A playback session orchestrating a [`banger_core::PlaybackEngine`]
//! - An explicit session state machine, observable through `watch`
//! - Event bus and observer fan-out for presentation surfaces
//! - Media session and now-playing notification derivation
//! - A position ticker with drag-to-seek
//! - A serialized background worker for history, favorite and playlist writes
//!
//! # Architecture
//!
//! `banger-playback` never decodes audio and never talks to a database:
//! - The engine, catalog, store and OS media surface are traits
//! - [`Session`] is synchronous and owned by a single driver task
//! - [`SessionHandle`] is the cloneable async front
//!
//! # Example: Sequencing
//!
//! ```rust
//! use banger_playback::Sequencer;
//! use banger_core::types::{RepeatMode, Track};
//!
//! let tracks: Vec<Track> = ["a", "b", "c"]
//!     .into_iter()
//!     .map(|id| Track::new(id, id, "Artist", "Album"))
//!     .collect();
//!
//! let mut queue = Sequencer::new();
//! queue.set_queue(tracks, 2);
//!
//! // Off stops at the end of the queue
//! assert!(queue.next().is_none());
//!
//! // All wraps around
//! queue.set_repeat(RepeatMode::All);
//! assert_eq!(queue.next().unwrap().id.as_str(), "a");
//! ```
//!
//! # Example: Driving a Session
//!
//! ```rust,no_run
//! use banger_playback::{driver, PlaybackConfig, Session};
//! # use banger_core::{EngineStatus, PlaybackEngine, Result};
//! # use std::time::Duration;
//! # use url::Url;
//! # struct MyEngine;
//! # impl PlaybackEngine for MyEngine {
//! #     fn load(&mut self, _: &Url) -> Result<()> { Ok(()) }
//! #     fn play(&mut self) -> Result<()> { Ok(()) }
//! #     fn pause(&mut self) -> Result<()> { Ok(()) }
//! #     fn stop(&mut self) -> Result<()> { Ok(()) }
//! #     fn seek_to(&mut self, _: Duration) -> Result<()> { Ok(()) }
//! #     fn position(&self) -> Duration { Duration::ZERO }
//! #     fn duration(&self) -> Option<Duration> { None }
//! #     fn is_playing(&self) -> bool { false }
//! #     fn status(&self) -> EngineStatus { EngineStatus::Idle }
//! # }
//!
//! # async fn example(tracks: Vec<banger_core::Track>) -> banger_playback::Result<()> {
//! let (_engine_tx, engine_rx) = tokio::sync::mpsc::unbounded_channel();
//! let session = Session::new(PlaybackConfig::default(), Box::new(MyEngine));
//! let (handle, _task) = driver::spawn(session, engine_rx);
//!
//! handle.load_and_play(tracks, 0)?;
//! handle.play_next()?;
//! let snapshot = handle.snapshot().await?;
//! println!("{} is {}", snapshot.track.map(|t| t.title).unwrap_or_default(), snapshot.state);
//! # Ok(())
//! # }
//! ```

pub mod driver;
mod error;
pub mod events;
pub mod media_session;
mod observers;
mod sequencer;
mod session;
pub mod state;
pub mod ticker;
pub mod types;
pub mod worker;

// Public exports
pub use driver::SessionHandle;
pub use error::{PlaybackError, Result};
pub use events::{EventBus, PlaybackEvent};
pub use media_session::{
    MediaCommand, MediaSessionPublisher, MediaSessionSurface, NowPlayingNotification,
};
pub use observers::{ObserverRegistry, PlaybackObserver};
pub use sequencer::Sequencer;
pub use session::Session;
pub use state::{SessionEvent, StateMachine};
pub use ticker::{format_time, PositionSource, PositionTicker, ProgressSink, ProgressSnapshot};
pub use types::{PlaybackConfig, SessionSnapshot, SessionState};
pub use worker::StoreWorker;
