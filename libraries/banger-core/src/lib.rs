//! Banger Player Core
//!
//! Platform-agnostic domain types, collaborator traits, and error handling
//! shared by every Banger Player crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `RepeatMode`, `BrowseQuery`
//! - **Collaborator Traits**: `PlaybackEngine`, `CatalogProvider`,
//!   `PlaylistStore`, `ArtworkLoader`
//! - **Error Handling**: Unified `BangerError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use banger_core::types::{Playlist, Track};
//!
//! let track = Track::new("1204669", "Wake Up", "Some Band", "")
//!     .with_stream_url("https://cdn.example.com/1204669.mp3")
//!     .with_duration_secs(214);
//! assert!(track.is_playable());
//! assert_eq!(track.album, "Unknown Album");
//!
//! let mut playlist = Playlist::new("Morning");
//! playlist.add_track(track.clone());
//! assert!(!playlist.add_track(track));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

pub use error::{BangerError, Result};
pub use storage::PlaylistStore;
pub use traits::{ArtworkLoader, CatalogProvider, EngineEvent, EngineStatus, PlaybackEngine};

pub use types::{
    BrowseQuery, CatalogOrder, Playlist, PlaylistId, RepeatMode, Track, TrackId,
    FAVORITES_PLAYLIST_ID, HISTORY_LIMIT, RECENTLY_PLAYED_PLAYLIST_ID,
};
