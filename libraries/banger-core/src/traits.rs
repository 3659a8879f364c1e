/// Collaborator traits consumed by the playback core
use crate::error::Result;
use crate::types::{BrowseQuery, Track};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Coarse status reported by a playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Nothing loaded
    Idle,
    /// Media loaded, waiting for data
    Buffering,
    /// Media ready to render (playing or paused)
    Ready,
    /// Reached the end of the loaded media
    Ended,
}

/// Notifications raised by a playback engine.
///
/// Engines typically raise these on their own internal thread, so the
/// session receives them through a channel rather than a direct callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    StatusChanged(EngineStatus),
    IsPlayingChanged(bool),
    /// Decode or network fault
    Error(String),
}

/// External media-rendering primitive
///
/// Implementers open a stream locator and render it. Decoding, buffering
/// and output happen entirely behind this trait.
pub trait PlaybackEngine: Send {
    /// Replace the current media item with the given stream
    ///
    /// # Errors
    /// Returns an error if the engine rejects the locator
    fn load(&mut self, locator: &Url) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Stop rendering and release the current media item
    fn stop(&mut self) -> Result<()>;

    /// Move the playhead without changing the play/pause state
    fn seek_to(&mut self, position: Duration) -> Result<()>;

    fn position(&self) -> Duration;

    /// Duration of the loaded media, `None` while unknown
    fn duration(&self) -> Option<Duration>;

    fn is_playing(&self) -> bool;

    fn status(&self) -> EngineStatus;
}

/// Remote track catalog
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Free-text search
    ///
    /// Tracks without a resolvable stream locator are never returned.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>>;

    /// Browse by tag or server ordering
    async fn browse(&self, query: &BrowseQuery, limit: usize) -> Result<Vec<Track>>;
}

/// Async loader for cover art
#[async_trait]
pub trait ArtworkLoader: Send + Sync {
    /// Fetch the raw image bytes behind a locator
    async fn load(&self, locator: &Url) -> Result<Vec<u8>>;
}
