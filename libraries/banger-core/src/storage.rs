//! Playlist store contract

use crate::error::Result;
use crate::types::{Playlist, PlaylistId, Track};
use async_trait::async_trait;

/// Durable playlists, favorites and listening history
///
/// Mutations are issued from a background worker; the playback path never
/// awaits them inline.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    // ========================================================================
    // History
    // ========================================================================

    /// Move a track to the front of the recently played list, evicting the
    /// oldest entries beyond the history cap
    async fn record_history(&self, track: &Track) -> Result<()>;

    /// Most recent first
    async fn recently_played(&self) -> Result<Vec<Track>>;

    // ========================================================================
    // Favorites
    // ========================================================================

    async fn is_favorite(&self, track: &Track) -> Result<bool>;

    /// Flip the favorite flag and return the new state
    async fn toggle_favorite(&self, track: &Track) -> Result<bool>;

    async fn favorite_tracks(&self) -> Result<Vec<Track>>;

    // ========================================================================
    // Playlists
    // ========================================================================

    /// All playlists, default playlists first
    async fn get_playlists(&self) -> Result<Vec<Playlist>>;

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    async fn create_playlist(&self, name: &str, description: Option<&str>) -> Result<Playlist>;

    async fn rename_playlist(&self, id: &PlaylistId, name: &str) -> Result<()>;

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()>;

    /// Returns `false` when the track was already in the playlist
    async fn add_track(&self, id: &PlaylistId, track: &Track) -> Result<bool>;

    /// Returns `false` when the track was not in the playlist
    async fn remove_track(&self, id: &PlaylistId, track: &Track) -> Result<bool>;
}
