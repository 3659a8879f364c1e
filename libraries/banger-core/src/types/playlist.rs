/// Playlist types
use super::ids::PlaylistId;
use super::track::Track;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed id of the built-in favorites playlist
pub const FAVORITES_PLAYLIST_ID: &str = "favorites_default";

/// Fixed id of the built-in recently played playlist
pub const RECENTLY_PLAYED_PLAYLIST_ID: &str = "recently_played_default";

/// Maximum number of entries kept in the recently played history
pub const HISTORY_LIMIT: usize = 50;

/// An ordered, duplicate-free list of tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub description: Option<String>,
    pub tracks: Vec<Track>,
    pub created_at: DateTime<Utc>,

    /// Built-in playlists cannot be renamed or deleted
    pub is_default: bool,
}

impl Playlist {
    /// Create an empty user playlist with a generated id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            description: None,
            tracks: Vec::new(),
            created_at: Utc::now(),
            is_default: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a track unless it is already present.
    ///
    /// Returns `true` if the track was added.
    pub fn add_track(&mut self, track: Track) -> bool {
        if self.contains_track(&track) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove a track by id. Returns `true` if something was removed.
    pub fn remove_track(&mut self, track: &Track) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id != track.id);
        self.tracks.len() != before
    }

    pub fn contains_track(&self, track: &Track) -> bool {
        self.tracks.iter().any(|t| t.id == track.id)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether this playlist is one of the two built-in playlists
    pub fn is_protected_id(id: &PlaylistId) -> bool {
        id.as_str() == FAVORITES_PLAYLIST_ID || id.as_str() == RECENTLY_PLAYED_PLAYLIST_ID
    }
}
