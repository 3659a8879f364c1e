//! Catalog configuration and wire types.

use banger_core::types::{Track, TrackId};
use serde::Deserialize;

/// Public Jamendo API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.jamendo.com/";

/// Number of distinct queries kept in the result cache
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Configuration for connecting to the catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the API (e.g., "https://api.jamendo.com/")
    pub base_url: String,
    /// Application client id sent with every request
    pub client_id: String,
    /// Result cache capacity (0 disables caching)
    pub cache_size: usize,
}

impl CatalogConfig {
    /// Config for the public API with the given client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: client_id.into(),
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Envelope of every `v3.0/tracks/` response.
#[derive(Debug, Deserialize)]
pub struct TracksResponse {
    pub headers: ResponseHeaders,
    #[serde(default)]
    pub results: Vec<CatalogTrack>,
}

/// Status block the API returns alongside results.
#[derive(Debug, Deserialize)]
pub struct ResponseHeaders {
    pub status: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub results_count: u32,
}

impl ResponseHeaders {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// A single track as the catalog describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
    /// Stream URL
    #[serde(default)]
    pub audio: Option<String>,
    /// Cover art URL
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub duration: u32,
}

impl CatalogTrack {
    /// Convert into a domain track.
    ///
    /// Returns `None` when the stream locator is missing or unresolvable.
    pub fn into_track(self) -> Option<Track> {
        let mut track = Track::new(
            TrackId::new(self.id),
            self.name,
            self.artist_name.unwrap_or_default(),
            self.album_name.unwrap_or_default(),
        )
        .with_duration_secs(self.duration);

        track.stream_url = self.audio.filter(|a| !a.trim().is_empty());
        track.artwork_url = self.image.filter(|i| !i.trim().is_empty());

        track.is_playable().then_some(track)
    }
}
