/// Catalog track value type
use super::ids::TrackId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;
use url::Url;

/// Artist name used when the catalog leaves it blank
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Album name used when the catalog leaves it blank
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A streamable track as returned by the catalog or restored from storage.
///
/// Tracks are immutable once built. Two tracks are equal when their ids
/// match, regardless of the rest of the metadata, so a track reloaded from
/// a playlist row compares equal to the same track fetched from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,

    /// Stream locator handed to the playback engine
    #[serde(default)]
    pub stream_url: Option<String>,

    /// Cover art locator
    #[serde(default)]
    pub artwork_url: Option<String>,

    /// Duration in seconds, 0 when unknown
    #[serde(default)]
    pub duration_secs: u32,
}

impl Track {
    /// Create a track with the required metadata.
    ///
    /// Blank artist or album names are replaced with placeholders.
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        let artist = artist.into();
        let album = album.into();
        Self {
            id: id.into(),
            title: title.into(),
            artist: if artist.trim().is_empty() {
                UNKNOWN_ARTIST.to_string()
            } else {
                artist
            },
            album: if album.trim().is_empty() {
                UNKNOWN_ALBUM.to_string()
            } else {
                album
            },
            stream_url: None,
            artwork_url: None,
            duration_secs: 0,
        }
    }

    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    pub fn with_artwork_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Parsed stream locator, or `None` when missing or unresolvable
    pub fn stream_locator(&self) -> Option<Url> {
        parse_locator(self.stream_url.as_deref())
    }

    /// Parsed artwork locator, or `None` when missing or unresolvable
    pub fn artwork_locator(&self) -> Option<Url> {
        parse_locator(self.artwork_url.as_deref())
    }

    /// Whether the track can be handed to a playback engine
    pub fn is_playable(&self) -> bool {
        self.stream_locator().is_some()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_secs))
    }
}

fn parse_locator(raw: Option<&str>) -> Option<Url> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Url::parse(raw).ok()
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
