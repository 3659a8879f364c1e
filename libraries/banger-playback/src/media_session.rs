//! OS-level media session and now-playing notification
//!
//! Nothing here is stored between transitions: the session derives a fresh
//! metadata, playback state and notification from its current track and
//! state every time it changes, and hands them to a [`MediaSessionSurface`].

use banger_core::types::{Track, TrackId};
use banger_core::ArtworkLoader;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Title shown when nothing is loaded
pub const FALLBACK_TITLE: &str = "Banger";

/// Text shown when nothing is loaded
pub const FALLBACK_TEXT: &str = "Playing music";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
}

impl From<&Track> for MediaMetadata {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration_ms: track.duration().as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaPlaybackStatus {
    None,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Error,
}

/// Transport actions advertised to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaAction {
    Play,
    Pause,
    PlayPause,
    SkipToNext,
    SkipToPrevious,
    SeekTo,
}

pub const SUPPORTED_ACTIONS: [MediaAction; 6] = [
    MediaAction::Play,
    MediaAction::Pause,
    MediaAction::PlayPause,
    MediaAction::SkipToNext,
    MediaAction::SkipToPrevious,
    MediaAction::SeekTo,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPlaybackState {
    pub status: MediaPlaybackStatus,
    pub position_ms: u64,
    pub rate: f32,
    pub updated_at: DateTime<Utc>,
    pub actions: Vec<MediaAction>,
}

impl MediaPlaybackState {
    pub fn new(status: MediaPlaybackStatus, position: Duration) -> Self {
        Self {
            status,
            position_ms: position.as_millis() as u64,
            rate: 1.0,
            updated_at: Utc::now(),
            actions: SUPPORTED_ACTIONS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    Placeholder,
    Image(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationButton {
    Previous,
    Play,
    Pause,
    Next,
}

/// User-visible now-playing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingNotification {
    pub title: String,
    pub text: String,

    /// Pinned while playing
    pub ongoing: bool,

    pub buttons: Vec<NotificationButton>,
    pub artwork: Artwork,
}

impl NowPlayingNotification {
    pub fn for_track(track: &Track, is_playing: bool, artwork: Artwork) -> Self {
        let toggle = if is_playing {
            NotificationButton::Pause
        } else {
            NotificationButton::Play
        };

        Self {
            title: track.title.clone(),
            text: track.artist.clone(),
            ongoing: is_playing,
            buttons: vec![NotificationButton::Previous, toggle, NotificationButton::Next],
            artwork,
        }
    }

    /// Notification posted when no track is current
    pub fn fallback(is_playing: bool) -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            text: FALLBACK_TEXT.to_string(),
            ongoing: is_playing,
            buttons: vec![
                NotificationButton::Previous,
                NotificationButton::Play,
                NotificationButton::Next,
            ],
            artwork: Artwork::Placeholder,
        }
    }
}

/// Transport commands coming back from the OS media session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
    PlayPause,
    SkipToNext,
    SkipToPrevious,
    SeekTo(Duration),
    Stop,
}

/// Platform media session and notification tray
pub trait MediaSessionSurface: Send + Sync {
    fn set_metadata(&self, metadata: &MediaMetadata);

    fn set_playback_state(&self, state: &MediaPlaybackState);

    /// Post or replace the now-playing notification
    fn post_notification(&self, notification: &NowPlayingNotification);
}

/// Pushes session state to a [`MediaSessionSurface`]
///
/// Notifications are posted with a placeholder first. When an
/// [`ArtworkLoader`] is configured and a tokio runtime is available, the
/// cover is fetched in the background and the notification reposted once
/// it arrives, unless a newer publish happened in the meantime.
pub struct MediaSessionPublisher {
    surface: Arc<dyn MediaSessionSurface>,
    artwork_loader: Option<Arc<dyn ArtworkLoader>>,
    notifications: bool,
    generation: Arc<AtomicU64>,
    artwork_cache: Arc<Mutex<Option<(TrackId, Vec<u8>)>>>,
}

impl MediaSessionPublisher {
    pub fn new(surface: Arc<dyn MediaSessionSurface>) -> Self {
        Self {
            surface,
            artwork_loader: None,
            notifications: true,
            generation: Arc::new(AtomicU64::new(0)),
            artwork_cache: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_artwork_loader(mut self, loader: Arc<dyn ArtworkLoader>) -> Self {
        self.artwork_loader = Some(loader);
        self
    }

    /// Turn the notification half on or off
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    pub fn publish(&self, track: Option<&Track>, status: MediaPlaybackStatus, position: Duration) {
        if let Some(track) = track {
            self.surface.set_metadata(&MediaMetadata::from(track));
        }
        self.surface
            .set_playback_state(&MediaPlaybackState::new(status, position));

        if !self.notifications {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let is_playing = status == MediaPlaybackStatus::Playing;

        let Some(track) = track else {
            self.surface
                .post_notification(&NowPlayingNotification::fallback(is_playing));
            return;
        };

        if let Some(bytes) = self.cached_artwork(&track.id) {
            self.surface.post_notification(&NowPlayingNotification::for_track(
                track,
                is_playing,
                Artwork::Image(bytes),
            ));
            return;
        }

        self.surface.post_notification(&NowPlayingNotification::for_track(
            track,
            is_playing,
            Artwork::Placeholder,
        ));
        self.spawn_artwork_fetch(track, is_playing, generation);
    }

    fn spawn_artwork_fetch(&self, track: &Track, is_playing: bool, generation: u64) {
        let (Some(loader), Some(locator)) = (self.artwork_loader.clone(), track.artwork_locator())
        else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            debug!(track_id = %track.id, "No runtime for artwork fetch, keeping placeholder");
            return;
        };

        let surface = Arc::clone(&self.surface);
        let latest = Arc::clone(&self.generation);
        let cache = Arc::clone(&self.artwork_cache);
        let track = track.clone();

        handle.spawn(async move {
            let bytes = match loader.load(&locator).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(track_id = %track.id, error = %e, "Artwork load failed, keeping placeholder");
                    return;
                }
            };

            *cache.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((track.id.clone(), bytes.clone()));

            if latest.load(Ordering::SeqCst) == generation {
                surface.post_notification(&NowPlayingNotification::for_track(
                    &track,
                    is_playing,
                    Artwork::Image(bytes),
                ));
            } else {
                debug!(track_id = %track.id, "Artwork arrived after a newer publish, dropping");
            }
        });
    }

    fn cached_artwork(&self, id: &TrackId) -> Option<Vec<u8>> {
        let cache = self
            .artwork_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match cache.as_ref() {
            Some((cached_id, bytes)) if cached_id == id => Some(bytes.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MediaSessionPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSessionPublisher")
            .field("notifications", &self.notifications)
            .field("artwork_loader", &self.artwork_loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use banger_core::BangerError;
    use url::Url;

    #[derive(Default)]
    struct RecordingSurface {
        metadata: Mutex<Vec<MediaMetadata>>,
        states: Mutex<Vec<MediaPlaybackState>>,
        notifications: Mutex<Vec<NowPlayingNotification>>,
    }

    impl RecordingSurface {
        fn notifications(&self) -> Vec<NowPlayingNotification> {
            self.notifications.lock().unwrap().clone()
        }
    }

    impl MediaSessionSurface for RecordingSurface {
        fn set_metadata(&self, metadata: &MediaMetadata) {
            self.metadata.lock().unwrap().push(metadata.clone());
        }

        fn set_playback_state(&self, state: &MediaPlaybackState) {
            self.states.lock().unwrap().push(state.clone());
        }

        fn post_notification(&self, notification: &NowPlayingNotification) {
            self.notifications.lock().unwrap().push(notification.clone());
        }
    }

    struct StaticArtwork(Option<Vec<u8>>);

    #[async_trait]
    impl ArtworkLoader for StaticArtwork {
        async fn load(&self, _locator: &Url) -> banger_core::Result<Vec<u8>> {
            self.0
                .clone()
                .ok_or_else(|| BangerError::catalog("artwork unavailable"))
        }
    }

    fn create_test_track() -> Track {
        Track::new("42", "Night Drive", "Synth Person", "Neon")
            .with_stream_url("https://cdn.example.com/42.mp3")
            .with_artwork_url("https://cdn.example.com/42.jpg")
            .with_duration_secs(200)
    }

    async fn wait_for_notifications(surface: &RecordingSurface, count: usize) {
        for _ in 0..100 {
            if surface.notifications().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_publish_without_track_posts_fallback() {
        let surface = Arc::new(RecordingSurface::default());
        let publisher = MediaSessionPublisher::new(surface.clone());

        publisher.publish(None, MediaPlaybackStatus::None, Duration::ZERO);

        assert!(surface.metadata.lock().unwrap().is_empty());
        let posted = surface.notifications();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].title, FALLBACK_TITLE);
        assert_eq!(posted[0].text, FALLBACK_TEXT);
    }

    #[test]
    fn test_metadata_and_state_derived_from_track() {
        let surface = Arc::new(RecordingSurface::default());
        let publisher = MediaSessionPublisher::new(surface.clone());
        let track = create_test_track();

        publisher.publish(
            Some(&track),
            MediaPlaybackStatus::Playing,
            Duration::from_millis(1500),
        );

        let metadata = surface.metadata.lock().unwrap()[0].clone();
        assert_eq!(metadata.title, "Night Drive");
        assert_eq!(metadata.duration_ms, 200_000);

        let state = surface.states.lock().unwrap()[0].clone();
        assert_eq!(state.status, MediaPlaybackStatus::Playing);
        assert_eq!(state.position_ms, 1500);
        assert_eq!(state.rate, 1.0);
        assert_eq!(state.actions.len(), SUPPORTED_ACTIONS.len());

        // No runtime here, so only the placeholder is posted
        let posted = surface.notifications();
        assert_eq!(posted.len(), 1);
        assert!(posted[0].ongoing);
        assert_eq!(posted[0].artwork, Artwork::Placeholder);
        assert_eq!(posted[0].buttons[1], NotificationButton::Pause);
    }

    #[test]
    fn test_notifications_can_be_disabled() {
        let surface = Arc::new(RecordingSurface::default());
        let publisher = MediaSessionPublisher::new(surface.clone()).with_notifications(false);

        publisher.publish(
            Some(&create_test_track()),
            MediaPlaybackStatus::Paused,
            Duration::ZERO,
        );

        assert_eq!(surface.states.lock().unwrap().len(), 1);
        assert!(surface.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_artwork_reposts_notification() {
        let surface = Arc::new(RecordingSurface::default());
        let publisher = MediaSessionPublisher::new(surface.clone())
            .with_artwork_loader(Arc::new(StaticArtwork(Some(vec![1, 2, 3]))));
        let track = create_test_track();

        publisher.publish(Some(&track), MediaPlaybackStatus::Playing, Duration::ZERO);
        wait_for_notifications(&surface, 2).await;

        let posted = surface.notifications();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].artwork, Artwork::Placeholder);
        assert_eq!(posted[1].artwork, Artwork::Image(vec![1, 2, 3]));

        // Same track again reuses the cached cover immediately
        publisher.publish(Some(&track), MediaPlaybackStatus::Paused, Duration::ZERO);
        let posted = surface.notifications();
        assert_eq!(posted.len(), 3);
        assert_eq!(posted[2].artwork, Artwork::Image(vec![1, 2, 3]));
        assert!(!posted[2].ongoing);
    }

    #[tokio::test]
    async fn test_failed_artwork_keeps_placeholder() {
        let surface = Arc::new(RecordingSurface::default());
        let publisher = MediaSessionPublisher::new(surface.clone())
            .with_artwork_loader(Arc::new(StaticArtwork(None)));

        publisher.publish(
            Some(&create_test_track()),
            MediaPlaybackStatus::Playing,
            Duration::ZERO,
        );
        wait_for_notifications(&surface, 2).await;

        let posted = surface.notifications();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].artwork, Artwork::Placeholder);
    }
}
