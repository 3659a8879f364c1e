//! Shared fakes for playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use banger_core::types::{Playlist, PlaylistId, Track};
use banger_core::{BangerError, EngineStatus, PlaybackEngine, PlaylistStore};
use banger_playback::media_session::{
    MediaMetadata, MediaPlaybackState, MediaPlaybackStatus, NowPlayingNotification,
};
use banger_playback::{MediaSessionSurface, PlaybackConfig, PlaybackObserver};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

// ===== Tracks =====

pub fn create_test_track(id: &str) -> Track {
    Track::new(id, format!("Track {id}"), "Test Artist", "Test Album")
        .with_stream_url(format!("https://cdn.example.com/{id}.mp3"))
        .with_duration_secs(180)
}

pub fn create_test_tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| create_test_track(id)).collect()
}

pub fn unplayable_track(id: &str) -> Track {
    Track::new(id, "No Stream", "Test Artist", "Test Album")
}

/// Config with synchronous confirmation
pub fn instant_config() -> PlaybackConfig {
    PlaybackConfig {
        settle_delay_ms: 0,
        ..PlaybackConfig::default()
    }
}

// ===== Engine =====

#[derive(Debug)]
pub struct EngineState {
    pub calls: Vec<String>,
    pub playing: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub status: EngineStatus,
    pub fail_load: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            playing: false,
            position: Duration::ZERO,
            duration: None,
            status: EngineStatus::Idle,
            fail_load: false,
        }
    }
}

/// Engine double sharing its state with the test
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    pub state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn PlaybackEngine> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Stream locators passed to `load`, in order
    pub fn loaded(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("load:").map(str::to_string))
            .collect()
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().unwrap().position = position;
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.state.lock().unwrap().fail_load = fail;
    }

    pub fn playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    /// Run the loaded stream out, as a real backend does before raising `Ended`
    pub fn reach_end(&self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.status = EngineStatus::Ended;
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl PlaybackEngine for FakeEngine {
    fn load(&mut self, locator: &Url) -> banger_core::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_load {
            return Err(BangerError::engine("decoder refused stream"));
        }
        state.calls.push(format!("load:{locator}"));
        state.playing = false;
        state.position = Duration::ZERO;
        state.duration = Some(Duration::from_secs(180));
        state.status = EngineStatus::Buffering;
        Ok(())
    }

    fn play(&mut self) -> banger_core::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("play".into());
        state.playing = true;
        state.status = EngineStatus::Ready;
        Ok(())
    }

    fn pause(&mut self) -> banger_core::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("pause".into());
        state.playing = false;
        Ok(())
    }

    fn stop(&mut self) -> banger_core::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("stop".into());
        state.playing = false;
        state.status = EngineStatus::Idle;
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> banger_core::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("seek:{}", position.as_millis()));
        state.position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.state.lock().unwrap().position
    }

    fn duration(&self) -> Option<Duration> {
        self.state.lock().unwrap().duration
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn status(&self) -> EngineStatus {
        self.state.lock().unwrap().status
    }
}

// ===== Observers =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Playing(bool),
    Track(Option<String>),
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub seen: Mutex<Vec<Observed>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<Observed> {
        self.seen.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_playback_state_changed(&self, is_playing: bool) {
        self.seen.lock().unwrap().push(Observed::Playing(is_playing));
    }

    fn on_track_changed(&self, track: Option<&Track>) {
        self.seen
            .lock()
            .unwrap()
            .push(Observed::Track(track.map(|t| t.id.to_string())));
    }
}

pub fn as_observer<T: PlaybackObserver + 'static>(observer: &Arc<T>) -> Arc<dyn PlaybackObserver> {
    observer.clone()
}

// ===== Media session =====

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub metadata: Mutex<Vec<MediaMetadata>>,
    pub states: Mutex<Vec<MediaPlaybackState>>,
    pub notifications: Mutex<Vec<NowPlayingNotification>>,
}

impl RecordingSurface {
    pub fn last_status(&self) -> Option<MediaPlaybackStatus> {
        self.states.lock().unwrap().last().map(|s| s.status)
    }

    pub fn last_notification(&self) -> Option<NowPlayingNotification> {
        self.notifications.lock().unwrap().last().cloned()
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

// ===== Store =====

/// In-memory store that records every call
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub history: Mutex<Vec<Track>>,
    pub favorites: Mutex<Vec<Track>>,
    pub playlists: Mutex<Vec<Playlist>>,
    pub fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn history_ids(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.id.to_string())
            .collect()
    }

    fn check_writable(&self) -> banger_core::Result<()> {
        if *self.fail_writes.lock().unwrap() {
            Err(BangerError::storage("disk full"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PlaylistStore for MemoryStore {
    async fn record_history(&self, track: &Track) -> banger_core::Result<()> {
        self.check_writable()?;
        let mut history = self.history.lock().unwrap();
        history.retain(|t| t != track);
        history.insert(0, track.clone());
        history.truncate(banger_core::HISTORY_LIMIT);
        Ok(())
    }

    async fn recently_played(&self) -> banger_core::Result<Vec<Track>> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn is_favorite(&self, track: &Track) -> banger_core::Result<bool> {
        Ok(self.favorites.lock().unwrap().contains(track))
    }

    async fn toggle_favorite(&self, track: &Track) -> banger_core::Result<bool> {
        self.check_writable()?;
        let mut favorites = self.favorites.lock().unwrap();
        if favorites.contains(track) {
            favorites.retain(|t| t != track);
            Ok(false)
        } else {
            favorites.insert(0, track.clone());
            Ok(true)
        }
    }

    async fn favorite_tracks(&self) -> banger_core::Result<Vec<Track>> {
        Ok(self.favorites.lock().unwrap().clone())
    }

    async fn get_playlists(&self) -> banger_core::Result<Vec<Playlist>> {
        Ok(self.playlists.lock().unwrap().clone())
    }

    async fn get_playlist(&self, id: &PlaylistId) -> banger_core::Result<Option<Playlist>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> banger_core::Result<Playlist> {
        self.check_writable()?;
        let mut playlist = Playlist::new(name);
        playlist.description = description.map(str::to_string);
        self.playlists.lock().unwrap().push(playlist.clone());
        Ok(playlist)
    }

    async fn rename_playlist(&self, id: &PlaylistId, name: &str) -> banger_core::Result<()> {
        self.check_writable()?;
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| BangerError::PlaylistNotFound(id.clone()))?;
        playlist.name = name.to_string();
        Ok(())
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> banger_core::Result<()> {
        self.check_writable()?;
        self.playlists.lock().unwrap().retain(|p| &p.id != id);
        Ok(())
    }

    async fn add_track(&self, id: &PlaylistId, track: &Track) -> banger_core::Result<bool> {
        self.check_writable()?;
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| BangerError::PlaylistNotFound(id.clone()))?;
        Ok(playlist.add_track(track.clone()))
    }

    async fn remove_track(&self, id: &PlaylistId, track: &Track) -> banger_core::Result<bool> {
        self.check_writable()?;
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| BangerError::PlaylistNotFound(id.clone()))?;
        Ok(playlist.remove_track(track))
    }
}
