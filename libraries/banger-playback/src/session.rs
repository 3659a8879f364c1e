//! Playback session
//!
//! Ties the [`Sequencer`] to a [`PlaybackEngine`], drives the
//! [`StateMachine`], and fans every change out to the event bus, the
//! registered observers and the media session.
//!
//! `Session` is synchronous and single-owner. In an async application it is
//! owned by the driver task (see [`crate::driver`]), which feeds it
//! commands, engine events and settle-delay confirmations one at a time.
//!
//! Transport calls never return errors: faults are logged and reflected as
//! state, so a presentation surface can always render [`Session::snapshot`].

use crate::events::{EventBus, PlaybackEvent};
use crate::media_session::{MediaCommand, MediaPlaybackStatus, MediaSessionPublisher};
use crate::observers::ObserverRegistry;
use crate::sequencer::Sequencer;
use crate::state::{SessionEvent, StateMachine};
use crate::types::{PlaybackConfig, SessionSnapshot, SessionState};
use crate::worker::{ReplyReceiver, StoreWorker};
use banger_core::types::{Playlist, PlaylistId, RepeatMode, Track, TrackId};
use banger_core::{EngineEvent, EngineStatus, PlaybackEngine};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;

/// Single source of truth for what is playing
pub struct Session {
    config: PlaybackConfig,
    engine: Option<Box<dyn PlaybackEngine>>,
    sequencer: Sequencer,
    state: StateMachine,
    events: EventBus,
    observers: ObserverRegistry,
    media: Option<MediaSessionPublisher>,
    worker: Option<StoreWorker>,

    /// Bumped on every track start; confirmations carry it
    generation: u64,
    pending_confirmation: Option<u64>,
    confirmation_scheduled: Option<u64>,
    history_recorded: Option<u64>,

    /// Track currently handed to the engine
    loaded: Option<TrackId>,

    /// User playlist the queue was built from, if any
    current_playlist: Option<PlaylistId>,
}

impl Session {
    pub fn new(config: PlaybackConfig, engine: Box<dyn PlaybackEngine>) -> Self {
        Self::with_engine_factory(config, || Ok(engine))
    }

    /// Build a session whose engine may fail to initialize
    ///
    /// A failing factory is logged and leaves the session in the `Error`
    /// state with no engine; every transport call is then a no-op.
    pub fn with_engine_factory<F>(config: PlaybackConfig, factory: F) -> Self
    where
        F: FnOnce() -> banger_core::Result<Box<dyn PlaybackEngine>>,
    {
        let engine = match factory() {
            Ok(engine) => {
                debug!("Playback engine initialized");
                Some(engine)
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize playback engine");
                None
            }
        };

        let session = Self {
            sequencer: Sequencer::with_modes(config.initial_repeat, config.initial_shuffle),
            events: EventBus::new(config.event_capacity),
            state: StateMachine::new(),
            observers: ObserverRegistry::new(),
            media: None,
            worker: None,
            generation: 0,
            pending_confirmation: None,
            confirmation_scheduled: None,
            history_recorded: None,
            loaded: None,
            current_playlist: None,
            engine,
            config,
        };

        if session.engine.is_none() {
            session.transition(SessionEvent::EngineFailed);
        }
        session
    }

    pub fn with_media_session(mut self, publisher: MediaSessionPublisher) -> Self {
        self.media = Some(publisher);
        self
    }

    pub fn with_worker(mut self, worker: StoreWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Share an existing observer registry
    pub fn with_observers(mut self, observers: ObserverRegistry) -> Self {
        self.observers = observers;
        self
    }

    // ========================================================================
    // Queue
    // ========================================================================

    /// Replace the queue and start at `start_index`
    ///
    /// This is the only operation that establishes a new queue; an empty
    /// list stops playback and clears the current track.
    pub fn load_and_play(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.current_playlist = None;
        self.replace_queue(tracks, start_index);
    }

    /// Play a user playlist and remember it as the playing source
    pub fn play_user_playlist(&mut self, playlist: &Playlist, start_index: usize) {
        info!(playlist_id = %playlist.id, name = %playlist.name, "Playing user playlist");
        self.replace_queue(playlist.tracks.clone(), start_index);
        self.current_playlist = Some(playlist.id.clone());
    }

    /// Play a freshly shuffled copy of `tracks` from its first entry
    pub fn shuffle_play(&mut self, tracks: &[Track]) {
        let mut shuffled = tracks.to_vec();
        shuffled.shuffle(&mut thread_rng());
        self.load_and_play(shuffled, 0);
    }

    fn replace_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        if self.engine.is_none() {
            warn!("No playback engine, ignoring new queue");
            return;
        }
        debug!(tracks = tracks.len(), start_index, "Replacing queue");
        self.sequencer.set_queue(tracks, start_index);
        self.emit_queue_changed();

        match self.sequencer.current().cloned() {
            Some(track) => self.start_track(&track),
            None => self.clear_current(),
        }
    }

    fn clear_current(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.stop() {
                warn!(error = %e, "Engine stop failed");
            }
        }
        self.pending_confirmation = None;
        self.loaded = None;
        self.transition(SessionEvent::Stopped);
        self.observers.notify_track_changed(None);
        self.observers.notify_playback_state_changed(false);
        self.publish_media();
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Play a track from the current queue
    ///
    /// Only [`Session::load_and_play`] and its variants establish a queue. A
    /// track that is not queued, or has no resolvable stream, is logged and
    /// ignored, leaving queue, engine and state untouched.
    pub fn play_track(&mut self, track: &Track) {
        if track.stream_locator().is_none() {
            warn!(track_id = %track.id, title = %track.title, "Track has no playable stream, ignoring");
            return;
        }
        if self.engine.is_none() {
            warn!(track_id = %track.id, "No playback engine, ignoring play request");
            return;
        }

        if !self.sequencer.select(&track.id) {
            warn!(track_id = %track.id, title = %track.title, "Track is not in the queue, ignoring");
            return;
        }
        self.emit_queue_changed();
        self.start_track(track);
    }

    pub fn play_next(&mut self) {
        if !self.can_transport() {
            return;
        }
        match self.sequencer.next() {
            Some(track) => self.start_track(&track),
            None => self.exhaust("next"),
        }
    }

    pub fn play_previous(&mut self) {
        if !self.can_transport() {
            return;
        }
        match self.sequencer.previous() {
            Some(track) => self.start_track(&track),
            None => self.exhaust("previous"),
        }
    }

    /// Pause the engine
    ///
    /// Observers hear `false` on every call, even when already paused.
    pub fn pause(&mut self) {
        let Some(engine) = self.transport_engine() else {
            return;
        };
        if let Err(e) = engine.pause() {
            warn!(error = %e, "Engine pause failed");
        }

        self.transition(SessionEvent::PauseRequested);
        self.observers.notify_playback_state_changed(false);
        self.publish_media();
    }

    /// Resume the engine
    ///
    /// After a stop or a fault the current track is reloaded instead.
    /// Otherwise observers hear `true` on every call.
    pub fn resume(&mut self) {
        if !self.can_transport() {
            return;
        }

        if matches!(self.state.current(), SessionState::Idle | SessionState::Error) {
            if let Some(track) = self.sequencer.current().cloned() {
                self.start_track(&track);
            }
            return;
        }

        let Some(engine) = self.transport_engine() else {
            return;
        };
        if let Err(e) = engine.play() {
            self.fail(format!("resume failed: {e}"));
            return;
        }

        // A resume overrides any pending confirmation for this track
        self.pending_confirmation = None;
        self.transition(SessionEvent::ResumeRequested);
        self.observers.notify_playback_state_changed(true);
        self.publish_media();
        self.record_history_once();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Move the playhead without touching play/pause state
    pub fn seek_to(&mut self, position: Duration) {
        let Some(engine) = self.transport_engine() else {
            return;
        };
        let duration = engine.duration();
        let target = duration.map_or(position, |d| position.min(d));

        if let Err(e) = engine.seek_to(target) {
            warn!(error = %e, position_ms = target.as_millis() as u64, "Seek failed");
            return;
        }

        let duration = duration
            .or_else(|| self.sequencer.current().map(Track::duration))
            .unwrap_or_default();
        self.events.emit(PlaybackEvent::PositionUpdate {
            position_ms: target.as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
        });
        self.publish_media();
    }

    /// Stop rendering; the queue is kept so `resume` can reload
    pub fn stop(&mut self) {
        let Some(engine) = self.transport_engine() else {
            return;
        };
        if let Err(e) = engine.stop() {
            warn!(error = %e, "Engine stop failed");
        }

        info!("Playback stopped");
        self.pending_confirmation = None;
        self.transition(SessionEvent::Stopped);
        self.observers.notify_playback_state_changed(false);
        self.publish_media();
    }

    // ========================================================================
    // Modes
    // ========================================================================

    pub fn toggle_shuffle(&mut self) -> bool {
        let shuffle = self.sequencer.toggle_shuffle();
        info!(shuffle, "Shuffle toggled");
        self.emit_mode_changed();
        self.emit_queue_changed();
        shuffle
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.sequencer.is_shuffle() != enabled {
            self.toggle_shuffle();
        }
    }

    pub fn toggle_repeat(&mut self) -> RepeatMode {
        let repeat = self.sequencer.toggle_repeat();
        info!(repeat = %repeat, "Repeat mode changed");
        self.emit_mode_changed();
        repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        if self.sequencer.repeat_mode() != mode {
            self.sequencer.set_repeat(mode);
            self.emit_mode_changed();
        }
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Queue a favorite toggle; `None` when no store is attached
    pub fn toggle_favorite(&self, track: &Track) -> Option<ReplyReceiver<bool>> {
        self.worker
            .as_ref()
            .map(|worker| worker.toggle_favorite(track.clone()))
    }

    pub fn is_favorite(&self, track: &Track) -> Option<ReplyReceiver<bool>> {
        self.worker
            .as_ref()
            .map(|worker| worker.is_favorite(track.clone()))
    }

    // ========================================================================
    // Inputs from the engine and the OS
    // ========================================================================

    /// React to an engine notification
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        debug!(event = ?event, state = %self.state.current(), "Engine event");

        match event {
            EngineEvent::StatusChanged(EngineStatus::Buffering) => {
                if self.transition(SessionEvent::EngineBuffering) {
                    self.publish_media();
                }
            }
            EngineEvent::StatusChanged(EngineStatus::Ready) => {
                // Recovered from a rebuffer
                if self.pending_confirmation.is_none()
                    && self.state.current() == SessionState::Loading
                    && self.is_playing()
                    && self.transition(SessionEvent::EngineStarted)
                {
                    self.publish_media();
                }
            }
            EngineEvent::StatusChanged(EngineStatus::Ended) => self.on_track_ended(),
            EngineEvent::StatusChanged(EngineStatus::Idle) => {}
            EngineEvent::IsPlayingChanged(true) => self.on_engine_started(),
            EngineEvent::IsPlayingChanged(false) => self.on_engine_stopped(),
            EngineEvent::Error(message) => self.fail(message),
        }
    }

    /// Apply an OS media-session command
    pub fn handle_media_command(&mut self, command: MediaCommand) {
        debug!(command = ?command, "Media session command");
        match command {
            MediaCommand::Play => self.resume(),
            MediaCommand::Pause => self.pause(),
            MediaCommand::PlayPause => self.toggle_play_pause(),
            MediaCommand::SkipToNext => self.play_next(),
            MediaCommand::SkipToPrevious => self.play_previous(),
            MediaCommand::SeekTo(position) => self.seek_to(position),
            MediaCommand::Stop => self.stop(),
        }
    }

    /// Deliver the settle-delay confirmation for a track start
    ///
    /// Confirmations from a superseded start are dropped.
    pub fn confirm_playing(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping stale play confirmation");
            return;
        }
        if self.pending_confirmation == Some(generation) {
            self.pending_confirmation = None;
        }
        if !matches!(
            self.state.current(),
            SessionState::Loading | SessionState::Playing
        ) {
            debug!(state = %self.state.current(), "Track no longer starting, skipping confirmation");
            return;
        }

        self.transition(SessionEvent::EngineStarted);
        self.observers.notify_playback_state_changed(true);
        self.publish_media();
        self.record_history_once();
    }

    /// Generation awaiting confirmation and how long to wait
    ///
    /// Yields each pending generation once, so the caller schedules a
    /// single timer per track start.
    pub fn take_pending_confirmation(&mut self) -> Option<(u64, Duration)> {
        let generation = self.pending_confirmation?;
        if self.confirmation_scheduled == Some(generation) {
            return None;
        }
        self.confirmation_scheduled = Some(generation);
        Some((generation, self.config.settle_delay()))
    }

    fn on_engine_started(&mut self) {
        match self.state.current() {
            // Still settling; the confirmation reports it
            SessionState::Loading if self.pending_confirmation.is_some() => {}
            SessionState::Paused | SessionState::Ended => {
                // Resumed from outside, e.g. a headset button
                self.transition(SessionEvent::ResumeRequested);
                self.observers.notify_playback_state_changed(true);
                self.publish_media();
            }
            SessionState::Loading => {
                self.transition(SessionEvent::EngineStarted);
                self.publish_media();
            }
            _ => {}
        }
        self.record_history_once();
    }

    fn on_engine_stopped(&mut self) {
        let ended = self
            .engine
            .as_ref()
            .is_some_and(|engine| engine.status() == EngineStatus::Ended);

        if self.state.current() == SessionState::Playing && !ended {
            // Paused from outside
            self.transition(SessionEvent::PauseRequested);
            self.observers.notify_playback_state_changed(false);
            self.publish_media();
        }
    }

    fn on_track_ended(&mut self) {
        // An end raised for a stream that has since been replaced
        let engine_ended = self
            .engine
            .as_ref()
            .is_some_and(|engine| engine.status() == EngineStatus::Ended);
        if !engine_ended || self.state.current() == SessionState::Ended {
            debug!(state = %self.state.current(), "Ignoring stale end of track");
            return;
        }

        let Some(current) = self.sequencer.current().cloned() else {
            return;
        };
        let position = self.position();

        info!(track_id = %current.id, position_ms = position.as_millis() as u64, "Track ended");
        self.pending_confirmation = None;
        self.events.emit(PlaybackEvent::TrackFinished {
            track_id: current.id.to_string(),
        });
        self.transition(SessionEvent::TrackEnded);
        self.record_history(&current);

        if self.config.previous_on_early_end
            && position < self.config.restart_threshold()
            && self.sequencer.has_previous()
        {
            info!("Track ended near its start, stepping back");
            if let Some(previous) = self.sequencer.previous() {
                self.start_track(&previous);
            }
            return;
        }

        match self.sequencer.repeat_mode() {
            RepeatMode::One => self.restart_current(),
            RepeatMode::All => {
                let next = self
                    .sequencer
                    .next()
                    .or_else(|| self.sequencer.reset_to_start());
                if let Some(track) = next {
                    self.start_track(&track);
                }
            }
            RepeatMode::Off => match self.sequencer.next() {
                Some(track) => self.start_track(&track),
                None => self.exhaust("end of queue"),
            },
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Hand a track to the engine
    ///
    /// Order of effects: `Loading`, engine load and play, `TrackChanged`
    /// event and observer callback, then the "playing" confirmation, either
    /// inline or after the settle delay.
    fn start_track(&mut self, track: &Track) {
        let Some(locator) = track.stream_locator() else {
            warn!(track_id = %track.id, title = %track.title, "Track has no playable stream, ignoring");
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            warn!(track_id = %track.id, "No playback engine, ignoring play request");
            return;
        };

        self.generation += 1;
        self.pending_confirmation = None;
        let generation = self.generation;

        if let Err(e) = load_and_start(&mut **engine, &locator) {
            self.loaded = Some(track.id.clone());
            self.transition(SessionEvent::LoadRequested);
            self.fail(format!("failed to start {}: {e}", track.id));
            return;
        }

        let previous = self.loaded.replace(track.id.clone());
        self.transition(SessionEvent::LoadRequested);
        info!(track_id = %track.id, title = %track.title, artist = %track.artist, "Playing track");

        self.events.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.to_string(),
            previous_track_id: previous.map(|id| id.to_string()),
        });
        self.observers.notify_track_changed(Some(track));
        self.publish_media();

        if self.config.settle_delay_ms == 0 {
            self.confirm_playing(generation);
        } else {
            self.pending_confirmation = Some(generation);
        }
    }

    fn restart_current(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let restarted = engine.seek_to(Duration::ZERO).and_then(|()| engine.play());
        if let Err(e) = restarted {
            self.fail(format!("restart failed: {e}"));
            return;
        }

        debug!("Repeating current track");
        self.generation += 1;
        self.transition(SessionEvent::ResumeRequested);
        self.observers.notify_playback_state_changed(true);
        self.publish_media();
        self.record_history_once();
    }

    /// No next or previous track: stop and report not playing
    fn exhaust(&mut self, direction: &'static str) {
        info!(direction, "No more tracks in queue");
        if let Some(engine) = self.engine.as_mut() {
            if engine.is_playing() {
                if let Err(e) = engine.pause() {
                    warn!(error = %e, "Engine pause failed");
                }
            }
        }
        self.pending_confirmation = None;
        self.transition(SessionEvent::QueueExhausted);
        self.observers.notify_playback_state_changed(false);
        self.publish_media();
    }

    fn fail(&mut self, message: String) {
        error!(error = %message, "Playback fault");
        self.pending_confirmation = None;
        self.transition(SessionEvent::EngineFailed);
        self.events.emit(PlaybackEvent::Error { message });
        self.observers.notify_playback_state_changed(false);
        self.publish_media();
    }

    fn transition(&self, event: SessionEvent) -> bool {
        match self.state.apply(event) {
            Some((from, to)) => {
                debug!(from = %from, to = %to, "Session state changed");
                self.events.emit(PlaybackEvent::StateChanged { from, to });
                true
            }
            None => false,
        }
    }

    fn can_transport(&self) -> bool {
        self.engine.is_some() && !self.sequencer.is_empty()
    }

    fn transport_engine(&mut self) -> Option<&mut Box<dyn PlaybackEngine>> {
        if self.sequencer.is_empty() {
            return None;
        }
        self.engine.as_mut()
    }

    /// History for the current track instance, at most once
    fn record_history_once(&mut self) {
        if self.state.current() != SessionState::Playing
            || self.history_recorded == Some(self.generation)
        {
            return;
        }
        if let Some(track) = self.sequencer.current().cloned() {
            self.history_recorded = Some(self.generation);
            self.record_history(&track);
        }
    }

    fn record_history(&self, track: &Track) {
        if !self.config.enable_history {
            return;
        }
        if let Some(worker) = &self.worker {
            worker.record_history(track.clone());
        }
    }

    fn publish_media(&self) {
        if let Some(media) = &self.media {
            media.publish(self.current_track(), self.media_status(), self.position());
        }
    }

    fn media_status(&self) -> MediaPlaybackStatus {
        match self.state.current() {
            _ if self.current_track().is_none() => MediaPlaybackStatus::None,
            SessionState::Loading => MediaPlaybackStatus::Buffering,
            SessionState::Playing => MediaPlaybackStatus::Playing,
            SessionState::Paused => MediaPlaybackStatus::Paused,
            SessionState::Idle | SessionState::Ended => MediaPlaybackStatus::Stopped,
            SessionState::Error => MediaPlaybackStatus::Error,
        }
    }

    fn emit_queue_changed(&self) {
        self.events.emit(PlaybackEvent::QueueChanged {
            length: self.sequencer.len(),
            index: self.sequencer.current_index(),
        });
    }

    fn emit_mode_changed(&self) {
        self.events.emit(PlaybackEvent::ModeChanged {
            shuffle: self.sequencer.is_shuffle(),
            repeat: self.sequencer.repeat_mode(),
        });
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Live engine flag
    pub fn is_playing(&self) -> bool {
        self.engine.as_ref().is_some_and(|engine| engine.is_playing())
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    /// Current track, always read from the sequencer
    pub fn current_track(&self) -> Option<&Track> {
        self.sequencer.current()
    }

    /// Playback order
    pub fn queue(&self) -> Vec<Track> {
        self.sequencer.playlist()
    }

    pub fn is_shuffle(&self) -> bool {
        self.sequencer.is_shuffle()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.sequencer.repeat_mode()
    }

    pub fn current_playlist(&self) -> Option<&PlaylistId> {
        self.current_playlist.as_ref()
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn worker(&self) -> Option<&StoreWorker> {
        self.worker.as_ref()
    }

    pub fn position(&self) -> Duration {
        self.engine
            .as_ref()
            .map_or(Duration::ZERO, |engine| engine.position())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.engine.as_ref().and_then(|engine| engine.duration())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.current(),
            track: self.current_track().cloned(),
            is_playing: self.is_playing(),
            position: self.position(),
            duration: self
                .duration()
                .or_else(|| self.current_track().map(Track::duration)),
            queue_len: self.sequencer.len(),
            index: self.sequencer.current_index(),
            shuffle: self.sequencer.is_shuffle(),
            repeat: self.sequencer.repeat_mode(),
        }
    }
}

fn load_and_start(engine: &mut dyn PlaybackEngine, locator: &Url) -> banger_core::Result<()> {
    engine.load(locator)?;
    engine.play()
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state.current())
            .field("has_engine", &self.engine.is_some())
            .field("queue_len", &self.sequencer.len())
            .field("index", &self.sequencer.current_index())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
