//! Session driver task
//!
//! The [`Session`] is owned by one tokio task. Presentation surfaces talk to
//! it through a cloneable [`SessionHandle`]; engine callbacks raised on the
//! engine's own thread are forwarded through an mpsc channel. All observer
//! notifications therefore happen on the driver task, one input at a time.

use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::media_session::MediaCommand;
use crate::observers::{ObserverRegistry, PlaybackObserver};
use crate::session::Session;
use crate::ticker::PositionSource;
use crate::types::{SessionSnapshot, SessionState};
use crate::worker::{await_reply, StoreWorker};
use async_trait::async_trait;
use banger_core::types::{Playlist, RepeatMode, Track};
use banger_core::EngineEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const DRIVER: &str = "session driver";

#[derive(Debug)]
enum Command {
    LoadAndPlay {
        tracks: Vec<Track>,
        start_index: usize,
    },
    PlayTrack(Track),
    PlayUserPlaylist {
        playlist: Playlist,
        start_index: usize,
    },
    ShufflePlay(Vec<Track>),
    Next,
    Previous,
    Pause,
    Resume,
    TogglePlayPause,
    SeekTo(Duration),
    Stop,
    ToggleShuffle,
    ToggleRepeat,
    SetRepeat(RepeatMode),
    Media(MediaCommand),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Cloneable, thread-safe front for a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    events: EventBus,
    observers: ObserverRegistry,
    worker: Option<StoreWorker>,
}

/// Move `session` onto a driver task
///
/// `engine_events` carries the engine's notifications. The task ends on
/// [`SessionHandle::shutdown`] or once every handle is dropped, and hands
/// the session back.
pub fn spawn(
    mut session: Session,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
) -> (SessionHandle, JoinHandle<Session>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = SessionHandle {
        commands: tx,
        state: session.subscribe_state(),
        events: session.events().clone(),
        observers: session.observers().clone(),
        worker: session.worker().cloned(),
    };

    // A start issued before spawning still needs its confirmation
    let initial = session.take_pending_confirmation();
    let task = tokio::spawn(run(session, rx, engine_events, initial));
    (handle, task)
}

async fn run(
    mut session: Session,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    initial: Option<(u64, Duration)>,
) -> Session {
    let (confirm_tx, mut confirm_rx) = mpsc::unbounded_channel::<u64>();
    let mut engine_open = true;

    if let Some(pending) = initial {
        schedule_confirmation(&confirm_tx, pending);
    }

    info!("Session driver started");

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut session, command),
            },
            event = engine_events.recv(), if engine_open => match event {
                Some(event) => session.on_engine_event(event),
                None => {
                    debug!("Engine event channel closed");
                    engine_open = false;
                }
            },
            Some(generation) = confirm_rx.recv() => session.confirm_playing(generation),
        }

        if let Some(pending) = session.take_pending_confirmation() {
            schedule_confirmation(&confirm_tx, pending);
        }
    }

    info!("Session driver stopped");
    session
}

fn schedule_confirmation(tx: &mpsc::UnboundedSender<u64>, (generation, delay): (u64, Duration)) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(generation);
    });
}

fn apply(session: &mut Session, command: Command) {
    match command {
        Command::LoadAndPlay {
            tracks,
            start_index,
        } => session.load_and_play(tracks, start_index),
        Command::PlayTrack(track) => session.play_track(&track),
        Command::PlayUserPlaylist {
            playlist,
            start_index,
        } => session.play_user_playlist(&playlist, start_index),
        Command::ShufflePlay(tracks) => session.shuffle_play(&tracks),
        Command::Next => session.play_next(),
        Command::Previous => session.play_previous(),
        Command::Pause => session.pause(),
        Command::Resume => session.resume(),
        Command::TogglePlayPause => session.toggle_play_pause(),
        Command::SeekTo(position) => session.seek_to(position),
        Command::Stop => session.stop(),
        Command::ToggleShuffle => {
            session.toggle_shuffle();
        }
        Command::ToggleRepeat => {
            session.toggle_repeat();
        }
        Command::SetRepeat(mode) => session.set_repeat(mode),
        Command::Media(command) => session.handle_media_command(command),
        Command::Snapshot(reply) => {
            let _ = reply.send(session.snapshot());
        }
        // Handled by the loop
        Command::Shutdown => {}
    }
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::WorkerClosed(DRIVER))
    }

    pub fn load_and_play(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.send(Command::LoadAndPlay {
            tracks,
            start_index,
        })
    }

    pub fn play_track(&self, track: Track) -> Result<()> {
        self.send(Command::PlayTrack(track))
    }

    pub fn play_user_playlist(&self, playlist: Playlist, start_index: usize) -> Result<()> {
        self.send(Command::PlayUserPlaylist {
            playlist,
            start_index,
        })
    }

    pub fn shuffle_play(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(Command::ShufflePlay(tracks))
    }

    pub fn play_next(&self) -> Result<()> {
        self.send(Command::Next)
    }

    pub fn play_previous(&self) -> Result<()> {
        self.send(Command::Previous)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause)
    }

    pub fn seek_to(&self, position: Duration) -> Result<()> {
        self.send(Command::SeekTo(position))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(Command::ToggleShuffle)
    }

    pub fn toggle_repeat(&self) -> Result<()> {
        self.send(Command::ToggleRepeat)
    }

    pub fn set_repeat(&self, mode: RepeatMode) -> Result<()> {
        self.send(Command::SetRepeat(mode))
    }

    /// Forward an OS media-session command
    pub fn media_command(&self, command: MediaCommand) -> Result<()> {
        self.send(Command::Media(command))
    }

    /// Ask the driver to stop after the commands already queued
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| PlaybackError::WorkerClosed(DRIVER))
    }

    /// Flip a track's favorite flag and return the new state
    pub async fn toggle_favorite(&self, track: &Track) -> Result<bool> {
        let worker = self.worker.as_ref().ok_or(PlaybackError::WorkerClosed("store worker"))?;
        await_reply(worker.toggle_favorite(track.clone())).await
    }

    pub async fn is_favorite(&self, track: &Track) -> Result<bool> {
        let worker = self.worker.as_ref().ok_or(PlaybackError::WorkerClosed("store worker"))?;
        await_reply(worker.is_favorite(track.clone())).await
    }

    /// Latest session state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn add_observer(&self, observer: &Arc<dyn PlaybackObserver>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Arc<dyn PlaybackObserver>) -> bool {
        self.observers.remove(observer)
    }

    pub fn worker(&self) -> Option<&StoreWorker> {
        self.worker.as_ref()
    }
}

#[async_trait]
impl PositionSource for SessionHandle {
    async fn sample(&self) -> Option<(Duration, Option<Duration>)> {
        let snapshot = self.snapshot().await.ok()?;
        Some((snapshot.position, snapshot.duration))
    }

    async fn seek_to(&self, position: Duration) {
        let _ = SessionHandle::seek_to(self, position);
    }
}
