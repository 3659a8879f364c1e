//! Interactive playback
//!
//! Builds a session around the simulated engine, attaches the console
//! surfaces and a store worker, and maps typed console commands onto the
//! session handle.

use crate::engine::SimulatedEngine;
use crate::error::Result;
use crate::presenter::{LoggingMediaSurface, MiniPlayer, NowPlayingView, ProgressLine};
use banger_core::types::{Playlist, PlaylistId, RepeatMode, Track};
use banger_core::{ArtworkLoader, PlaylistStore};
use banger_playback::ticker::TickerHandle;
use banger_playback::worker::await_reply;
use banger_playback::{
    driver, MediaSessionPublisher, PlaybackConfig, PlaybackObserver, PositionTicker, Session,
    SessionHandle, SessionState, StoreWorker,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a queue should be played
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub shuffle: bool,
    pub repeat: RepeatMode,
    /// Virtual clock multiplier for the simulated engine
    pub speed: f64,
    pub progress: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatMode::Off,
            speed: 1.0,
            progress: true,
        }
    }
}

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    Pause,
    Resume,
    Toggle,
    Seek(Duration),
    Shuffle,
    Repeat,
    Favorite,
    Stop,
    Status,
    /// Add the current track to a playlist
    AddTo(String),
    /// Remove the current track from a playlist
    RemoveFrom(String),
    NewPlaylist(String),
    RenamePlaylist { id: String, name: String },
    DeletePlaylist(String),
    Playlists,
    Quit,
}

impl Input {
    /// Parse one console line
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = words.next()?.to_ascii_lowercase();

        let input = match command.as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" | "previous" => Self::Previous,
            "pause" => Self::Pause,
            "play" | "resume" => Self::Resume,
            "t" | "toggle" => Self::Toggle,
            "seek" => {
                let secs: u64 = words.next()?.parse().ok()?;
                Self::Seek(Duration::from_secs(secs))
            }
            "s" | "shuffle" => Self::Shuffle,
            "r" | "repeat" => Self::Repeat,
            "f" | "fav" | "favorite" => Self::Favorite,
            "stop" => Self::Stop,
            "?" | "status" => Self::Status,
            "add" => Self::AddTo(words.next()?.to_string()),
            "drop" => Self::RemoveFrom(words.next()?.to_string()),
            "new" => Self::NewPlaylist(rest(words)?),
            "rename" => {
                let id = words.next()?.to_string();
                Self::RenamePlaylist {
                    id,
                    name: rest(words)?,
                }
            }
            "delete" => Self::DeletePlaylist(words.next()?.to_string()),
            "l" | "lists" => Self::Playlists,
            "q" | "quit" | "exit" => Self::Quit,
            _ => return None,
        };
        Some(input)
    }
}

/// Remaining words as one name, if any
fn rest<'a>(words: impl Iterator<Item = &'a str>) -> Option<String> {
    let name = words.collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

pub const HELP: &str = "commands: next, prev, pause, play, toggle, seek <secs>, shuffle, repeat, fav, stop, status, \
     add <playlist>, drop <playlist>, new <name>, rename <playlist> <name>, delete <playlist>, lists, quit";

/// A running playback session with its console surfaces
pub struct Player {
    handle: SessionHandle,
    engine: SimulatedEngine,
    worker: StoreWorker,
    task: JoinHandle<Session>,
    worker_task: JoinHandle<()>,
    ticker: Option<TickerHandle>,

    // The registry only holds weak references
    _observers: Vec<Arc<dyn PlaybackObserver>>,
}

impl Player {
    /// Start the session driver and its collaborators on the current runtime
    pub fn start(
        config: &PlaybackConfig,
        store: Arc<dyn PlaylistStore>,
        artwork: Option<Arc<dyn ArtworkLoader>>,
        options: &PlayOptions,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let engine = SimulatedEngine::new(engine_tx, options.speed);

        let (worker, worker_task) = StoreWorker::spawn(store);

        let mut publisher = MediaSessionPublisher::new(Arc::new(LoggingMediaSurface))
            .with_notifications(config.enable_notification);
        if let Some(loader) = artwork {
            publisher = publisher.with_artwork_loader(loader);
        }

        let session_config = PlaybackConfig {
            initial_shuffle: options.shuffle,
            initial_repeat: options.repeat,
            ..config.clone()
        };
        let session = Session::new(session_config, engine.boxed())
            .with_media_session(publisher)
            .with_worker(worker.clone());

        let mut observers: Vec<Arc<dyn PlaybackObserver>> = vec![Arc::new(NowPlayingView::stdout())];
        if config.enable_mini_player {
            observers.push(Arc::new(MiniPlayer::stdout()));
        }
        for observer in &observers {
            session.observers().add(observer);
        }

        let (handle, task) = driver::spawn(session, engine_rx);

        let ticker = options.progress.then(|| {
            PositionTicker::new(Arc::new(handle.clone()), Arc::new(ProgressLine::stderr()))
                .start(config.ticker_interval())
        });

        info!(
            shuffle = options.shuffle,
            repeat = %options.repeat,
            speed = options.speed,
            "Player started"
        );

        Self {
            handle,
            engine,
            worker,
            task,
            worker_task,
            ticker,
            _observers: observers,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The engine, for registering track lengths before queueing
    pub fn engine(&self) -> &SimulatedEngine {
        &self.engine
    }

    /// Queue `tracks` and start playing
    pub fn play(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.engine.register_all(&tracks);
        self.handle.load_and_play(tracks, start_index)?;
        Ok(())
    }

    /// Apply one console command; `false` means the user asked to quit
    pub async fn apply(&self, input: Input) -> Result<bool> {
        debug!(input = ?input, "Console command");

        match input {
            Input::Next => self.handle.play_next()?,
            Input::Previous => self.handle.play_previous()?,
            Input::Pause => self.handle.pause()?,
            Input::Resume => self.handle.resume()?,
            Input::Toggle => self.handle.toggle_play_pause()?,
            Input::Seek(position) => self.handle.seek_to(position)?,
            Input::Shuffle => self.handle.toggle_shuffle()?,
            Input::Repeat => self.handle.toggle_repeat()?,
            Input::Stop => self.handle.stop()?,
            Input::Favorite => {
                match self.current_track().await? {
                    Some(track) => {
                        let favorite = self.handle.toggle_favorite(&track).await?;
                        println!(
                            "{} {} favorites",
                            track.title,
                            if favorite { "added to" } else { "removed from" }
                        );
                    }
                    None => println!("Nothing playing"),
                }
            }
            Input::Status => {
                let s = self.handle.snapshot().await?;
                println!(
                    "{} | {} | track {}/{} | shuffle {} | repeat {}",
                    s.state,
                    s.track.as_ref().map_or("-", |t| t.title.as_str()),
                    s.index.map_or(0, |i| i + 1),
                    s.queue_len,
                    if s.shuffle { "on" } else { "off" },
                    s.repeat
                );
            }
            Input::AddTo(id) => match self.current_track().await? {
                Some(track) => {
                    self.worker.add_track(PlaylistId::from(id.as_str()), track);
                    self.report_playlist(&id).await?;
                }
                None => println!("Nothing playing"),
            },
            Input::RemoveFrom(id) => match self.current_track().await? {
                Some(track) => {
                    self.worker.remove_track(PlaylistId::from(id.as_str()), track);
                    self.report_playlist(&id).await?;
                }
                None => println!("Nothing playing"),
            },
            Input::NewPlaylist(name) => {
                self.worker.create_playlist(name.as_str(), None);
                let created = self
                    .playlists()
                    .await?
                    .into_iter()
                    .filter(|p| p.name == name)
                    .max_by_key(|p| p.created_at);
                match created {
                    Some(playlist) => println!("Created playlist {} ({})", playlist.name, playlist.id),
                    None => println!("Could not create playlist {name}"),
                }
            }
            Input::RenamePlaylist { id, name } => {
                self.worker.rename_playlist(PlaylistId::from(id.as_str()), name);
                self.report_playlist(&id).await?;
            }
            Input::DeletePlaylist(id) => {
                self.worker.delete_playlist(PlaylistId::from(id.as_str()));
                match self.find_playlist(&id).await? {
                    Some(playlist) => println!("{} cannot be deleted", playlist.name),
                    None => println!("Deleted playlist {id}"),
                }
            }
            Input::Playlists => {
                for playlist in self.playlists().await? {
                    println!(
                        "  {} - {} ({} tracks)",
                        playlist.id,
                        playlist.name,
                        playlist.track_count()
                    );
                }
            }
            Input::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn current_track(&self) -> Result<Option<Track>> {
        Ok(self.handle.snapshot().await?.track)
    }

    /// Playlists as the worker sees them, after every edit queued so far
    async fn playlists(&self) -> Result<Vec<Playlist>> {
        Ok(await_reply(self.worker.get_playlists()).await?)
    }

    async fn find_playlist(&self, id: &str) -> Result<Option<Playlist>> {
        Ok(self
            .playlists()
            .await?
            .into_iter()
            .find(|p| p.id.as_str() == id))
    }

    async fn report_playlist(&self, id: &str) -> Result<()> {
        match self.find_playlist(id).await? {
            Some(playlist) => println!("{}: {} tracks", playlist.name, playlist.track_count()),
            None => println!("No playlist {id}"),
        }
        Ok(())
    }

    /// Whether the queue has run out and nothing is playing
    ///
    /// Reads a snapshot, which is ordered after any transition in flight.
    pub async fn is_finished(&self) -> Result<bool> {
        let snapshot = self.handle.snapshot().await?;
        Ok(snapshot.state == SessionState::Ended && !snapshot.is_playing)
    }

    /// Drive the session from console input until quit, end of input,
    /// end of queue or Ctrl-C
    pub async fn run<R>(&self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut states = self.handle.subscribe_state();
        let mut input_open = true;

        println!("{HELP}");

        loop {
            tokio::select! {
                line = lines.next_line(), if input_open => match line? {
                    Some(line) => match Input::parse(&line) {
                        Some(input) => {
                            if !self.apply(input).await? {
                                break;
                            }
                        }
                        None if line.trim().is_empty() => {}
                        None => println!("{HELP}"),
                    },
                    None => {
                        debug!("Console input closed");
                        input_open = false;
                    }
                },
                changed = states.changed() => {
                    if changed.is_err() {
                        warn!("Session driver stopped unexpectedly");
                        break;
                    }
                    let state = *states.borrow_and_update();
                    if state == SessionState::Ended && self.is_finished().await? {
                        info!("Queue finished");
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Stop the driver and wait for pending store writes
    pub async fn shutdown(self) -> Result<()> {
        drop(self.ticker);
        if let Err(e) = self.handle.shutdown() {
            debug!(error = %e, "Session driver already stopped");
        }

        match self.task.await {
            Ok(session) => {
                debug!(state = %session.state(), "Session driver joined");
            }
            Err(e) => warn!(error = %e, "Session driver task failed"),
        }

        // The worker stops once the session and this handle are gone
        drop(self.handle);
        drop(self.worker);
        if let Err(e) = self.worker_task.await {
            warn!(error = %e, "Store worker task failed");
        }
        Ok(())
    }
}
