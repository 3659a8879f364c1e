//! Serialized background store worker
//!
//! History, favorite and playlist writes are queued on one FIFO channel and
//! applied by a single tokio task, so two writes to the same playlist never
//! interleave. Reads share the queue, which means a query observes every
//! write submitted before it.

use crate::error::{PlaybackError, Result};
use banger_core::types::{Playlist, PlaylistId, Track};
use banger_core::PlaylistStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Reply<T> = oneshot::Sender<banger_core::Result<T>>;

/// Pending reply from the worker
pub type ReplyReceiver<T> = oneshot::Receiver<banger_core::Result<T>>;

#[derive(Debug)]
pub enum StoreJob {
    RecordHistory(Track),
    ToggleFavorite {
        track: Track,
        reply: Option<Reply<bool>>,
    },
    IsFavorite {
        track: Track,
        reply: Reply<bool>,
    },
    AddTrack {
        playlist: PlaylistId,
        track: Track,
    },
    RemoveTrack {
        playlist: PlaylistId,
        track: Track,
    },
    CreatePlaylist {
        name: String,
        description: Option<String>,
    },
    DeletePlaylist(PlaylistId),
    RenamePlaylist {
        id: PlaylistId,
        name: String,
    },
    GetPlaylists(Reply<Vec<Playlist>>),
}

impl StoreJob {
    fn name(&self) -> &'static str {
        match self {
            Self::RecordHistory(_) => "record_history",
            Self::ToggleFavorite { .. } => "toggle_favorite",
            Self::IsFavorite { .. } => "is_favorite",
            Self::AddTrack { .. } => "add_track",
            Self::RemoveTrack { .. } => "remove_track",
            Self::CreatePlaylist { .. } => "create_playlist",
            Self::DeletePlaylist(_) => "delete_playlist",
            Self::RenamePlaylist { .. } => "rename_playlist",
            Self::GetPlaylists(_) => "get_playlists",
        }
    }
}

/// Handle to the background worker
///
/// Cheap to clone; the worker exits once every handle is dropped and the
/// queue has drained.
#[derive(Debug, Clone)]
pub struct StoreWorker {
    tx: mpsc::UnboundedSender<StoreJob>,
}

impl StoreWorker {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(store: Arc<dyn PlaylistStore>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, rx));
        (Self { tx }, task)
    }

    /// Queue a job
    pub fn submit(&self, job: StoreJob) -> Result<()> {
        self.tx.send(job).map_err(|rejected| {
            warn!(job = rejected.0.name(), "Store worker has shut down, dropping job");
            PlaybackError::WorkerClosed("store worker")
        })
    }

    pub fn record_history(&self, track: Track) {
        let _ = self.submit(StoreJob::RecordHistory(track));
    }

    /// Flip the favorite flag; the receiver yields the new state
    pub fn toggle_favorite(&self, track: Track) -> ReplyReceiver<bool> {
        let (reply, rx) = oneshot::channel();
        let _ = self.submit(StoreJob::ToggleFavorite {
            track,
            reply: Some(reply),
        });
        rx
    }

    pub fn is_favorite(&self, track: Track) -> ReplyReceiver<bool> {
        let (reply, rx) = oneshot::channel();
        let _ = self.submit(StoreJob::IsFavorite { track, reply });
        rx
    }

    pub fn add_track(&self, playlist: PlaylistId, track: Track) {
        let _ = self.submit(StoreJob::AddTrack { playlist, track });
    }

    pub fn remove_track(&self, playlist: PlaylistId, track: Track) {
        let _ = self.submit(StoreJob::RemoveTrack { playlist, track });
    }

    pub fn create_playlist(&self, name: impl Into<String>, description: Option<String>) {
        let _ = self.submit(StoreJob::CreatePlaylist {
            name: name.into(),
            description,
        });
    }

    pub fn delete_playlist(&self, id: PlaylistId) {
        let _ = self.submit(StoreJob::DeletePlaylist(id));
    }

    pub fn rename_playlist(&self, id: PlaylistId, name: impl Into<String>) {
        let _ = self.submit(StoreJob::RenamePlaylist {
            id,
            name: name.into(),
        });
    }

    pub fn get_playlists(&self) -> ReplyReceiver<Vec<Playlist>> {
        let (reply, rx) = oneshot::channel();
        let _ = self.submit(StoreJob::GetPlaylists(reply));
        rx
    }
}

/// Wait for a worker reply, mapping a dropped worker to an error
pub async fn await_reply<T>(rx: ReplyReceiver<T>) -> Result<T> {
    match rx.await {
        Ok(result) => Ok(result?),
        Err(_) => Err(PlaybackError::WorkerClosed("store worker")),
    }
}

async fn run(store: Arc<dyn PlaylistStore>, mut rx: mpsc::UnboundedReceiver<StoreJob>) {
    debug!("Store worker started");
    while let Some(job) = rx.recv().await {
        process(store.as_ref(), job).await;
    }
    debug!("Store worker stopped");
}

async fn process(store: &dyn PlaylistStore, job: StoreJob) {
    let name = job.name();

    let outcome = match job {
        StoreJob::RecordHistory(track) => store.record_history(&track).await,
        StoreJob::ToggleFavorite { track, reply } => {
            let result = store.toggle_favorite(&track).await;
            if let Ok(now_favorite) = &result {
                debug!(track_id = %track.id, now_favorite, "Toggled favorite");
            }
            match reply {
                Some(reply) => respond(reply, result),
                None => result.map(|_| ()),
            }
        }
        StoreJob::IsFavorite { track, reply } => respond(reply, store.is_favorite(&track).await),
        StoreJob::AddTrack { playlist, track } => {
            store.add_track(&playlist, &track).await.map(|added| {
                if !added {
                    debug!(playlist_id = %playlist, track_id = %track.id, "Track already in playlist");
                }
            })
        }
        StoreJob::RemoveTrack { playlist, track } => {
            store.remove_track(&playlist, &track).await.map(|_| ())
        }
        StoreJob::CreatePlaylist { name, description } => store
            .create_playlist(&name, description.as_deref())
            .await
            .map(|_| ()),
        StoreJob::DeletePlaylist(id) => store.delete_playlist(&id).await,
        StoreJob::RenamePlaylist { id, name } => store.rename_playlist(&id, &name).await,
        StoreJob::GetPlaylists(reply) => respond(reply, store.get_playlists().await),
    };

    if let Err(e) = outcome {
        warn!(job = name, error = %e, "Store job failed");
    }
}

/// Hand a result to the waiting caller, passing failures through for logging
fn respond<T>(reply: Reply<T>, result: banger_core::Result<T>) -> banger_core::Result<()> {
    let failure = result.as_ref().err().map(ToString::to_string);
    // A caller that stopped waiting is not an error
    let _ = reply.send(result);
    match failure {
        Some(message) => Err(banger_core::BangerError::storage(message)),
        None => Ok(()),
    }
}
