//! Error types for playback management

use banger_core::BangerError;
use thiserror::Error;

/// Playback errors
///
/// Transport faults never reach callers; they are logged and reflected as
/// session state. These only surface from the async handle and the worker.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Background worker or session task has shut down
    #[error("{0} is no longer running")]
    WorkerClosed(&'static str),

    /// Playlist store failure
    #[error(transparent)]
    Store(#[from] BangerError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
