/// Core error types for Banger Player
use crate::types::PlaylistId;
use thiserror::Error;

/// Result type alias using `BangerError`
pub type Result<T> = std::result::Result<T, BangerError>;

/// Core error type for Banger Player
#[derive(Error, Debug)]
pub enum BangerError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catalog lookup errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Playback engine errors
    #[error("Engine error: {0}")]
    Engine(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Playlist not found
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),

    /// Default playlists cannot be deleted or renamed
    #[error("Playlist {0} is a default playlist and cannot be modified")]
    ProtectedPlaylist(PlaylistId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl BangerError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for BangerError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
