use crate::error::StorageError;
use crate::{create_pool, favorites, history, playlists, run_migrations};
use async_trait::async_trait;
use banger_core::{error::Result, storage::PlaylistStore, types::*};
use sqlx::SqlitePool;

/// Playlist store backed by `SQLite`
#[derive(Clone)]
pub struct SqlitePlaylistStore {
    pool: SqlitePool,
    history_limit: usize,
}

impl SqlitePlaylistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            history_limit: HISTORY_LIMIT,
        }
    }

    /// Connect, migrate and wrap a database in one step
    pub async fn open(database_url: &str) -> std::result::Result<Self, StorageError> {
        if database_url.trim().is_empty() {
            return Err(StorageError::Connection(
                "database URL cannot be empty".to_string(),
            ));
        }
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Override the history cap
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PlaylistStore for SqlitePlaylistStore {
    // History
    async fn record_history(&self, track: &Track) -> Result<()> {
        history::record(&self.pool, track, self.history_limit).await
    }

    async fn recently_played(&self) -> Result<Vec<Track>> {
        history::get_recent(&self.pool).await
    }

    // Favorites
    async fn is_favorite(&self, track: &Track) -> Result<bool> {
        favorites::is_favorite(&self.pool, &track.id).await
    }

    async fn toggle_favorite(&self, track: &Track) -> Result<bool> {
        favorites::toggle(&self.pool, track).await
    }

    async fn favorite_tracks(&self) -> Result<Vec<Track>> {
        favorites::get_all(&self.pool).await
    }

    // Playlists
    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        playlists::get_all(&self.pool).await
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        playlists::get_by_id(&self.pool, id).await
    }

    async fn create_playlist(&self, name: &str, description: Option<&str>) -> Result<Playlist> {
        playlists::create(&self.pool, name, description).await
    }

    async fn rename_playlist(&self, id: &PlaylistId, name: &str) -> Result<()> {
        playlists::rename(&self.pool, id, name).await
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        playlists::delete(&self.pool, id).await
    }

    async fn add_track(&self, id: &PlaylistId, track: &Track) -> Result<bool> {
        playlists::add_track(&self.pool, id, track).await
    }

    async fn remove_track(&self, id: &PlaylistId, track: &Track) -> Result<bool> {
        playlists::remove_track(&self.pool, id, track).await
    }
}
