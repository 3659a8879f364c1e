//! Banger Player Storage
//!
//! `SQLite` persistence for playlists, favorites and the recently played
//! history.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each feature owns its own queries (`playlists`,
//!   `favorites`, `history`)
//! - **Default Playlists**: "Favorites" and "Recently Played" are seeded by
//!   the initial migration and cannot be renamed or deleted
//! - **Self-contained rows**: track metadata is stored as JSON alongside the
//!   track id, so playlists survive without the catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use banger_storage::SqlitePlaylistStore;
//! use banger_core::PlaylistStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqlitePlaylistStore::open("sqlite://banger.db").await?;
//!
//! for playlist in store.get_playlists().await? {
//!     println!("{} ({} tracks)", playlist.name, playlist.track_count());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod rows;
mod store;

// Vertical slices
pub mod favorites;
pub mod history;
pub mod playlists;

pub use error::StorageError;
pub use store::SqlitePlaylistStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup. Also seeds the default playlists.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    debug!("Database migrations applied");
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://banger.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!(url = %database_url, "Database pool ready");

    Ok(pool)
}
