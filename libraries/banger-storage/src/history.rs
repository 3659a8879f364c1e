//! Recently played history
//!
//! History is the built-in recently played playlist ordered by ascending
//! position, so the newest entry always takes the smallest position.

use crate::playlists::{delete_track, get_tracks};
use crate::rows::encode_track;
use banger_core::{error::Result, types::*};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Record a play
///
/// Moves the track to the front and evicts everything past `limit`.
pub async fn record(pool: &SqlitePool, track: &Track, limit: usize) -> Result<()> {
    let history = PlaylistId::new(RECENTLY_PLAYED_PLAYLIST_ID);
    let mut tx = pool.begin().await?;

    delete_track(&mut *tx, &history, &track.id).await?;

    let front: i64 = sqlx::query(
        "SELECT COALESCE(MIN(position), 1) - 1 AS front FROM playlist_tracks WHERE playlist_id = ?",
    )
    .bind(&history)
    .fetch_one(&mut *tx)
    .await?
    .get("front");

    sqlx::query(
        r#"
        INSERT INTO playlist_tracks (playlist_id, track_id, position, track_json, added_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&history)
    .bind(&track.id)
    .bind(front)
    .bind(encode_track(track)?)
    .bind(Utc::now().timestamp())
    .execute(&mut *tx)
    .await?;

    let evicted = sqlx::query(
        r#"
        DELETE FROM playlist_tracks
        WHERE playlist_id = ?
          AND track_id NOT IN (
              SELECT track_id FROM playlist_tracks
              WHERE playlist_id = ?
              ORDER BY position ASC
              LIMIT ?
          )
        "#,
    )
    .bind(&history)
    .bind(&history)
    .bind(limit as i64)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    debug!(track_id = %track.id, evicted, "Recorded history");
    Ok(())
}

/// History, most recent first
pub async fn get_recent(pool: &SqlitePool) -> Result<Vec<Track>> {
    get_tracks(pool, &PlaylistId::new(RECENTLY_PLAYED_PLAYLIST_ID)).await
}
