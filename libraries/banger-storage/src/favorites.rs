//! Favorite tracks
//!
//! The favorite set lives in its own table and is mirrored into the
//! built-in favorites playlist, both updated in the same transaction.

use crate::playlists::{append_track, delete_track};
use crate::rows::{decode_track, encode_track};
use banger_core::{error::Result, types::*};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

/// Check whether a track is a favorite
pub async fn is_favorite(pool: &SqlitePool, track_id: &TrackId) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM favorite_tracks WHERE track_id = ?")
        .bind(track_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Flip the favorite flag of a track
///
/// Returns the new state (`true` when the track is now a favorite).
pub async fn toggle(pool: &SqlitePool, track: &Track) -> Result<bool> {
    let favorites = PlaylistId::new(FAVORITES_PLAYLIST_ID);
    let mut tx = pool.begin().await?;

    let existing = sqlx::query("SELECT 1 FROM favorite_tracks WHERE track_id = ?")
        .bind(&track.id)
        .fetch_optional(&mut *tx)
        .await?;

    let now_favorite = if existing.is_some() {
        sqlx::query("DELETE FROM favorite_tracks WHERE track_id = ?")
            .bind(&track.id)
            .execute(&mut *tx)
            .await?;
        delete_track(&mut *tx, &favorites, &track.id).await?;
        false
    } else {
        sqlx::query("INSERT INTO favorite_tracks (track_id, track_json, added_at) VALUES (?, ?, ?)")
            .bind(&track.id)
            .bind(encode_track(track)?)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;
        append_track(&mut *tx, &favorites, track).await?;
        true
    };

    tx.commit().await?;

    debug!(track_id = %track.id, favorite = now_favorite, "Toggled favorite");
    Ok(now_favorite)
}

/// All favorite tracks, most recently added first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Track>> {
    let rows = sqlx::query(
        r#"
        SELECT track_json
        FROM favorite_tracks
        ORDER BY added_at DESC, rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(decode_track).collect()
}
