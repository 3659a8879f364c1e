use crate::rows::{decode_playlist, decode_track, encode_track};
use banger_core::{error::Result, types::*, BangerError};
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

/// Get all playlists with their tracks, default playlists first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, description, is_default, created_at
        FROM playlists
        ORDER BY is_default DESC, created_at ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut playlists = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut playlist = decode_playlist(row);
        playlist.tracks = get_tracks(pool, &playlist.id).await?;
        playlists.push(playlist);
    }

    Ok(playlists)
}

/// Get playlist by ID with all tracks
pub async fn get_by_id(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, description, is_default, created_at
        FROM playlists
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut playlist = decode_playlist(&row);
    playlist.tracks = get_tracks(pool, id).await?;
    Ok(Some(playlist))
}

/// Tracks of a playlist in position order
pub async fn get_tracks(pool: &SqlitePool, id: &PlaylistId) -> Result<Vec<Track>> {
    let rows = sqlx::query(
        r#"
        SELECT track_json
        FROM playlist_tracks
        WHERE playlist_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(decode_track).collect()
}

/// Create new user playlist
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
) -> Result<Playlist> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BangerError::invalid_input("Playlist name cannot be empty"));
    }

    let mut playlist = Playlist::new(name);
    playlist.description = description.map(str::to_string);

    sqlx::query(
        r#"
        INSERT INTO playlists (id, name, description, is_default, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&playlist.id)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(playlist.created_at.timestamp())
    .bind(playlist.created_at.timestamp())
    .execute(pool)
    .await?;

    debug!(playlist_id = %playlist.id, name = %playlist.name, "Created playlist");

    Ok(playlist)
}

/// Rename a user playlist
pub async fn rename(pool: &SqlitePool, id: &PlaylistId, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BangerError::invalid_input("Playlist name cannot be empty"));
    }
    ensure_mutable(pool, id).await?;

    sqlx::query("UPDATE playlists SET name = ?, updated_at = ? WHERE id = ?")
        .bind(name)
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a user playlist and its track rows
pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    ensure_mutable(pool, id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!(playlist_id = %id, "Deleted playlist");
    Ok(())
}

/// Append a track to a playlist
///
/// Returns `false` if the track is already in the playlist.
pub async fn add_track(pool: &SqlitePool, id: &PlaylistId, track: &Track) -> Result<bool> {
    let mut conn = pool.acquire().await?;
    ensure_exists(&mut *conn, id).await?;
    append_track(&mut *conn, id, track).await
}

/// Remove a track from a playlist
///
/// Returns `false` if the track was not in the playlist.
pub async fn remove_track(pool: &SqlitePool, id: &PlaylistId, track: &Track) -> Result<bool> {
    let mut conn = pool.acquire().await?;
    ensure_exists(&mut *conn, id).await?;
    delete_track(&mut *conn, id, &track.id).await
}

pub(crate) async fn append_track(
    conn: &mut SqliteConnection,
    id: &PlaylistId,
    track: &Track,
) -> Result<bool> {
    let next_position: i64 = sqlx::query(
        "SELECT COALESCE(MAX(position), -1) + 1 AS next_pos FROM playlist_tracks WHERE playlist_id = ?",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?
    .get("next_pos");

    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, position, track_json, added_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&track.id)
    .bind(next_position)
    .bind(encode_track(track)?)
    .bind(Utc::now().timestamp())
    .execute(&mut *conn)
    .await?;

    touch(conn, id).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_track(
    conn: &mut SqliteConnection,
    id: &PlaylistId,
    track_id: &TrackId,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND track_id = ?")
        .bind(id)
        .bind(track_id)
        .execute(&mut *conn)
        .await?;

    touch(conn, id).await?;
    Ok(result.rows_affected() > 0)
}

async fn touch(conn: &mut SqliteConnection, id: &PlaylistId) -> Result<()> {
    sqlx::query("UPDATE playlists SET updated_at = ? WHERE id = ?")
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn ensure_exists(conn: &mut SqliteConnection, id: &PlaylistId) -> Result<()> {
    let exists = sqlx::query("SELECT 1 FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(BangerError::PlaylistNotFound(id.clone()))
    }
}

async fn ensure_mutable(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    let row = sqlx::query("SELECT is_default FROM playlists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        None => Err(BangerError::PlaylistNotFound(id.clone())),
        Some(row) if row.get::<i64, _>("is_default") != 0 => {
            Err(BangerError::ProtectedPlaylist(id.clone()))
        }
        Some(_) => Ok(()),
    }
}
