//! Row decoding shared by the slices

use banger_core::{error::Result, types::*};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(crate) fn decode_track(row: &SqliteRow) -> Result<Track> {
    let json: String = row.get("track_json");
    Ok(serde_json::from_str(&json)?)
}

pub(crate) fn encode_track(track: &Track) -> Result<String> {
    Ok(serde_json::to_string(track)?)
}

pub(crate) fn decode_timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Playlist header without its tracks
pub(crate) fn decode_playlist(row: &SqliteRow) -> Playlist {
    Playlist {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        tracks: Vec::new(),
        created_at: decode_timestamp(row.get("created_at")),
        is_default: row.get::<i64, _>("is_default") != 0,
    }
}
