mod ids;
mod mode;
mod playlist;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use mode::{BrowseQuery, CatalogOrder, RepeatMode};
pub use playlist::{
    Playlist, FAVORITES_PLAYLIST_ID, HISTORY_LIMIT, RECENTLY_PLAYED_PLAYLIST_ID,
};
pub use track::{Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
