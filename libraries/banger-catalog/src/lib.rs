//! Banger Player Catalog Client
//!
//! HTTP client for the Jamendo track catalog.
//!
//! # Features
//!
//! - **Search**: free-text track search with genre suggestions
//! - **Browse**: by genre tag or server-side ordering (popular, newest)
//! - **Home feed**: popular, then a random genre, then newest releases
//! - **Caching**: per-query LRU cache of converted tracks
//! - **Artwork**: async cover art loader for notifications
//!
//! Only tracks with a resolvable stream URL are ever returned.
//!
//! # Example
//!
//! ```ignore
//! use banger_catalog::{CatalogClient, CatalogConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(CatalogConfig::new("my-client-id"))?;
//!
//!     let results = client.search_with_suggestions("chill guitar").await?;
//!     println!("{} results, suggesting {}", results.tracks.len(), results.suggested_genre);
//!
//!     Ok(())
//! }
//! ```

mod artwork;
mod client;
mod error;
pub mod genres;
mod types;

pub use artwork::HttpArtworkLoader;
pub use client::{
    CatalogClient, FeedSource, HomeFeed, SearchResults, FALLBACK_LIMIT, POPULAR_LIMIT,
    SEARCH_LIMIT, SUGGESTION_LIMIT,
};
pub use error::{CatalogError, Result};
pub use types::{
    CatalogConfig, CatalogTrack, ResponseHeaders, TracksResponse, DEFAULT_BASE_URL,
    DEFAULT_CACHE_SIZE,
};
