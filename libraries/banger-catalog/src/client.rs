//! Catalog client.

use crate::error::{CatalogError, Result};
use crate::genres::{random_feed_genre, related_genre};
use crate::types::{CatalogConfig, TracksResponse};
use async_trait::async_trait;
use banger_core::types::{BrowseQuery, CatalogOrder, Track};
use banger_core::CatalogProvider;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tracks requested for the popular section of the home feed
pub const POPULAR_LIMIT: usize = 15;

/// Tracks requested for the genre and newest fallbacks
pub const FALLBACK_LIMIT: usize = 12;

/// Tracks requested for a free-text search
pub const SEARCH_LIMIT: usize = 10;

/// Tracks requested for genre suggestions next to search results
pub const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Search(String, usize),
    Browse(BrowseQuery, usize),
}

/// Which source ended up filling the home feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Popular,
    Genre(String),
    Newest,
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Popular => f.write_str("popular"),
            Self::Genre(genre) => write!(f, "genre:{genre}"),
            Self::Newest => f.write_str("newest"),
        }
    }
}

/// Home feed tracks together with the source that produced them
#[derive(Debug, Clone)]
pub struct HomeFeed {
    pub source: FeedSource,
    pub tracks: Vec<Track>,
}

/// Search results plus a genre suggestion row
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub tracks: Vec<Track>,
    pub suggested_genre: &'static str,
    pub suggestions: Vec<Track>,
}

/// Client for the Jamendo `v3.0/tracks/` endpoint.
///
/// Every successful query result is kept in a small LRU cache keyed by the
/// query, so revisiting a genre or repeating a search does not hit the
/// network again.
///
/// # Example
///
/// ```ignore
/// use banger_catalog::{CatalogClient, CatalogConfig};
///
/// let client = CatalogClient::new(CatalogConfig::new("my-client-id"))?;
/// let feed = client.home_feed().await?;
/// println!("{} tracks from {}", feed.tracks.len(), feed.source);
/// ```
pub struct CatalogClient {
    http: Client,
    base_url: String,
    client_id: String,
    cache: Option<Mutex<LruCache<CacheKey, Vec<Track>>>>,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(CatalogError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CatalogError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        if config.client_id.trim().is_empty() {
            return Err(CatalogError::MissingClientId);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("BangerPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = NonZeroUsize::new(config.cache_size).map(|cap| Mutex::new(LruCache::new(cap)));

        Ok(Self {
            http,
            base_url,
            client_id: config.client_id,
            cache,
        })
    }

    /// Get the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Free-text search.
    pub async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>> {
        let key = CacheKey::Search(query.to_string(), limit);
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let tracks = self.fetch(limit, ("search", query)).await?;
        self.remember(key, &tracks);
        Ok(tracks)
    }

    /// Browse by tag or ordering.
    pub async fn browse_tracks(&self, query: &BrowseQuery, limit: usize) -> Result<Vec<Track>> {
        let key = CacheKey::Browse(query.clone(), limit);
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let tracks = match query {
            BrowseQuery::Tag(tag) => self.fetch(limit, ("tags", tag.as_str())).await?,
            BrowseQuery::Order(order) => self.fetch(limit, ("order", order.as_param())).await?,
        };
        self.remember(key, &tracks);
        Ok(tracks)
    }

    /// Search plus a related-genre suggestion row.
    ///
    /// A failing suggestion request is logged and yields an empty row.
    pub async fn search_with_suggestions(&self, query: &str) -> Result<SearchResults> {
        let tracks = self.search_tracks(query, SEARCH_LIMIT).await?;
        let suggested_genre = related_genre(query);

        let suggestions = if tracks.is_empty() {
            Vec::new()
        } else {
            match self
                .browse_tracks(&BrowseQuery::tag(suggested_genre), SUGGESTION_LIMIT)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    warn!(genre = suggested_genre, error = %e, "Genre suggestions failed");
                    Vec::new()
                }
            }
        };

        Ok(SearchResults {
            tracks,
            suggested_genre,
            suggestions,
        })
    }

    /// Load the home feed.
    ///
    /// Tries popular tracks, then a random genre, then the newest releases.
    /// The first source that returns tracks wins. When every source fails
    /// the last error is returned; when they all succeed empty the feed is
    /// empty.
    pub async fn home_feed(&self) -> Result<HomeFeed> {
        let genre = random_feed_genre();
        let attempts = [
            (
                FeedSource::Popular,
                BrowseQuery::Order(CatalogOrder::Popularity),
                POPULAR_LIMIT,
            ),
            (
                FeedSource::Genre(genre.to_string()),
                BrowseQuery::tag(genre),
                FALLBACK_LIMIT,
            ),
            (
                FeedSource::Newest,
                BrowseQuery::Order(CatalogOrder::Newest),
                FALLBACK_LIMIT,
            ),
        ];

        let mut last_error = None;
        let mut any_success = false;

        for (source, query, limit) in attempts {
            match self.browse_tracks(&query, limit).await {
                Ok(tracks) if !tracks.is_empty() => {
                    info!(source = %source, tracks = tracks.len(), "Loaded home feed");
                    return Ok(HomeFeed { source, tracks });
                }
                Ok(_) => {
                    any_success = true;
                    debug!(source = %source, "Feed source returned no tracks");
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Feed source failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_success => Err(e),
            _ => Ok(HomeFeed {
                source: FeedSource::Newest,
                tracks: Vec::new(),
            }),
        }
    }

    async fn fetch(&self, limit: usize, filter: (&str, &str)) -> Result<Vec<Track>> {
        let url = format!("{}/v3.0/tracks/", self.base_url);
        let limit = limit.to_string();

        debug!(url = %url, filter = filter.0, value = filter.1, "Querying catalog");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                filter,
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    CatalogError::ServerUnreachable(e.to_string())
                } else {
                    CatalogError::Request(e)
                }
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(CatalogError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ServerError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: TracksResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse tracks response: {}", e))
        })?;

        if !body.headers.is_success() {
            return Err(CatalogError::Api {
                code: body.headers.code,
                message: body.headers.error_message,
            });
        }

        let received = body.results.len();
        let tracks: Vec<Track> = body
            .results
            .into_iter()
            .filter_map(|t| t.into_track())
            .collect();

        debug!(
            received,
            playable = tracks.len(),
            reported = body.headers.results_count,
            "Catalog query complete"
        );

        Ok(tracks)
    }

    fn cached(&self, key: &CacheKey) -> Option<Vec<Track>> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = cache.get(key).cloned();
        if hit.is_some() {
            debug!(key = ?key, "Catalog cache hit");
        }
        hit
    }

    fn remember(&self, key: CacheKey, tracks: &[Track]) {
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(key, tracks.to_vec());
        }
    }
}

#[async_trait]
impl CatalogProvider for CatalogClient {
    async fn search(&self, query: &str, limit: usize) -> banger_core::Result<Vec<Track>> {
        Ok(self.search_tracks(query, limit).await?)
    }

    async fn browse(&self, query: &BrowseQuery, limit: usize) -> banger_core::Result<Vec<Track>> {
        Ok(self.browse_tracks(query, limit).await?)
    }
}
