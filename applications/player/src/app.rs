/// Application wiring: catalog client, playlist store and queue sources
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use banger_catalog::CatalogClient;
use banger_core::types::{BrowseQuery, Playlist, PlaylistId, Track};
use banger_core::{CatalogProvider, PlaylistStore};
use banger_storage::SqlitePlaylistStore;
use std::sync::Arc;
use tracing::info;

/// Where a play queue comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueSource {
    Feed,
    Search(String),
    Genre(String),
    Playlist(String),
    Favorites,
    History,
}

pub struct App {
    config: PlayerConfig,
    catalog: Arc<CatalogClient>,
    /// Search and browse for queue building
    provider: Arc<dyn CatalogProvider>,
    store: Arc<SqlitePlaylistStore>,
}

impl App {
    /// Validate the config, then open the catalog client and the database
    pub async fn open(config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        let catalog = CatalogClient::new(config.catalog_config())?;
        info!(base_url = %catalog.base_url(), "Catalog client ready");

        let store = SqlitePlaylistStore::open(&config.storage.database_url)
            .await?
            .with_history_limit(config.playback.history_size);
        info!("Playlist store ready");

        let catalog = Arc::new(catalog);
        Ok(Self {
            config,
            provider: catalog.clone(),
            catalog,
            store: Arc::new(store),
        })
    }

    /// Build queues from another catalog
    pub fn with_provider(mut self, provider: Arc<dyn CatalogProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn store(&self) -> Arc<SqlitePlaylistStore> {
        Arc::clone(&self.store)
    }

    /// Look a playlist up by id, failing when it does not exist
    pub async fn playlist(&self, id: &str) -> Result<Playlist> {
        self.store
            .get_playlist(&PlaylistId::from(id))
            .await?
            .ok_or_else(|| PlayerError::NotFound(format!("playlist {id}")))
    }

    /// Best catalog match for a free-text query
    pub async fn first_match(&self, query: &str) -> Result<Track> {
        self.provider
            .search(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PlayerError::NotFound(format!("no track matches {query:?}")))
    }

    /// Build the tracks for a play queue
    pub async fn queue(&self, source: &QueueSource) -> Result<Vec<Track>> {
        let page_size = self.config.catalog.page_size;

        let tracks = match source {
            QueueSource::Feed => self.catalog.home_feed().await?.tracks,
            QueueSource::Search(query) => self.provider.search(query, page_size).await?,
            QueueSource::Genre(tag) => {
                self.provider
                    .browse(&BrowseQuery::Tag(tag.clone()), page_size)
                    .await?
            }
            QueueSource::Playlist(id) => self.playlist(id).await?.tracks,
            QueueSource::Favorites => self.store.favorite_tracks().await?,
            QueueSource::History => self.store.recently_played().await?,
        };

        if tracks.is_empty() {
            return Err(PlayerError::NotFound(format!("no tracks for {source:?}")));
        }
        Ok(tracks)
    }
}
