/// Player configuration
use crate::error::{PlayerError, Result};
use banger_catalog::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_CACHE_SIZE};
use banger_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when no `--config` path is given
pub const DEFAULT_CONFIG_FILE: &str = "banger.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub client_id: String,

    /// Tracks requested per browse or genre page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default `banger.toml` is optional.
    /// Environment variables prefixed `BANGER_` override both, with `__`
    /// between nested keys (`BANGER_CATALOG__CLIENT_ID`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PlayerError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("BANGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog.client_id.trim().is_empty() {
            return Err(PlayerError::Config(
                "catalog client id is required (set BANGER_CATALOG__CLIENT_ID)".to_string(),
            ));
        }

        if self.catalog.page_size == 0 {
            return Err(PlayerError::Config(
                "catalog page size must be at least 1".to_string(),
            ));
        }

        if self.storage.database_url.trim().is_empty() {
            return Err(PlayerError::Config("database URL is required".to_string()));
        }

        Ok(())
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig::new(self.catalog.client_id.clone())
            .with_base_url(self.catalog.base_url.clone())
            .with_cache_size(self.catalog.cache_size)
    }
}

// Default values
fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        base_url: default_base_url(),
        client_id: String::new(),
        page_size: default_page_size(),
        cache_size: default_cache_size(),
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./banger.db".to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            storage: default_storage(),
            playback: PlaybackConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_a_client_id() {
        let config = PlayerConfig::default();
        assert_eq!(config.catalog.page_size, 20);
        assert_eq!(config.playback.settle_delay_ms, 100);
        assert!(matches!(config.validate(), Err(PlayerError::Config(_))));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = PlayerConfig::default();
        config.catalog.client_id = "abc123".into();
        assert!(config.validate().is_ok());

        config.catalog.page_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page size"));
    }

    #[test]
    fn test_catalog_config_carries_settings() {
        let mut config = PlayerConfig::default();
        config.catalog.client_id = "abc123".into();
        config.catalog.cache_size = 7;

        let catalog = config.catalog_config();
        assert_eq!(catalog.client_id, "abc123");
        assert_eq!(catalog.base_url, DEFAULT_BASE_URL);
        assert_eq!(catalog.cache_size, 7);
    }
}
