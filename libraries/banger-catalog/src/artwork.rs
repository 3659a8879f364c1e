//! Cover art download.

use crate::error::CatalogError;
use async_trait::async_trait;
use banger_core::ArtworkLoader;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches cover art over HTTP
#[derive(Clone)]
pub struct HttpArtworkLoader {
    http: Client,
}

impl HttpArtworkLoader {
    pub fn new() -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("BangerPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    async fn fetch(&self, locator: &Url) -> crate::Result<Vec<u8>> {
        debug!(url = %locator, "Fetching artwork");

        let response = self.http.get(locator.clone()).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                CatalogError::ServerUnreachable(e.to_string())
            } else {
                CatalogError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::ServerError {
                status: status.as_u16(),
                message: format!("artwork request for {locator} failed"),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ArtworkLoader for HttpArtworkLoader {
    async fn load(&self, locator: &Url) -> banger_core::Result<Vec<u8>> {
        Ok(self.fetch(locator).await?)
    }
}
