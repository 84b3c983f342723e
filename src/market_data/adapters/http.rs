use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::market_data::traits::FeedBackend;
use crate::market_data::types::{Alert, FeatureSnapshot, MarketSummary};

/// `FeedBackend` over the dashboard's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpFeedBackend {
    base_url: Url,
    client: Client,
}

impl HttpFeedBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> FetchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("backend url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> FetchResult<T> {
        debug!(%url, ?query, "GET");
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Backend { status: status.as_u16() });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FeedBackend for HttpFeedBackend {
    async fn health(&self) -> FetchResult<()> {
        let url = self.endpoint(&["health"])?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Backend { status: response.status().as_u16() });
        }
        Ok(())
    }

    async fn refresh_markets(&self, limit: usize) -> FetchResult<()> {
        let url = self.endpoint(&["markets", "refresh"])?;
        debug!(%url, limit, "POST");
        let response = self
            .client
            .post(url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;

        // The body only echoes the limit back.
        if !response.status().is_success() {
            return Err(FetchError::Backend { status: response.status().as_u16() });
        }
        Ok(())
    }

    async fn alerts(&self, limit: usize) -> FetchResult<Vec<Alert>> {
        let url = self.endpoint(&["alerts"])?;
        self.get_json(url, &[("limit", limit.to_string())]).await
    }

    async fn markets(&self, limit: usize, search: Option<&str>) -> FetchResult<Vec<MarketSummary>> {
        let url = self.endpoint(&["markets"])?;
        let mut query = vec![("limit", limit.to_string())];
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(("search", term.to_string()));
        }
        self.get_json(url, &query).await
    }

    async fn features(&self, ticker: &str, limit: usize) -> FetchResult<Vec<FeatureSnapshot>> {
        let url = self.endpoint(&["features", ticker])?;
        self.get_json(url, &[("limit", limit.to_string())]).await
    }
}
