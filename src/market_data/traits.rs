use async_trait::async_trait;

use crate::error::FetchResult;
use crate::market_data::types::{Alert, FeatureSnapshot, MarketSummary};

/// The backend the dashboard polls.
///
/// Implementations only move data; they hold no session state.
/// The coordinator decides what a response means and whether it still applies.
#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// `GET /health`; any 2xx means reachable.
    async fn health(&self) -> FetchResult<()>;

    /// `POST /markets/refresh?limit=N`; asks the backend to ingest up to `limit` markets.
    async fn refresh_markets(&self, limit: usize) -> FetchResult<()>;

    /// `GET /alerts?limit=N`, in whatever order the backend chooses.
    async fn alerts(&self, limit: usize) -> FetchResult<Vec<Alert>>;

    /// `GET /markets?limit=N&search=S`.
    async fn markets(&self, limit: usize, search: Option<&str>) -> FetchResult<Vec<MarketSummary>>;

    /// `GET /features/{ticker}?limit=N`, newest first.
    async fn features(&self, ticker: &str, limit: usize) -> FetchResult<Vec<FeatureSnapshot>>;
}
