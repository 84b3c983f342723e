#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prediction_monitor::market_data::traits::FeedBackend;
use prediction_monitor::market_data::types::{Alert, FeatureSnapshot, MarketSummary};
use prediction_monitor::FetchResult;
use tokio::sync::oneshot;

/// In-memory backend whose feature calls can be held open per ticker.
#[derive(Default)]
pub struct GatedBackend {
    features: Mutex<HashMap<String, Vec<FeatureSnapshot>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    started: Mutex<Vec<String>>,
}

impl GatedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_mids(&self, ticker: &str, mids: &[f64]) {
        let rows = mids
            .iter()
            .enumerate()
            .map(|(i, mid)| FeatureSnapshot {
                ticker: ticker.to_string(),
                timestamp: format!("2026-01-02T10:{:02}:00Z", 59 - i),
                mid: *mid,
                spread: 1.0,
                prob: mid / 100.0,
                volume: 100.0,
            })
            .collect();
        self.features.lock().unwrap().insert(ticker.to_string(), rows);
    }

    pub fn hold(&self, ticker: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(ticker.to_string(), rx);
        tx
    }

    pub async fn wait_started(&self, ticker: &str) {
        while !self.started.lock().unwrap().iter().any(|t| t == ticker) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl FeedBackend for GatedBackend {
    async fn health(&self) -> FetchResult<()> {
        Ok(())
    }

    async fn refresh_markets(&self, _limit: usize) -> FetchResult<()> {
        Ok(())
    }

    async fn alerts(&self, _limit: usize) -> FetchResult<Vec<Alert>> {
        Ok(Vec::new())
    }

    async fn markets(&self, _limit: usize, _search: Option<&str>) -> FetchResult<Vec<MarketSummary>> {
        Ok(Vec::new())
    }

    async fn features(&self, ticker: &str, _limit: usize) -> FetchResult<Vec<FeatureSnapshot>> {
        self.started.lock().unwrap().push(ticker.to_string());
        let gate = self.gates.lock().unwrap().remove(ticker);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(self.features.lock().unwrap().get(ticker).cloned().unwrap_or_default())
    }
}
