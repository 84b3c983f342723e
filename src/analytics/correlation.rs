//! Cross-market correlation heatmap over the highest-volume tickers.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::analytics::numeric::pearson;
use crate::market_data::traits::FeedBackend;
use crate::market_data::types::{FeatureSnapshot, MarketSummary};
use crate::metrics;

/// How many tickers the heatmap covers at most.
pub const TOP_N: usize = 6;

/// Feature rows requested per ticker.
pub const SERIES_LIMIT: usize = 50;

/// Minimum cleaned points for a ticker to take part.
pub const MIN_POINTS: usize = 5;

/// Square, symmetric correlation matrix with a unit diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Heatmap {
    /// No markets poll has completed yet.
    Pending,
    /// Fewer than two tickers had enough data. Not an error.
    InsufficientData,
    Matrix(CorrelationMatrix),
}

impl Heatmap {
    pub fn matrix(&self) -> Option<&CorrelationMatrix> {
        match self {
            Heatmap::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

/// Up to `n` distinct tickers by descending volume; ties keep their original
/// order. A repeated ticker keeps its first entry.
pub fn select_top_by_volume(markets: &[MarketSummary], n: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<&MarketSummary> = markets
        .iter()
        .filter(|m| !m.ticker.is_empty() && seen.insert(m.ticker.as_str()))
        .collect();
    // sort_by is stable, which preserves feed order on ties
    ranked.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    ranked.into_iter().take(n).map(|m| m.ticker.clone()).collect()
}

/// Chronological mid series with non-positive mids dropped.
pub fn clean_series(rows: &[FeatureSnapshot]) -> Vec<f64> {
    rows.iter().rev().map(|row| row.mid).filter(|mid| *mid > 0.0).collect()
}

/// Builds the heatmap from already cleaned series.
///
/// Series shorter than `MIN_POINTS` are dropped, the rest are cut to the most
/// recent `min_len` points so every pair is compared over the same window.
pub fn build_matrix(series: Vec<(String, Vec<f64>)>) -> Heatmap {
    let qualifying: Vec<(String, Vec<f64>)> = series
        .into_iter()
        .filter(|(_, points)| points.len() >= MIN_POINTS)
        .collect();

    if qualifying.len() < 2 {
        return Heatmap::InsufficientData;
    }

    let min_len = qualifying.iter().map(|(_, p)| p.len()).min().unwrap_or(0);
    let (tickers, aligned): (Vec<String>, Vec<Vec<f64>>) = qualifying
        .into_iter()
        .map(|(ticker, points)| {
            let tail = points[points.len() - min_len..].to_vec();
            (ticker, tail)
        })
        .unzip();

    let size = tickers.len();
    let mut values = vec![vec![0.0; size]; size];
    for i in 0..size {
        values[i][i] = 1.0;
        for j in (i + 1)..size {
            let r = pearson(&aligned[i], &aligned[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Heatmap::Matrix(CorrelationMatrix { tickers, values })
}

/// Fetches series for the top tickers concurrently and builds the heatmap
/// once every fetch has settled. A failed fetch only excludes its ticker.
pub async fn compute_heatmap(backend: &dyn FeedBackend, markets: &[MarketSummary]) -> Heatmap {
    let tickers = select_top_by_volume(markets, TOP_N);
    debug!(?tickers, "computing correlation heatmap");

    let fetches = tickers.iter().map(|ticker| async move {
        match backend.features(ticker, SERIES_LIMIT).await {
            Ok(rows) => Some((ticker.clone(), clean_series(&rows))),
            Err(err) => {
                warn!(%ticker, error = %err, "correlation series fetch failed");
                metrics::record_correlation_fetch_failure();
                None
            }
        }
    });

    let series: Vec<(String, Vec<f64>)> = join_all(fetches).await.into_iter().flatten().collect();
    let heatmap = build_matrix(series);
    if let Heatmap::Matrix(m) = &heatmap {
        metrics::record_heatmap_size(m.len());
    }
    heatmap
}
