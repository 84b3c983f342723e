use serde::{Deserialize, Serialize};

/// One derived feature row for a ticker, as served by `/features/{ticker}`.
/// The backend returns these newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSnapshot {
    pub ticker: String,
    #[serde(rename = "ts")]
    pub timestamp: String,
    pub mid: f64,
    pub spread: f64,
    pub prob: f64,
    pub volume: f64,
}

/// Market metadata plus the live top-of-book quote.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSummary {
    pub ticker: String,
    pub event_ticker: String,
    pub category: String,
    pub status: String,
    pub last_price: f64,
    pub yes_bid: f64,
    pub yes_ask: f64,
    pub volume: f64,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
    pub ticker: String,
    pub score: f64,
    pub ts: String,
}

/// The four independently tracked data sources.
/// Each one owns its own clear-on-success slot in the error banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Refresh,
    Alerts,
    Features,
    Markets,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Refresh => "refresh",
            Source::Alerts => "alerts",
            Source::Features => "features",
            Source::Markets => "markets",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Source::Refresh => "Refresh",
            Source::Alerts => "Alerts",
            Source::Features => "Features",
            Source::Markets => "Markets",
        };
        f.write_str(label)
    }
}
