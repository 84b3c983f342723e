use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::analytics::correlation::Heatmap;
use crate::market_data::types::{Alert, FeatureSnapshot, Source};
use crate::state::epoch::EpochGate;
use crate::state::market_cache::MarketCache;

/// Feature rows for one ticker, newest first, exactly as the last applied poll returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries {
    pub ticker: String,
    pub rows: Vec<FeatureSnapshot>,
}

impl FeatureSeries {
    pub fn latest(&self) -> Option<&FeatureSnapshot> {
        self.rows.first()
    }

    /// Values in chronological order.
    pub fn chronological<F>(&self, field: F) -> Vec<f64>
    where
        F: Fn(&FeatureSnapshot) -> f64,
    {
        self.rows.iter().rev().map(field).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Unknown,
    Online,
    Offline,
}

/// The single visible error banner.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub source: Source,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Everything the dashboard currently knows.
/// Owned by the poll coordinator; nothing else mutates it.
#[derive(Debug)]
pub struct SessionState {
    pub focus_ticker: Option<String>,
    pub features: Option<FeatureSeries>,
    pub alerts: Vec<Alert>,
    pub markets: MarketCache,
    pub search_term: Option<String>,
    pub heatmap: Heatmap,
    pub health: Health,
    pub auto_refresh: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub feature_epoch: EpochGate,
    pub heatmap_epoch: EpochGate,
    last_success: HashMap<Source, DateTime<Utc>>,
    error: Option<ErrorRecord>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            focus_ticker: None,
            features: None,
            alerts: Vec::new(),
            markets: MarketCache::new(),
            search_term: None,
            heatmap: Heatmap::Pending,
            health: Health::Unknown,
            auto_refresh: false,
            last_refresh: None,
            feature_epoch: EpochGate::new(),
            heatmap_epoch: EpochGate::new(),
            last_success: HashMap::new(),
            error: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `source` healthy and clears the banner if it belongs to `source`.
    pub fn record_success(&mut self, source: Source, at: DateTime<Utc>) {
        self.last_success.insert(source, at);
        self.dismiss_error(Some(source));
    }

    /// Replaces whatever banner is visible.
    pub fn record_failure(&mut self, source: Source, message: impl Into<String>, at: DateTime<Utc>) {
        self.error = Some(ErrorRecord {
            source,
            message: message.into(),
            at,
        });
    }

    /// With a source, clears only that source's banner; without one, clears unconditionally.
    pub fn dismiss_error(&mut self, source: Option<Source>) {
        match source {
            None => self.error = None,
            Some(source) => {
                if self.error.as_ref().is_some_and(|e| e.source == source) {
                    self.error = None;
                }
            }
        }
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.as_ref()
    }

    pub fn last_success(&self, source: Source) -> Option<DateTime<Utc>> {
        self.last_success.get(&source).copied()
    }
}
