pub mod coordinator;
pub mod scheduler;

use std::time::Duration;

use crate::analytics::chart::ChartSurface;

pub use coordinator::{PollCoordinator, WeakCoordinator};

/// Markets (and the heatmap behind them) refresh on every Nth auto-refresh tick.
pub const MARKETS_EVERY_N_TICKS: u64 = 3;

/// Knobs for the coordinator; built from `Config` in the binary.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub alert_limit: usize,
    pub feature_limit: usize,
    pub market_limit: usize,
    pub surface: ChartSurface,
    /// Shown in the system summary.
    pub endpoint: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            alert_limit: 50,
            feature_limit: 80,
            market_limit: 200,
            surface: ChartSurface::default(),
            endpoint: String::new(),
        }
    }
}

/// What happened to one fetch once it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Superseded by a newer request; dropped without touching state.
    Stale,
    /// Recorded on the error banner.
    Failed,
    /// Nothing to fetch (no focus ticker).
    Skipped,
}

/// Per-step result of a backend refresh cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub refresh: FetchOutcome,
    pub alerts: FetchOutcome,
    pub markets: FetchOutcome,
    pub features: FetchOutcome,
}
