//! Render-ready snapshot of the session for whatever draws the dashboard.

use chrono::{DateTime, Utc};

use crate::analytics::chart::{self, Chart};
use crate::analytics::correlation::Heatmap;
use crate::analytics::order_book::{self, OrderBook};
use crate::analytics::timeline::{self, TimelineBucket};
use crate::market_data::types::{Alert, MarketSummary};
use crate::poll::PollSettings;
use crate::state::session::{ErrorRecord, FeatureSeries, Health, SessionState};

pub const EMPTY_ALERTS_HINT: &str = "No alerts yet. Run a refresh to ingest markets.";

const MISSING: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveIndicator {
    Live,
    Paused,
}

/// Headline numbers from the newest feature row, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestStats {
    pub mid: String,
    pub spread: String,
    pub prob: String,
    pub volume: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub endpoint: String,
    pub alerts: usize,
    pub features: usize,
    pub last_refresh: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub focus_ticker: Option<String>,
    pub features: Option<FeatureSeries>,
    pub stats: LatestStats,
    pub price_chart: Chart,
    pub spread_volume_chart: Chart,
    pub order_book: OrderBook,
    pub alerts: Vec<Alert>,
    pub alerts_hint: Option<&'static str>,
    pub timeline: Vec<TimelineBucket>,
    pub markets: Vec<MarketSummary>,
    pub heatmap: Heatmap,
    pub error: Option<ErrorRecord>,
    pub live: LiveIndicator,
    pub health: Health,
    pub summary: SystemSummary,
}

/// Fixed-precision number, or `--` when missing or not finite.
pub fn format_number(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.digits$}"),
        _ => MISSING.to_string(),
    }
}

pub fn build(state: &SessionState, settings: &PollSettings) -> DashboardView {
    let surface = &settings.surface;
    let features = state.features.as_ref();
    let latest = features.and_then(FeatureSeries::latest);

    let stats = LatestStats {
        mid: format_number(latest.map(|r| r.mid), 2),
        spread: format_number(latest.map(|r| r.spread), 2),
        prob: format_number(latest.map(|r| r.prob), 3),
        volume: format_number(latest.map(|r| r.volume), 0),
    };

    let (mids, spreads, volumes) = match features {
        Some(series) => (
            series.chronological(|r| r.mid),
            series.chronological(|r| r.spread),
            series.chronological(|r| r.volume),
        ),
        None => (Vec::new(), Vec::new(), Vec::new()),
    };

    let quote = features.and_then(|series| state.markets.quote(&series.ticker));

    DashboardView {
        focus_ticker: state.focus_ticker.clone(),
        features: state.features.clone(),
        stats,
        price_chart: chart::single_series_chart(&mids, surface),
        spread_volume_chart: chart::dual_series_chart(("spread", spreads.as_slice()), ("volume", volumes.as_slice()), surface),
        order_book: order_book::synthesize(latest, quote.as_ref()),
        alerts: state.alerts.clone(),
        alerts_hint: state.alerts.is_empty().then_some(EMPTY_ALERTS_HINT),
        timeline: timeline::bucket_alerts(&state.alerts),
        markets: state.markets.markets().to_vec(),
        heatmap: state.heatmap.clone(),
        error: state.error().cloned(),
        live: if state.auto_refresh { LiveIndicator::Live } else { LiveIndicator::Paused },
        health: state.health,
        summary: SystemSummary {
            endpoint: settings.endpoint.clone(),
            alerts: state.alerts.len(),
            features: features.map_or(0, |s| s.rows.len()),
            last_refresh: state.last_refresh,
        },
    }
}
