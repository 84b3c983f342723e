use std::sync::Arc;

use anyhow::Result;
use prediction_monitor::analytics::correlation::Heatmap;
use prediction_monitor::config::Config;
use prediction_monitor::market_data::adapters::HttpFeedBackend;
use prediction_monitor::metrics;
use prediction_monitor::view::DashboardView;
use prediction_monitor::PollCoordinator;
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Stand-in for the view layer: logs what a renderer would draw.
async fn run_view_logger(coordinator: PollCoordinator, period: Duration) {
    let mut ticker = interval(period);
    loop {
        ticker.tick().await;
        log_view(&coordinator.view().await);
    }
}

fn log_view(view: &DashboardView) {
    let heatmap = match &view.heatmap {
        Heatmap::Pending => "pending".to_string(),
        Heatmap::InsufficientData => "insufficient data".to_string(),
        Heatmap::Matrix(m) => format!("{}x{}", m.len(), m.len()),
    };

    info!(
        health = ?view.health,
        live = ?view.live,
        focus = view.focus_ticker.as_deref().unwrap_or("--"),
        mid = %view.stats.mid,
        spread = %view.stats.spread,
        prob = %view.stats.prob,
        volume = %view.stats.volume,
        alerts = view.summary.alerts,
        markets = view.markets.len(),
        ladder_levels = view.order_book.levels().len(),
        timeline_buckets = view.timeline.len(),
        %heatmap,
        "dashboard"
    );

    if let Some(err) = &view.error {
        warn!(source = %err.source, message = %err.message, at = %err.at, "dashboard error banner");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    if let Some(port) = config.metrics_port {
        metrics::init_metrics_server(port)?;
        info!(port, "metrics exporter listening");
    }

    let backend = HttpFeedBackend::new(&config.backend_url, config.request_timeout)?;
    info!(backend = %backend.base_url(), "prediction-monitor starting");

    let coordinator = PollCoordinator::new(Arc::new(backend), config.poll_settings());

    coordinator.check_health().await;
    if let Some(ticker) = &config.focus_ticker {
        coordinator.set_focus_ticker(ticker).await;
    }
    if config.refresh_on_start {
        let report = coordinator.trigger_backend_refresh(config.refresh_limit).await;
        info!(?report, "startup refresh finished");
    } else {
        coordinator.request_alerts_refresh().await;
        coordinator.request_markets_refresh(None).await;
        coordinator.request_feature_refresh().await;
    }
    coordinator.set_auto_refresh(config.auto_refresh).await;

    let logger_handle = tokio::spawn(run_view_logger(coordinator.clone(), config.poll_interval));

    tokio::select! {
        res = logger_handle => {
            if let Err(err) = res {
                warn!(error = %err, "view logger task panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl-C, shutting down");
        }
    }

    coordinator.set_auto_refresh(false).await;
    Ok(())
}
