use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus HTTP exporter on the given port.
/// After this call, any metrics recorded via the `metrics` crate
/// macros (counter!, histogram!) are automatically exported at /metrics.
pub fn init_metrics_server(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;
    Ok(())
}

// ── Fetch metrics ────────────────────────────────────────────────

/// `outcome` is one of `applied`, `stale`, `failed`.
pub fn record_fetch(source: &str, outcome: &str) {
    counter!("poll_fetches_total", "source" => source.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

pub fn record_fetch_latency(source: &str, latency_ms: f64) {
    histogram!("poll_fetch_latency_ms", "source" => source.to_string())
        .record(latency_ms);
}

pub fn record_health(online: bool) {
    counter!("poll_health_checks_total", "online" => online.to_string())
        .increment(1);
}

// ── Scheduler metrics ────────────────────────────────────────────

pub fn record_tick(markets_due: bool) {
    counter!("poll_ticks_total", "markets_due" => markets_due.to_string())
        .increment(1);
}

// ── Analytics metrics ────────────────────────────────────────────

pub fn record_correlation_fetch_failure() {
    counter!("heatmap_series_failures_total").increment(1);
}

pub fn record_heatmap_size(tickers: usize) {
    histogram!("heatmap_tickers").record(tickers as f64);
}
