use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::analytics::chart::ChartSurface;
use crate::poll::PollSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub backend_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub alert_limit: usize,
    pub feature_limit: usize,
    pub market_limit: usize,
    pub refresh_limit: usize,
    /// `None` disables the Prometheus exporter.
    pub metrics_port: Option<u16>,
    pub focus_ticker: Option<String>,
    pub auto_refresh: bool,
    /// Ask the backend to ingest markets once at startup.
    pub refresh_on_start: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let log_level = get("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let backend_url = get("BACKEND_URL").unwrap_or_else(|| "http://127.0.0.1:8080".to_string());

        let poll_interval_secs: u64 = parse_or(&get, "POLL_INTERVAL_SECS", 10)?;
        if poll_interval_secs == 0 {
            return Err(anyhow!("POLL_INTERVAL_SECS must be greater than zero"));
        }
        let request_timeout_secs: u64 = parse_or(&get, "REQUEST_TIMEOUT_SECS", 10)?;
        let metrics_port: u16 = parse_or(&get, "METRICS_PORT", 9000)?;

        Ok(Self {
            log_level,
            backend_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            alert_limit: parse_or(&get, "ALERT_LIMIT", 50)?,
            feature_limit: parse_or(&get, "FEATURE_LIMIT", 80)?,
            market_limit: parse_or(&get, "MARKET_LIMIT", 200)?,
            refresh_limit: parse_or(&get, "REFRESH_LIMIT", 100)?,
            metrics_port: (metrics_port != 0).then_some(metrics_port),
            focus_ticker: get("FOCUS_TICKER"),
            auto_refresh: parse_or(&get, "AUTO_REFRESH", true)?,
            refresh_on_start: parse_or(&get, "REFRESH_ON_START", false)?,
        })
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
            alert_limit: self.alert_limit,
            feature_limit: self.feature_limit,
            market_limit: self.market_limit,
            surface: ChartSurface::default(),
            endpoint: self.backend_url.clone(),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
