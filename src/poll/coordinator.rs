use std::sync::{Arc, Weak};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{oneshot, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::analytics::correlation::{self, Heatmap};
use crate::error::FetchError;
use crate::market_data::traits::FeedBackend;
use crate::market_data::types::{Alert, MarketSummary, Source};
use crate::metrics;
use crate::poll::scheduler::run_auto_refresh;
use crate::poll::{CascadeReport, FetchOutcome, PollSettings, MARKETS_EVERY_N_TICKS};
use crate::state::session::{ErrorRecord, FeatureSeries, Health, SessionState};
use crate::view::{self, DashboardView};

type SessionHandle = Arc<RwLock<SessionState>>;

/// Sole owner of the dashboard session.
///
/// Fetches run without holding the session lock; each completion takes the
/// write lock once and applies (or discards) its result synchronously, so
/// completions never interleave partial mutations. Cheap to clone.
#[derive(Clone)]
pub struct PollCoordinator {
    backend: Arc<dyn FeedBackend>,
    settings: Arc<PollSettings>,
    session: SessionHandle,
    auto_refresh: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl PollCoordinator {
    pub fn new(backend: Arc<dyn FeedBackend>, settings: PollSettings) -> Self {
        Self {
            backend,
            settings: Arc::new(settings),
            session: Arc::new(RwLock::new(SessionState::new())),
            auto_refresh: Arc::new(Mutex::new(None)),
        }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Handle that does not keep the session alive. The auto-refresh cycle
    /// holds one of these so dropping every coordinator ends the cycle.
    pub fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator {
            backend: Arc::downgrade(&self.backend),
            settings: Arc::downgrade(&self.settings),
            session: Arc::downgrade(&self.session),
            auto_refresh: Arc::downgrade(&self.auto_refresh),
        }
    }

    // ── Focus ────────────────────────────────────────────────────

    /// Tracks `ticker` from now on. The previous ticker's rows stay visible
    /// until the new ticker's first response is applied. Blank input is ignored.
    pub async fn set_focus_ticker(&self, ticker: &str) -> bool {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            debug!("ignoring blank focus ticker");
            return false;
        }

        let mut state = self.session.write().await;
        if state.focus_ticker.as_deref() != Some(ticker) {
            info!(%ticker, "focus ticker changed");
            state.focus_ticker = Some(ticker.to_string());
            // anything still in flight belongs to the old ticker
            state.feature_epoch.issue();
        }
        true
    }

    pub async fn clear_focus(&self) {
        let mut state = self.session.write().await;
        state.focus_ticker = None;
        state.feature_epoch.issue();
    }

    /// Focus `ticker` and fetch its features right away.
    pub async fn load_features(&self, ticker: &str) -> FetchOutcome {
        if !self.set_focus_ticker(ticker).await {
            return FetchOutcome::Skipped;
        }
        self.request_feature_refresh().await
    }

    // ── Fetches ──────────────────────────────────────────────────

    /// Fetches the focus ticker's features under a fresh epoch. The response
    /// is applied only if no newer request was issued in the meantime.
    pub async fn request_feature_refresh(&self) -> FetchOutcome {
        let (ticker, epoch) = {
            let mut state = self.session.write().await;
            let Some(ticker) = state.focus_ticker.clone() else {
                return FetchOutcome::Skipped;
            };
            (ticker, state.feature_epoch.issue())
        };
        debug!(%ticker, epoch = epoch.value(), "feature fetch issued");

        let started = Instant::now();
        let result = self.backend.features(&ticker, self.settings.feature_limit).await;
        record_latency(Source::Features, started);

        let mut state = self.session.write().await;
        if !state.feature_epoch.is_current(epoch) {
            debug!(
                %ticker,
                epoch = epoch.value(),
                current = state.feature_epoch.current(),
                "discarding stale feature response"
            );
            metrics::record_fetch(Source::Features.as_str(), "stale");
            return FetchOutcome::Stale;
        }

        match result {
            Ok(rows) => {
                info!(%ticker, rows = rows.len(), "features applied");
                state.features = Some(FeatureSeries { ticker, rows });
                state.record_success(Source::Features, Utc::now());
                metrics::record_fetch(Source::Features.as_str(), "applied");
                FetchOutcome::Applied
            }
            Err(err) => {
                apply_failure(&mut state, Source::Features, &err);
                FetchOutcome::Failed
            }
        }
    }

    /// Alerts are a full replace and safe to reapply, so there is no staleness guard.
    pub async fn request_alerts_refresh(&self) -> FetchOutcome {
        let started = Instant::now();
        let result = self.backend.alerts(self.settings.alert_limit).await;
        record_latency(Source::Alerts, started);

        let mut state = self.session.write().await;
        match result {
            Ok(alerts) => {
                debug!(alerts = alerts.len(), "alerts applied");
                state.alerts = alerts;
                state.record_success(Source::Alerts, Utc::now());
                metrics::record_fetch(Source::Alerts.as_str(), "applied");
                FetchOutcome::Applied
            }
            Err(err) => {
                apply_failure(&mut state, Source::Alerts, &err);
                FetchOutcome::Failed
            }
        }
    }

    /// Fetches markets with `search` (remembered for later polls) and, on
    /// success, recomputes the heatmap.
    pub async fn request_markets_refresh(&self, search: Option<&str>) -> FetchOutcome {
        {
            let mut state = self.session.write().await;
            state.search_term = search
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string);
        }
        self.reload_markets().await
    }

    async fn reload_markets(&self) -> FetchOutcome {
        let search = self.session.read().await.search_term.clone();

        let started = Instant::now();
        let result = self
            .backend
            .markets(self.settings.market_limit, search.as_deref())
            .await;
        record_latency(Source::Markets, started);

        match result {
            Ok(markets) => {
                {
                    let mut state = self.session.write().await;
                    debug!(markets = markets.len(), search = ?search, "markets applied");
                    state.markets.replace_all(markets);
                    state.record_success(Source::Markets, Utc::now());
                }
                metrics::record_fetch(Source::Markets.as_str(), "applied");
                self.refresh_heatmap().await;
                FetchOutcome::Applied
            }
            Err(err) => {
                let mut state = self.session.write().await;
                apply_failure(&mut state, Source::Markets, &err);
                FetchOutcome::Failed
            }
        }
    }

    /// Recomputes the correlation heatmap from the current market set.
    /// Overlapping recomputes resolve last-issued-wins like features.
    pub async fn refresh_heatmap(&self) -> FetchOutcome {
        let (epoch, markets) = {
            let mut state = self.session.write().await;
            (state.heatmap_epoch.issue(), state.markets.markets().to_vec())
        };

        let heatmap = correlation::compute_heatmap(self.backend.as_ref(), &markets).await;

        let mut state = self.session.write().await;
        if !state.heatmap_epoch.is_current(epoch) {
            debug!(epoch = epoch.value(), "discarding stale heatmap");
            return FetchOutcome::Stale;
        }
        if let Heatmap::Matrix(m) = &heatmap {
            info!(tickers = ?m.tickers, "heatmap updated");
        } else {
            debug!("heatmap has insufficient data");
        }
        state.heatmap = heatmap;
        FetchOutcome::Applied
    }

    /// Health is an indicator only; it never touches the error banner.
    pub async fn check_health(&self) -> Health {
        let health = match self.backend.health().await {
            Ok(()) => Health::Online,
            Err(err) => {
                debug!(error = %err, "backend health check failed");
                Health::Offline
            }
        };
        metrics::record_health(health == Health::Online);
        self.session.write().await.health = health;
        health
    }

    /// Asks the backend to ingest up to `limit` markets and, if that succeeds,
    /// refreshes alerts, markets and (with a focus ticker) features in that
    /// order. A failed ingest skips the follow-ups; once started, every
    /// follow-up runs and reports on its own even if an earlier one failed.
    pub async fn trigger_backend_refresh(&self, limit: usize) -> CascadeReport {
        info!(limit, "triggering backend market refresh");

        let started = Instant::now();
        let result = self.backend.refresh_markets(limit).await;
        record_latency(Source::Refresh, started);

        let refresh = {
            let mut state = self.session.write().await;
            match result {
                Ok(()) => {
                    let now = Utc::now();
                    state.last_refresh = Some(now);
                    state.record_success(Source::Refresh, now);
                    metrics::record_fetch(Source::Refresh.as_str(), "applied");
                    FetchOutcome::Applied
                }
                Err(err) => {
                    apply_failure(&mut state, Source::Refresh, &err);
                    FetchOutcome::Failed
                }
            }
        };

        if refresh == FetchOutcome::Failed {
            return CascadeReport {
                refresh,
                alerts: FetchOutcome::Skipped,
                markets: FetchOutcome::Skipped,
                features: FetchOutcome::Skipped,
            };
        }

        let alerts = self.request_alerts_refresh().await;
        let markets = self.reload_markets().await;
        let features = self.request_feature_refresh().await;

        CascadeReport {
            refresh,
            alerts,
            markets,
            features,
        }
    }

    /// One auto-refresh cycle: health, alerts, features when focused, and
    /// markets every `MARKETS_EVERY_N_TICKS`th tick.
    pub(crate) async fn run_tick(&self, tick: u64) {
        let markets_due = tick % MARKETS_EVERY_N_TICKS == 0;
        debug!(tick, markets_due, "auto-refresh tick");
        metrics::record_tick(markets_due);

        self.check_health().await;
        self.request_alerts_refresh().await;
        self.request_feature_refresh().await;
        if markets_due {
            self.reload_markets().await;
        }
    }

    // ── Auto-refresh ─────────────────────────────────────────────

    /// Enabling (re)starts the periodic cycle; disabling stops it without
    /// waiting on requests already in flight, which still apply normally.
    pub async fn set_auto_refresh(&self, enabled: bool) {
        let mut slot = self.auto_refresh.lock().await;
        if let Some(stop) = slot.take() {
            // the cycle may already be gone; nothing to do then
            let _ = stop.send(());
        }
        self.session.write().await.auto_refresh = enabled;

        if enabled {
            let (stop_tx, stop_rx) = oneshot::channel();
            tokio::spawn(run_auto_refresh(self.downgrade(), self.settings.interval, stop_rx));
            *slot = Some(stop_tx);
        }
        info!(enabled, "auto-refresh toggled");
    }

    // ── Errors ───────────────────────────────────────────────────

    /// With a source, clears the banner only if it belongs to that source.
    pub async fn dismiss_error(&self, source: Option<Source>) {
        self.session.write().await.dismiss_error(source);
    }

    // ── Read accessors ───────────────────────────────────────────

    pub async fn view(&self) -> DashboardView {
        let state = self.session.read().await;
        view::build(&state, &self.settings)
    }

    pub async fn focus_ticker(&self) -> Option<String> {
        self.session.read().await.focus_ticker.clone()
    }

    pub async fn features(&self) -> Option<FeatureSeries> {
        self.session.read().await.features.clone()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.session.read().await.alerts.clone()
    }

    pub async fn markets(&self) -> Vec<MarketSummary> {
        self.session.read().await.markets.markets().to_vec()
    }

    pub async fn heatmap(&self) -> Heatmap {
        self.session.read().await.heatmap.clone()
    }

    pub async fn error(&self) -> Option<ErrorRecord> {
        self.session.read().await.error().cloned()
    }

    pub async fn health(&self) -> Health {
        self.session.read().await.health
    }

    pub async fn is_auto_refresh(&self) -> bool {
        self.session.read().await.auto_refresh
    }
}

/// Non-owning counterpart of [`PollCoordinator`].
#[derive(Clone)]
pub struct WeakCoordinator {
    backend: Weak<dyn FeedBackend>,
    settings: Weak<PollSettings>,
    session: Weak<RwLock<SessionState>>,
    auto_refresh: Weak<Mutex<Option<oneshot::Sender<()>>>>,
}

impl WeakCoordinator {
    /// `None` once the last `PollCoordinator` for this session is gone.
    pub fn upgrade(&self) -> Option<PollCoordinator> {
        Some(PollCoordinator {
            backend: self.backend.upgrade()?,
            settings: self.settings.upgrade()?,
            session: self.session.upgrade()?,
            auto_refresh: self.auto_refresh.upgrade()?,
        })
    }
}

fn apply_failure(state: &mut SessionState, source: Source, err: &FetchError) {
    warn!(source = source.as_str(), kind = err.kind(), error = %err, "fetch failed");
    metrics::record_fetch(source.as_str(), "failed");
    state.record_failure(source, err.to_string(), Utc::now());
}

fn record_latency(source: Source, started: Instant) {
    metrics::record_fetch_latency(source.as_str(), started.elapsed().as_secs_f64() * 1_000.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchResult;
    use crate::market_data::types::FeatureSnapshot;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct FakeBackend {
        health: StdMutex<FetchResult<()>>,
        refresh: StdMutex<FetchResult<()>>,
        alerts: StdMutex<FetchResult<Vec<Alert>>>,
        markets: StdMutex<FetchResult<Vec<MarketSummary>>>,
        features: StdMutex<HashMap<String, FetchResult<Vec<FeatureSnapshot>>>>,
        gates: StdMutex<HashMap<String, oneshot::Receiver<()>>>,
        calls: StdMutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                health: StdMutex::new(Ok(())),
                refresh: StdMutex::new(Ok(())),
                alerts: StdMutex::new(Ok(Vec::new())),
                markets: StdMutex::new(Ok(Vec::new())),
                features: StdMutex::new(HashMap::new()),
                gates: StdMutex::new(HashMap::new()),
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn set_features(&self, ticker: &str, mids: &[f64]) {
            let rows = mids
                .iter()
                .map(|mid| FeatureSnapshot {
                    ticker: ticker.to_string(),
                    mid: *mid,
                    spread: 2.0,
                    ..Default::default()
                })
                .collect();
            self.features.lock().unwrap().insert(ticker.to_string(), Ok(rows));
        }

        /// The next features call for `ticker` blocks until the returned sender fires.
        fn gate(&self, ticker: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(ticker.to_string(), rx);
            tx
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
        }

        async fn wait_for(&self, call: &str) {
            while self.count(call) == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl FeedBackend for FakeBackend {
        async fn health(&self) -> FetchResult<()> {
            self.log("health".into());
            self.health.lock().unwrap().clone()
        }

        async fn refresh_markets(&self, limit: usize) -> FetchResult<()> {
            self.log(format!("refresh:{limit}"));
            self.refresh.lock().unwrap().clone()
        }

        async fn alerts(&self, _limit: usize) -> FetchResult<Vec<Alert>> {
            self.log("alerts".into());
            self.alerts.lock().unwrap().clone()
        }

        async fn markets(&self, _limit: usize, search: Option<&str>) -> FetchResult<Vec<MarketSummary>> {
            self.log(match search {
                Some(term) => format!("markets:{term}"),
                None => "markets".into(),
            });
            self.markets.lock().unwrap().clone()
        }

        async fn features(&self, ticker: &str, _limit: usize) -> FetchResult<Vec<FeatureSnapshot>> {
            self.log(format!("features:{ticker}"));
            let gate = self.gates.lock().unwrap().remove(ticker);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.features
                .lock()
                .unwrap()
                .get(ticker)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn coordinator(backend: &Arc<FakeBackend>) -> PollCoordinator {
        PollCoordinator::new(backend.clone(), PollSettings::default())
    }

    fn spawn_feature_refresh(c: &PollCoordinator) -> tokio::task::JoinHandle<FetchOutcome> {
        let c = c.clone();
        tokio::spawn(async move { c.request_feature_refresh().await })
    }

    #[tokio::test]
    async fn test_late_response_for_old_ticker_is_discarded() {
        let backend = FakeBackend::new();
        backend.set_features("AAA", &[10.0]);
        backend.set_features("BBB", &[20.0]);
        let release_a = backend.gate("AAA");
        let release_b = backend.gate("BBB");
        let c = coordinator(&backend);

        c.set_focus_ticker("AAA").await;
        let a = spawn_feature_refresh(&c);
        backend.wait_for("features:AAA").await;

        c.set_focus_ticker("BBB").await;
        let b = spawn_feature_refresh(&c);
        backend.wait_for("features:BBB").await;

        release_a.send(()).unwrap();
        assert_eq!(a.await.unwrap(), FetchOutcome::Stale);
        assert!(c.features().await.is_none());

        release_b.send(()).unwrap();
        assert_eq!(b.await.unwrap(), FetchOutcome::Applied);
        let series = c.features().await.unwrap();
        assert_eq!(series.ticker, "BBB");
        assert_eq!(series.rows[0].mid, 20.0);
    }

    #[tokio::test]
    async fn test_overlapping_requests_for_same_ticker_keep_last_issued() {
        let backend = FakeBackend::new();
        backend.set_features("AAA", &[10.0]);
        let release_first = backend.gate("AAA");
        let c = coordinator(&backend);
        c.set_focus_ticker("AAA").await;

        let first = spawn_feature_refresh(&c);
        backend.wait_for("features:AAA").await;

        // second request is not gated and lands first
        backend.set_features("AAA", &[11.0]);
        assert_eq!(c.request_feature_refresh().await, FetchOutcome::Applied);

        backend.set_features("AAA", &[99.0]);
        release_first.send(()).unwrap();
        assert_eq!(first.await.unwrap(), FetchOutcome::Stale);
        assert_eq!(c.features().await.unwrap().rows[0].mid, 11.0);
    }

    #[tokio::test]
    async fn test_switching_focus_keeps_old_rows_until_new_data() {
        let backend = FakeBackend::new();
        backend.set_features("AAA", &[10.0]);
        backend.set_features("BBB", &[20.0]);
        let c = coordinator(&backend);

        assert_eq!(c.load_features("AAA").await, FetchOutcome::Applied);
        c.set_focus_ticker("BBB").await;
        assert_eq!(c.features().await.unwrap().ticker, "AAA");

        c.request_feature_refresh().await;
        assert_eq!(c.features().await.unwrap().ticker, "BBB");
    }

    #[tokio::test]
    async fn test_feature_refresh_without_focus_is_skipped() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);
        assert!(!c.set_focus_ticker("   ").await);
        assert_eq!(c.request_feature_refresh().await, FetchOutcome::Skipped);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failures_surface_per_source_and_clear_on_success() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);

        *backend.markets.lock().unwrap() = Err(FetchError::Backend { status: 503 });
        assert_eq!(c.request_markets_refresh(None).await, FetchOutcome::Failed);
        let banner = c.error().await.unwrap();
        assert_eq!(banner.source, Source::Markets);
        assert_eq!(banner.message, "HTTP 503");

        // another source succeeding leaves the markets banner alone
        assert_eq!(c.request_alerts_refresh().await, FetchOutcome::Applied);
        assert_eq!(c.error().await.map(|e| e.source), Some(Source::Markets));

        *backend.markets.lock().unwrap() = Ok(Vec::new());
        assert_eq!(c.request_markets_refresh(None).await, FetchOutcome::Applied);
        assert!(c.error().await.is_none());
    }

    #[tokio::test]
    async fn test_latest_failure_wins_and_dismiss_clears() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);

        *backend.alerts.lock().unwrap() = Err(FetchError::Transport("connection refused".into()));
        *backend.markets.lock().unwrap() = Err(FetchError::Backend { status: 500 });
        c.request_alerts_refresh().await;
        c.request_markets_refresh(None).await;
        assert_eq!(c.error().await.map(|e| e.source), Some(Source::Markets));

        c.dismiss_error(Some(Source::Alerts)).await;
        assert!(c.error().await.is_some());
        c.dismiss_error(None).await;
        assert!(c.error().await.is_none());
    }

    #[tokio::test]
    async fn test_markets_success_recomputes_heatmap() {
        let backend = FakeBackend::new();
        *backend.markets.lock().unwrap() = Ok(vec![
            MarketSummary { ticker: "AAA".into(), volume: 100.0, ..Default::default() },
            MarketSummary { ticker: "BBB".into(), volume: 50.0, ..Default::default() },
        ]);
        backend.set_features("AAA", &[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        backend.set_features("BBB", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let c = coordinator(&backend);
        assert_eq!(c.heatmap().await, Heatmap::Pending);

        c.request_markets_refresh(Some("  ")).await;

        let heatmap = c.heatmap().await;
        let matrix = heatmap.matrix().unwrap();
        assert_eq!(matrix.tickers, vec!["AAA", "BBB"]);
        assert!((matrix.values[0][1] + 1.0).abs() < 1e-12);
        assert!(backend.calls().contains(&"markets".to_string()));
    }

    #[tokio::test]
    async fn test_search_term_is_reused_by_later_polls() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);

        c.request_markets_refresh(Some(" HIGHNY ")).await;
        c.trigger_backend_refresh(100).await;

        assert_eq!(backend.count("markets:HIGHNY"), 2);
    }

    #[tokio::test]
    async fn test_failed_ingest_skips_follow_up_refreshes() {
        let backend = FakeBackend::new();
        *backend.refresh.lock().unwrap() = Err(FetchError::Transport("connection refused".into()));
        let c = coordinator(&backend);
        c.set_focus_ticker("AAA").await;

        let report = c.trigger_backend_refresh(100).await;

        assert_eq!(
            report,
            CascadeReport {
                refresh: FetchOutcome::Failed,
                alerts: FetchOutcome::Skipped,
                markets: FetchOutcome::Skipped,
                features: FetchOutcome::Skipped,
            }
        );
        assert_eq!(backend.calls(), vec!["refresh:100"]);
        assert_eq!(c.error().await.map(|e| e.source), Some(Source::Refresh));
        assert!(c.view().await.summary.last_refresh.is_none());
    }

    #[tokio::test]
    async fn test_cascade_continues_after_failed_alerts() {
        let backend = FakeBackend::new();
        backend.set_features("AAA", &[10.0]);
        *backend.alerts.lock().unwrap() = Err(FetchError::Backend { status: 502 });
        let c = coordinator(&backend);
        c.set_focus_ticker("AAA").await;

        let report = c.trigger_backend_refresh(100).await;

        assert_eq!(
            report,
            CascadeReport {
                refresh: FetchOutcome::Applied,
                alerts: FetchOutcome::Failed,
                markets: FetchOutcome::Applied,
                features: FetchOutcome::Applied,
            }
        );
        assert_eq!(backend.calls(), vec!["refresh:100", "alerts", "markets", "features:AAA"]);
        // later successes belong to other sources
        assert_eq!(c.error().await.map(|e| e.source), Some(Source::Alerts));
        assert!(c.view().await.summary.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_cascade_runs_steps_in_order() {
        let backend = FakeBackend::new();
        backend.set_features("AAA", &[10.0]);
        let c = coordinator(&backend);
        c.set_focus_ticker("AAA").await;

        let report = c.trigger_backend_refresh(25).await;

        assert_eq!(report.features, FetchOutcome::Applied);
        assert_eq!(backend.calls(), vec!["refresh:25", "alerts", "markets", "features:AAA"]);
        assert!(c.view().await.summary.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_health_does_not_raise_banner() {
        let backend = FakeBackend::new();
        *backend.health.lock().unwrap() = Err(FetchError::Transport("timed out".into()));
        let c = coordinator(&backend);

        assert_eq!(c.check_health().await, Health::Offline);
        assert!(c.error().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_cycle_and_stop() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);
        c.set_focus_ticker("AAA").await;

        c.set_auto_refresh(true).await;
        // ticks at 0s, 10s and 20s
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(backend.count("health"), 3);
        assert_eq!(backend.count("alerts"), 3);
        assert_eq!(backend.count("features:AAA"), 3);
        assert_eq!(backend.count("markets"), 1);
        assert!(c.is_auto_refresh().await);

        c.set_auto_refresh(false).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(backend.count("health"), 3);
        assert!(!c.is_auto_refresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_in_flight_when_disabled_still_applies() {
        let backend = FakeBackend::new();
        backend.set_features("AAA", &[10.0]);
        let release = backend.gate("AAA");
        let c = coordinator(&backend);
        c.set_focus_ticker("AAA").await;

        c.set_auto_refresh(true).await;
        backend.wait_for("features:AAA").await;
        c.set_auto_refresh(false).await;

        release.send(()).unwrap();
        while c.features().await.is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(c.features().await.unwrap().rows[0].mid, 10.0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.count("health"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_coordinator_ends_auto_refresh() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);
        c.set_auto_refresh(true).await;
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(backend.count("health"), 2);

        let weak_backend = Arc::downgrade(&backend);
        let weak_session = c.downgrade();
        drop(c);
        drop(backend);
        tokio::time::sleep(Duration::from_secs(35)).await;

        assert!(weak_session.upgrade().is_none());
        assert!(weak_backend.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reenabling_keeps_a_single_cycle() {
        let backend = FakeBackend::new();
        let c = coordinator(&backend);

        c.set_auto_refresh(true).await;
        c.set_auto_refresh(true).await;
        tokio::time::sleep(Duration::from_secs(15)).await;

        // one cycle: ticks at 0s and 10s
        assert_eq!(backend.count("health"), 2);
        c.set_auto_refresh(false).await;
        c.set_auto_refresh(false).await;
    }
}
