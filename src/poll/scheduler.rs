use tokio::sync::oneshot;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use crate::poll::coordinator::WeakCoordinator;

/// Periodic auto-refresh cycle.
///
/// Each tick body is spawned on its own task, so a stop signal ends the
/// schedule without cancelling or waiting on requests already in flight.
/// The first tick fires immediately. The cycle also ends once the last
/// coordinator for the session has been dropped.
pub async fn run_auto_refresh(
    coordinator: WeakCoordinator,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    info!(period_secs = period.as_secs_f64(), "auto-refresh started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;

            // Stop takes priority; a dropped sender counts as stop too
            _ = &mut stop_rx => {
                info!(ticks = tick, "auto-refresh stopped");
                break;
            }
            _ = ticker.tick() => {
                let Some(coordinator) = coordinator.upgrade() else {
                    info!(ticks = tick, "session dropped, auto-refresh stopped");
                    break;
                };
                tick += 1;
                tokio::spawn(async move {
                    coordinator.run_tick(tick).await;
                });
            }
        }
    }
}
