//! Drives the [`Populator`](crate::populator::Populator) on the two external
//! schedules named in §4.11: a daily interval and a weekly interval, each
//! its own `tokio::time::interval` loop so a slow weekly run never delays
//! the next daily tick.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::PopulatorConfig;
use crate::populator::Populator;

/// Spawns the daily and weekly populator loops as background tasks. Returns
/// their join handles so the caller can await or abort them; both loops stop
/// as soon as `cancel` is canceled.
pub fn spawn(
    populator: Arc<Populator>,
    config: PopulatorConfig,
    cancel: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    if !config.enabled {
        info!("scheduled cache populator disabled by configuration");
        return Vec::new();
    }

    let daily = tokio::spawn(daily_loop(
        populator.clone(),
        Duration::from_secs(config.daily_interval_hours * 3600),
        cancel.clone(),
    ));
    let weekly = tokio::spawn(weekly_loop(
        populator,
        Duration::from_secs(config.weekly_interval_hours * 3600),
        cancel,
    ));

    vec![daily, weekly]
}

async fn daily_loop(populator: Arc<Populator>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    // The first tick fires immediately; skip it so the job runs on the
    // configured cadence rather than the moment the process starts.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("daily populator loop shutting down");
                return;
            }
            _ = ticker.tick() => {
                populator.run_daily(&cancel).await;
            }
        }
    }
}

async fn weekly_loop(populator: Arc<Populator>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("weekly populator loop shutting down");
                return;
            }
            _ = ticker.tick() => {
                populator.run_weekly(&cancel).await;
            }
        }
    }
}
