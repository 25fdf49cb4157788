//! Interval-driven snapshot worker (spec §4.10's non-synchronous mode): a
//! single ticker periodically dumps the whole store to `path`, until
//! `shutdown` reports true.

use rt_metrics_storage::MetricStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

pub async fn run(
    store: Arc<dyn MetricStore>,
    path: PathBuf,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = store.save_to_file(&path).await {
                    error!(error = %e, path = %path.display(), "interval snapshot failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("snapshot worker stopping");
                    return;
                }
            }
        }
    }
}
