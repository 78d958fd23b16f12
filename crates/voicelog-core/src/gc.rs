//! Periodic entity cache garbage collection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use voicelog_db::Journal;

/// Default interval between GC passes (two hours).
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(7200);

/// Run one GC pass, logging the outcome. Failures are not fatal; the next
/// pass retries.
pub async fn run_gc_pass(journal: &Journal) {
    match journal.collect_garbage().await {
        Ok(Some(report)) => tracing::debug!(removed = report.total(), "GC pass complete"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "GC pass failed, will retry next interval"),
    }
}

/// Run GC passes every `interval` until `shutdown` flips to `true` or its
/// sender is dropped.
///
/// The first pass runs immediately.
pub async fn run_gc_loop(
    journal: Arc<Journal>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = interval.as_secs(), "GC loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => run_gc_pass(&journal).await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("GC loop stopped");
}
