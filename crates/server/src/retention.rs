//! Artifact retention sweeper

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use store_assistant_agent::QueryPipeline;

use crate::metrics::record_artifacts_purged;

/// Periodically delete spoken answers older than `retention`
///
/// The first sweep runs immediately. Deletion goes through the artifact
/// store's per-id locks, so a sweep never races a concurrent `GET`.
pub fn spawn_sweeper(pipeline: Arc<QueryPipeline>, retention: Duration, every: Duration) -> JoinHandle<()> {
    tracing::info!(
        retention_secs = retention.as_secs(),
        interval_secs = every.as_secs(),
        "Starting artifact retention sweeper"
    );

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(every);
        interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            match pipeline.purge_artifacts(retention).await {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::info!(purged, "Purged expired artifacts");
                    record_artifacts_purged(purged);
                }
                Err(e) => tracing::warn!(error = %e, "Artifact sweep failed"),
            }
        }
    })
}
