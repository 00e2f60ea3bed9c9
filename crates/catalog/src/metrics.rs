use std::sync::atomic::{AtomicI64, Ordering};

use mediacat_db::{CatalogStore, DbError};
use serde::Serialize;
use tracing::info;

/// Gauges sampled periodically from the store.
#[derive(Debug, Default)]
pub struct CatalogMetrics {
    video_count: AtomicI64,
    sampled_at: AtomicI64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub video_count: i64,
    /// Unix seconds of the last sample, 0 if never sampled.
    pub sampled_at: i64,
}

impl CatalogMetrics {
    pub async fn sample(&self, store: &dyn CatalogStore) -> Result<i64, DbError> {
        let count = store.count_videos().await?;
        self.video_count.store(count, Ordering::Relaxed);
        self.sampled_at
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
        info!(video_count = count, "metrics sampled");
        Ok(count)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            video_count: self.video_count.load(Ordering::Relaxed),
            sampled_at: self.sampled_at.load(Ordering::Relaxed),
        }
    }
}
