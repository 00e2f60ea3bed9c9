use std::sync::Arc;

use mediacat_core::types::VideoPatch;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::VideoCache;

/// Pending updates the writer task may lag behind before senders wait.
pub const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// A change already persisted to the store that the cache has to mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoUpdate {
    pub id: String,
    pub patch: VideoPatch,
}

impl VideoUpdate {
    pub fn watched(id: impl Into<String>, watched: bool) -> Self {
        Self {
            id: id.into(),
            patch: VideoPatch::watched(watched),
        }
    }
}

pub fn update_channel() -> (mpsc::Sender<VideoUpdate>, mpsc::Receiver<VideoUpdate>) {
    mpsc::channel(UPDATE_CHANNEL_CAPACITY)
}

/// Apply incoming updates to `cache` until cancelled or every sender is gone.
pub async fn run_cache_writer(
    cache: Arc<VideoCache>,
    mut updates: mpsc::Receiver<VideoUpdate>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("cache writer cancelled");
                break;
            }
            next = updates.recv() => {
                let Some(update) = next else {
                    debug!("update channel closed");
                    break;
                };
                if cache.patch(&update.id, update.patch).await {
                    info!(id = %update.id, "cached video updated");
                } else {
                    debug!(id = %update.id, "update for uncached video ignored");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediacat_core::types::{Video, VideoAttributes};
    use std::time::Duration;

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            title: "a.mp4".into(),
            file_path: "/m/a.mp4".into(),
            duration_ms: 0,
            size_bytes: 1,
            folder_id: "f-1".into(),
            attributes: VideoAttributes {
                exists: true,
                watched: false,
            },
        }
    }

    #[tokio::test]
    async fn writer_applies_updates_in_order() {
        let cache = Arc::new(VideoCache::new());
        cache.replace(vec![video("v-1")]).await;
        let (tx, rx) = update_channel();
        let cancel = CancellationToken::new();
        let writer = tokio::spawn(run_cache_writer(cache.clone(), rx, cancel.clone()));

        tx.send(VideoUpdate::watched("v-1", true)).await.unwrap();
        tx.send(VideoUpdate::watched("v-1", false)).await.unwrap();
        tx.send(VideoUpdate::watched("v-1", true)).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), writer)
            .await
            .unwrap()
            .unwrap();
        assert!(cache.read().await[0].attributes.watched);
    }

    #[tokio::test]
    async fn writer_stops_on_cancel() {
        let cache = Arc::new(VideoCache::new());
        let (_tx, rx) = update_channel();
        let cancel = CancellationToken::new();
        let writer = tokio::spawn(run_cache_writer(cache, rx, cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), writer)
            .await
            .unwrap()
            .unwrap();
    }
}
