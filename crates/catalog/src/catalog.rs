use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use mediacat_core::types::{Session, Video, VideoPatch};
use mediacat_db::{CatalogStore, VideoFilter};
use mediacat_scanner::reconcile::missing_files;
use mediacat_scanner::{ReconcileReport, Reconciler};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info};

use crate::CatalogError;
use crate::cache::{Snapshot, VideoCache};
use crate::events::{VideoUpdate, update_channel};
use crate::metrics::CatalogMetrics;
use crate::sessions;

/// Outcome of rebuilding the cache from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheRefresh {
    pub cached_videos: usize,
    pub marked_missing: usize,
}

/// Outcome of an on-demand or scheduled reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub reconcile: ReconcileReport,
    pub cache: CacheRefresh,
}

/// The handle the serving layer and the maintenance loops share.
///
/// Owns the snapshot cache and the sending half of the update channel. The
/// receiving half is returned from [`Catalog::new`] and is meant to be handed
/// to the cache writer task.
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    reconciler: Reconciler,
    cache: Arc<VideoCache>,
    updates: mpsc::Sender<VideoUpdate>,
    metrics: CatalogMetrics,
    session_lifespan: Duration,
    // Held for a whole pass + refresh so two reloads never interleave.
    pass_gate: Mutex<()>,
}

impl Catalog {
    pub fn new(reconciler: Reconciler) -> (Self, mpsc::Receiver<VideoUpdate>) {
        let (updates, rx) = update_channel();
        let catalog = Self {
            store: reconciler.store().clone(),
            reconciler,
            cache: Arc::new(VideoCache::new()),
            updates,
            metrics: CatalogMetrics::default(),
            session_lifespan: sessions::DEFAULT_LIFESPAN,
            pass_gate: Mutex::new(()),
        };
        (catalog, rx)
    }

    pub fn with_session_lifespan(mut self, lifespan: Duration) -> Self {
        self.session_lifespan = lifespan;
        self
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn cache(&self) -> &Arc<VideoCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &CatalogMetrics {
        &self.metrics
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.cache.read().await
    }

    pub async fn find_cached(&self, id: &str) -> Option<Video> {
        self.cache.read().await.iter().find(|v| v.id == id).cloned()
    }

    /// Patch the cache directly. Callers are expected to have persisted the
    /// change already.
    pub async fn patch(&self, id: &str, patch: VideoPatch) -> bool {
        self.cache.patch(id, patch).await
    }

    /// Run a reconciliation pass, then rebuild the cache from the store.
    pub async fn force_reconcile(&self) -> Result<ReloadSummary, CatalogError> {
        let _pass = self.pass_gate.lock().await;
        let reconcile = self.reconciler.run_pass().await?;
        let cache = self.rebuild_cache().await?;
        Ok(ReloadSummary { reconcile, cache })
    }

    /// Rebuild the cache without scanning folders.
    pub async fn refresh_cache(&self) -> Result<CacheRefresh, CatalogError> {
        let _pass = self.pass_gate.lock().await;
        self.rebuild_cache().await
    }

    // Every store and disk access happens before the cache write lock is
    // taken. Patches landing meanwhile are replayed by the cache on replace.
    async fn rebuild_cache(&self) -> Result<CacheRefresh, CatalogError> {
        self.cache.begin_rebuild().await;
        let (videos, marked_missing) = match self.load_live_videos().await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.cache.abandon_rebuild().await;
                return Err(e);
            }
        };

        let cached_videos = videos.len();
        let previous = self.cache.replace(videos).await;
        info!(cached_videos, previous, marked_missing, "video cache replaced");

        Ok(CacheRefresh {
            cached_videos,
            marked_missing,
        })
    }

    /// Live rows whose file is still on disk, plus how many rows were newly
    /// flagged missing.
    async fn load_live_videos(&self) -> Result<(Vec<Video>, usize), CatalogError> {
        let live = self.store.list_videos(VideoFilter::existing()).await?;
        let missing: HashSet<String> =
            missing_files(live.iter().map(|v| (v.id.clone(), v.file_path.clone())))
                .await?
                .into_iter()
                .collect();

        let mut marked_missing = 0;
        for id in &missing {
            match self.store.update_video_exists(id, false).await {
                Ok(true) => marked_missing += 1,
                Ok(false) => {}
                Err(e) => error!(id = %id, error = %e, "cannot mark video missing"),
            }
        }

        let videos = live
            .into_iter()
            .filter(|v| !missing.contains(&v.id))
            .collect();
        Ok((videos, marked_missing))
    }

    /// Persist a watched flag, then queue the matching cache update.
    pub async fn mark_watched(&self, id: &str, watched: bool) -> Result<(), CatalogError> {
        if !self.store.update_video_watched(id, watched).await? {
            return Err(CatalogError::NotFound(format!("video {id}")));
        }
        self.publish(VideoUpdate::watched(id, watched)).await
    }

    /// Queue an update for the cache writer. The change must already be in
    /// the store.
    pub async fn publish(&self, update: VideoUpdate) -> Result<(), CatalogError> {
        self.updates
            .send(update)
            .await
            .map_err(|_| CatalogError::ChannelClosed)
    }

    /// A sender for layers that persist changes themselves.
    pub fn publisher(&self) -> mpsc::Sender<VideoUpdate> {
        self.updates.clone()
    }

    pub async fn open_session(&self, user_id: &str) -> Result<Session, CatalogError> {
        sessions::open_session(self.store.as_ref(), user_id, self.session_lifespan).await
    }

    pub async fn sign_out(&self, user_id: &str) -> Result<u64, CatalogError> {
        sessions::sign_out(self.store.as_ref(), user_id).await
    }

    pub async fn sweep_sessions(&self) -> Result<usize, CatalogError> {
        let now = chrono::Utc::now().timestamp();
        Ok(sessions::sweep_expired(self.store.as_ref(), now).await?)
    }

    pub async fn sample_metrics(&self) -> Result<i64, CatalogError> {
        Ok(self.metrics.sample(self.store.as_ref()).await?)
    }
}
