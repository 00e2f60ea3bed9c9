use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mediacat_core::types::{Folder, Picture, Video};
use mediacat_db::{CatalogStore, DbError, VideoFilter};
use mediacat_probe::DurationProbe;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::walk::{self, ScanCandidate};

/// Counters for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub folders_scanned: usize,
    pub orphans_removed: u64,
    pub videos_seen: usize,
    pub videos_created: usize,
    pub videos_revived: usize,
    pub videos_retired: usize,
    pub pictures_seen: usize,
    pub pictures_created: usize,
    pub pictures_removed: usize,
    pub errors: usize,
}

impl ReconcileReport {
    /// Number of store writes performed by the pass.
    pub fn writes(&self) -> usize {
        self.orphans_removed as usize
            + self.videos_created
            + self.videos_revived
            + self.videos_retired
            + self.pictures_created
            + self.pictures_removed
    }
}

/// What reconciling a single scanned video did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    Created,
    Revived,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureOutcome {
    Created,
    Unchanged,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("scan task failed: {0}")]
    Task(String),
}

/// Aligns the persisted store with what is on disk.
///
/// Videos are soft-deleted (`exists = false`) so watch state survives a file
/// going missing; pictures are hard-deleted.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    probe: Option<Arc<dyn DurationProbe>>,
    probe_timeout: Duration,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        probe: Option<Arc<dyn DurationProbe>>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            store,
            probe,
            probe_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Run a full pass over every persisted folder.
    ///
    /// Only failing to list folders aborts the pass. Every other store error is
    /// logged, counted, and the pass moves on to the next entity.
    pub async fn run_pass(&self) -> Result<ReconcileReport, ScanError> {
        let mut report = ReconcileReport::default();

        match self.store.delete_orphan_videos().await {
            Ok(0) => {}
            Ok(n) => {
                info!(removed = n, "removed videos without a folder");
                report.orphans_removed = n;
            }
            Err(e) => {
                error!(error = %e, "orphan cleanup failed");
                report.errors += 1;
            }
        }

        let folders = self.store.list_folders().await?;
        let mut seen_videos: HashSet<String> = HashSet::new();

        for folder in &folders {
            let candidates = self.scan(folder).await?;
            report.folders_scanned += 1;
            debug!(
                folder_id = %folder.id,
                path = %folder.path,
                candidates = candidates.len(),
                "folder scanned"
            );

            for candidate in candidates {
                match candidate {
                    ScanCandidate::Video(video) => {
                        report.videos_seen += 1;
                        seen_videos.insert(video.id.clone());
                        match self.reconcile_video(video).await {
                            Ok(VideoOutcome::Created) => report.videos_created += 1,
                            Ok(VideoOutcome::Revived) => report.videos_revived += 1,
                            Ok(VideoOutcome::Unchanged) => {}
                            Err(e) => {
                                error!(error = %e, "video reconciliation failed");
                                report.errors += 1;
                            }
                        }
                    }
                    ScanCandidate::Picture(picture) => {
                        report.pictures_seen += 1;
                        match self.reconcile_picture(picture).await {
                            Ok(PictureOutcome::Created) => report.pictures_created += 1,
                            Ok(PictureOutcome::Unchanged) => {}
                            Err(e) => {
                                error!(error = %e, "picture reconciliation failed");
                                report.errors += 1;
                            }
                        }
                    }
                }
            }
        }

        self.retire_unseen_videos(&seen_videos, &mut report).await;
        self.prune_missing_pictures(&mut report).await;

        info!(
            folders = report.folders_scanned,
            created = report.videos_created,
            revived = report.videos_revived,
            retired = report.videos_retired,
            pictures_created = report.pictures_created,
            pictures_removed = report.pictures_removed,
            errors = report.errors,
            "reconciliation pass complete"
        );
        Ok(report)
    }

    /// Walk a folder on the blocking pool and collect its candidates.
    pub async fn scan(&self, folder: &Folder) -> Result<Vec<ScanCandidate>, ScanError> {
        let root = PathBuf::from(&folder.path);
        let origin_id = folder.id.clone();
        tokio::task::spawn_blocking(move || walk::scan_folder(&root, &origin_id).collect())
            .await
            .map_err(|e| ScanError::Task(e.to_string()))
    }

    /// Insert an unseen video, or flip `exists` back on for a known one.
    pub async fn reconcile_video(&self, mut video: Video) -> Result<VideoOutcome, DbError> {
        match self.store.find_video(&video.id).await? {
            None => {
                self.enrich_duration(&mut video).await;
                self.store.create_video(&video).await?;
                info!(id = %video.id, title = %video.title, "video created");
                Ok(VideoOutcome::Created)
            }
            Some(existing) if !existing.attributes.exists => {
                self.store.update_video_exists(&existing.id, true).await?;
                info!(id = %existing.id, "video exists again");
                Ok(VideoOutcome::Revived)
            }
            Some(_) => Ok(VideoOutcome::Unchanged),
        }
    }

    pub async fn reconcile_picture(&self, picture: Picture) -> Result<PictureOutcome, DbError> {
        if self.store.find_picture(&picture.id).await?.is_some() {
            return Ok(PictureOutcome::Unchanged);
        }
        self.store.create_picture(&picture).await?;
        debug!(id = %picture.id, path = %picture.file_path, "picture created");
        Ok(PictureOutcome::Created)
    }

    /// Fill in the duration through the probe. Failure leaves it at zero.
    /// The id is not re-derived: it was fixed at scan time.
    pub async fn enrich_duration(&self, video: &mut Video) {
        let Some(probe) = &self.probe else {
            return;
        };
        match probe
            .probe(Path::new(&video.file_path), self.probe_timeout)
            .await
        {
            Ok(duration) => {
                video.duration_ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
            }
            Err(e) => {
                warn!(id = %video.id, file = %video.file_path, error = %e, "duration probe failed");
            }
        }
    }

    async fn retire_unseen_videos(&self, seen: &HashSet<String>, report: &mut ReconcileReport) {
        let live = match self.store.list_videos(VideoFilter::existing()).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "cannot list videos to retire");
                report.errors += 1;
                return;
            }
        };

        for video in live.iter().filter(|v| !seen.contains(&v.id)) {
            match self.store.update_video_exists(&video.id, false).await {
                Ok(_) => {
                    info!(id = %video.id, file = %video.file_path, "video no longer on disk");
                    report.videos_retired += 1;
                }
                Err(e) => {
                    error!(id = %video.id, error = %e, "cannot mark video missing");
                    report.errors += 1;
                }
            }
        }
    }

    async fn prune_missing_pictures(&self, report: &mut ReconcileReport) {
        let pictures = match self.store.list_pictures().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "cannot list pictures to prune");
                report.errors += 1;
                return;
            }
        };

        let missing = match missing_files(pictures.into_iter().map(|p| (p.id, p.file_path))).await
        {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "picture stat task failed");
                report.errors += 1;
                return;
            }
        };

        for id in missing {
            match self.store.delete_picture(&id).await {
                Ok(_) => {
                    debug!(id = %id, "picture removed");
                    report.pictures_removed += 1;
                }
                Err(e) => {
                    error!(id = %id, error = %e, "cannot delete picture");
                    report.errors += 1;
                }
            }
        }
    }
}

/// Ids whose path no longer stats, checked on the blocking pool.
pub async fn missing_files<I>(entries: I) -> Result<Vec<String>, ScanError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let entries: Vec<(String, String)> = entries.into_iter().collect();
    tokio::task::spawn_blocking(move || {
        entries
            .into_iter()
            .filter(|(_, path)| std::fs::symlink_metadata(path).is_err())
            .map(|(id, _)| id)
            .collect()
    })
    .await
    .map_err(|e| ScanError::Task(e.to_string()))
}
