//! One-shot ingestion commands for an administrative front end.

use std::path::Path;

use mediacat_core::identity;
use mediacat_core::types::{Folder, Video, VideoAttributes};
use mediacat_db::{CatalogStore, VideoFilter};
use mediacat_scanner::media;
use mediacat_scanner::reconcile::{PictureOutcome, VideoOutcome, missing_files};
use mediacat_scanner::{Reconciler, ScanCandidate};
use serde::Serialize;
use tracing::{error, info};

use crate::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub folder: Folder,
    pub videos_created: usize,
    pub pictures_created: usize,
    pub already_known: usize,
    pub errors: usize,
}

/// Register `path` as a folder and ingest everything currently below it.
pub async fn add_folder(
    reconciler: &Reconciler,
    path: &str,
) -> Result<IngestReport, CatalogError> {
    let path = absolute(Path::new(path)).await?;
    let path = path.as_str();
    let store = reconciler.store();
    if store.find_folder_by_path(path).await?.is_some() {
        return Err(CatalogError::Conflict(format!("folder {path} already registered")));
    }
    if !is_readable_dir(path).await {
        return Err(CatalogError::Invalid(format!("{path} is not a readable directory")));
    }

    let folder = Folder {
        id: identity::folder_id(path)?,
        path: path.to_string(),
    };
    store.create_folder(&folder).await?;
    info!(id = %folder.id, path = %folder.path, "folder added");

    let mut report = IngestReport {
        folder,
        videos_created: 0,
        pictures_created: 0,
        already_known: 0,
        errors: 0,
    };

    for candidate in reconciler.scan(&report.folder).await? {
        let outcome = match candidate {
            ScanCandidate::Video(video) => reconciler.reconcile_video(video).await.map(|o| match o {
                VideoOutcome::Created => report.videos_created += 1,
                VideoOutcome::Revived | VideoOutcome::Unchanged => report.already_known += 1,
            }),
            ScanCandidate::Picture(picture) => {
                reconciler.reconcile_picture(picture).await.map(|o| match o {
                    PictureOutcome::Created => report.pictures_created += 1,
                    PictureOutcome::Unchanged => report.already_known += 1,
                })
            }
        };
        if let Err(e) = outcome {
            error!(error = %e, "ingest failed for candidate");
            report.errors += 1;
        }
    }

    info!(
        id = %report.folder.id,
        videos = report.videos_created,
        pictures = report.pictures_created,
        "folder ingested"
    );
    Ok(report)
}

/// Unregister a folder. Its videos are retired by the next pass.
pub async fn remove_folder(store: &dyn CatalogStore, folder_id: &str) -> Result<(), CatalogError> {
    if !store.delete_folder(folder_id).await? {
        return Err(CatalogError::NotFound(format!("folder {folder_id}")));
    }
    info!(id = %folder_id, "folder removed");
    Ok(())
}

/// Ingest a single video file. Its parent directory becomes its folder and is
/// registered when unknown.
pub async fn add_video(reconciler: &Reconciler, file_path: &str) -> Result<Video, CatalogError> {
    let file_path = absolute_file(file_path).await?;
    let file_path = file_path.as_str();
    let path = Path::new(file_path);
    let meta = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| CatalogError::Invalid(format!("{file_path}: {e}")))?;
    if meta.is_dir() {
        return Err(CatalogError::Invalid(format!("{file_path} is a directory")));
    }
    if !media::is_video_file(file_path) {
        return Err(CatalogError::Invalid(format!("{file_path} is not an mp4 file")));
    }

    let store = reconciler.store();
    let folder_path = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folder = match store.find_folder_by_path(&folder_path).await? {
        Some(folder) => folder,
        None => {
            let folder = Folder {
                id: identity::folder_id(&folder_path)?,
                path: folder_path,
            };
            store.create_folder(&folder).await?;
            folder
        }
    };

    let size_bytes = meta.len() as i64;
    let mut video = Video {
        id: identity::video_id(size_bytes, 0, file_path)?,
        title: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_path: file_path.to_string(),
        duration_ms: 0,
        size_bytes,
        folder_id: folder.id,
        attributes: VideoAttributes {
            exists: true,
            watched: false,
        },
    };
    if store.find_video(&video.id).await?.is_some() {
        return Err(CatalogError::Conflict(format!("video {} already exists", video.id)));
    }

    reconciler.enrich_duration(&mut video).await;
    store.create_video(&video).await?;
    info!(id = %video.id, file = %video.file_path, "video added");
    Ok(video)
}

/// Probe every live video still lacking a duration and store the result.
/// Videos the probe cannot read keep a zero duration.
pub async fn backfill_durations(reconciler: &Reconciler) -> Result<usize, CatalogError> {
    let store = reconciler.store();
    let pending = store.list_videos(VideoFilter::existing()).await?;
    let mut updated = 0;

    for mut video in pending.into_iter().filter(|v| v.duration_ms == 0) {
        reconciler.enrich_duration(&mut video).await;
        if video.duration_ms == 0 {
            continue;
        }
        if store
            .update_video_duration(&video.id, video.duration_ms)
            .await?
        {
            updated += 1;
        }
    }

    info!(updated, "durations backfilled");
    Ok(updated)
}

/// Videos whose file can no longer be found, regardless of their flag.
pub async fn find_missing_videos(store: &dyn CatalogStore) -> Result<Vec<Video>, CatalogError> {
    let videos = store.list_videos(VideoFilter::default()).await?;
    let missing = missing_files(videos.iter().map(|v| (v.id.clone(), v.file_path.clone()))).await?;
    Ok(videos
        .into_iter()
        .filter(|v| missing.contains(&v.id))
        .collect())
}

/// Hard-delete the given videos. Returns how many rows went away.
pub async fn delete_videos(
    store: &dyn CatalogStore,
    videos: &[Video],
) -> Result<usize, CatalogError> {
    let mut deleted = 0;
    for video in videos {
        if store.delete_video(&video.id).await? {
            info!(id = %video.id, file = %video.file_path, "video deleted");
            deleted += 1;
        }
    }
    Ok(deleted)
}

/// Resolve `path` against the working directory, dropping `.` and `..`
/// components and following links.
async fn absolute(path: &Path) -> Result<String, CatalogError> {
    let resolved = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| CatalogError::Invalid(format!("{}: {e}", path.display())))?;
    resolved
        .into_os_string()
        .into_string()
        .map_err(|p| CatalogError::Invalid(format!("{} is not valid UTF-8", p.to_string_lossy())))
}

/// Like [`absolute`] for the parent directory only. The file name is kept as
/// given, so a linked file keeps the path a folder walk would report.
async fn absolute_file(file_path: &str) -> Result<String, CatalogError> {
    let path = Path::new(file_path);
    let name = path
        .file_name()
        .ok_or_else(|| CatalogError::Invalid(format!("{file_path} does not name a file")))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let dir = absolute(parent).await?;
    Ok(Path::new(&dir).join(name).to_string_lossy().into_owned())
}

async fn is_readable_dir(path: &str) -> bool {
    tokio::fs::read_dir(path).await.is_ok()
}
