use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mediacat_catalog::{Catalog, events};
use mediacat_core::identity;
use mediacat_core::types::{Folder, Picture, Session, Video};
use mediacat_db::{CatalogStore, DbError, SqliteStore, VideoFilter};
use mediacat_scanner::Reconciler;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Store that can hold the next video listing until the test releases it,
/// leaving a window between the read and the cache swap.
struct GatedStore {
    inner: SqliteStore,
    hold_next_list: AtomicBool,
    listed: Notify,
    release: Notify,
}

impl GatedStore {
    fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            hold_next_list: AtomicBool::new(false),
            listed: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl CatalogStore for GatedStore {
    async fn list_folders(&self) -> Result<Vec<Folder>, DbError> {
        self.inner.list_folders().await
    }
    async fn find_folder_by_path(&self, path: &str) -> Result<Option<Folder>, DbError> {
        self.inner.find_folder_by_path(path).await
    }
    async fn create_folder(&self, folder: &Folder) -> Result<(), DbError> {
        self.inner.create_folder(folder).await
    }
    async fn delete_folder(&self, folder_id: &str) -> Result<bool, DbError> {
        self.inner.delete_folder(folder_id).await
    }

    async fn find_video(&self, video_id: &str) -> Result<Option<Video>, DbError> {
        self.inner.find_video(video_id).await
    }
    async fn list_videos(&self, filter: VideoFilter) -> Result<Vec<Video>, DbError> {
        let rows = self.inner.list_videos(filter).await?;
        if self.hold_next_list.swap(false, Ordering::SeqCst) {
            self.listed.notify_one();
            self.release.notified().await;
        }
        Ok(rows)
    }
    async fn create_video(&self, video: &Video) -> Result<(), DbError> {
        self.inner.create_video(video).await
    }
    async fn update_video_exists(&self, video_id: &str, exists: bool) -> Result<bool, DbError> {
        self.inner.update_video_exists(video_id, exists).await
    }
    async fn update_video_watched(&self, video_id: &str, watched: bool) -> Result<bool, DbError> {
        self.inner.update_video_watched(video_id, watched).await
    }
    async fn update_video_duration(
        &self,
        video_id: &str,
        duration_ms: i64,
    ) -> Result<bool, DbError> {
        self.inner.update_video_duration(video_id, duration_ms).await
    }
    async fn delete_video(&self, video_id: &str) -> Result<bool, DbError> {
        self.inner.delete_video(video_id).await
    }
    async fn delete_orphan_videos(&self) -> Result<u64, DbError> {
        self.inner.delete_orphan_videos().await
    }
    async fn count_videos(&self) -> Result<i64, DbError> {
        self.inner.count_videos().await
    }

    async fn find_picture(&self, picture_id: &str) -> Result<Option<Picture>, DbError> {
        self.inner.find_picture(picture_id).await
    }
    async fn list_pictures(&self) -> Result<Vec<Picture>, DbError> {
        self.inner.list_pictures().await
    }
    async fn create_picture(&self, picture: &Picture) -> Result<(), DbError> {
        self.inner.create_picture(picture).await
    }
    async fn delete_picture(&self, picture_id: &str) -> Result<bool, DbError> {
        self.inner.delete_picture(picture_id).await
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, DbError> {
        self.inner.list_sessions().await
    }
    async fn create_session(&self, session: &Session) -> Result<(), DbError> {
        self.inner.create_session(session).await
    }
    async fn delete_session(&self, session_id: &str) -> Result<bool, DbError> {
        self.inner.delete_session(session_id).await
    }
    async fn delete_user_sessions(&self, user_id: &str) -> Result<u64, DbError> {
        self.inner.delete_user_sessions(user_id).await
    }
}

async fn gated_catalog(
    dir: &std::path::Path,
) -> (Arc<GatedStore>, Arc<Catalog>, tokio::sync::mpsc::Receiver<events::VideoUpdate>) {
    let pool = mediacat_db::connect(":memory:").await.unwrap();
    mediacat_db::migrate::run(&pool).await.unwrap();
    let store = Arc::new(GatedStore::new(SqliteStore::new(pool)));
    let path = dir.to_string_lossy().into_owned();
    store
        .create_folder(&Folder {
            id: identity::folder_id(&path).unwrap(),
            path,
        })
        .await
        .unwrap();

    let (catalog, rx) = Catalog::new(Reconciler::new(store.clone(), None, Duration::from_secs(1)));
    let catalog = Arc::new(catalog);
    catalog.force_reconcile().await.unwrap();
    (store, catalog, rx)
}

#[tokio::test]
async fn watched_update_during_refresh_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.mp4"), b"aaaa").unwrap();
    let (store, catalog, rx) = gated_catalog(dir.path()).await;
    let id = catalog.snapshot().await[0].id.clone();

    let cancel = CancellationToken::new();
    let writer = tokio::spawn(events::run_cache_writer(
        catalog.cache().clone(),
        rx,
        cancel.clone(),
    ));

    store.hold_next_list.store(true, Ordering::SeqCst);
    let refresh = tokio::spawn({
        let catalog = catalog.clone();
        async move { catalog.refresh_cache().await }
    });
    store.listed.notified().await;

    // The refresh already holds rows with watched=false.
    catalog.mark_watched(&id, true).await.unwrap();
    let mut applied = false;
    for _ in 0..100 {
        if catalog.find_cached(&id).await.unwrap().attributes.watched {
            applied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(applied, "writer never applied the update");

    store.release.notify_one();
    refresh.await.unwrap().unwrap();

    let persisted = store.find_video(&id).await.unwrap().unwrap();
    let cached = catalog.find_cached(&id).await.unwrap();
    assert!(persisted.attributes.watched);
    assert_eq!(cached.attributes.watched, persisted.attributes.watched);

    cancel.cancel();
    writer.await.unwrap();
}

#[tokio::test]
async fn refresh_counts_only_rows_it_flagged() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.mp4"), b"a").unwrap();
    fs::write(dir.path().join("b.mp4"), b"b").unwrap();
    let (store, catalog, _rx) = gated_catalog(dir.path()).await;
    let snap = catalog.snapshot().await;
    assert_eq!(snap.len(), 2);
    let gone = snap.iter().find(|v| v.title == "a.mp4").unwrap().id.clone();

    fs::remove_file(dir.path().join("a.mp4")).unwrap();
    fs::remove_file(dir.path().join("b.mp4")).unwrap();

    store.hold_next_list.store(true, Ordering::SeqCst);
    let refresh = tokio::spawn({
        let catalog = catalog.clone();
        async move { catalog.refresh_cache().await }
    });
    store.listed.notified().await;
    // Row disappears after it was listed, so flagging it touches nothing.
    assert!(store.delete_video(&gone).await.unwrap());
    store.release.notify_one();

    let refreshed = refresh.await.unwrap().unwrap();
    assert_eq!(refreshed.marked_missing, 1);
    assert_eq!(refreshed.cached_videos, 0);
}
