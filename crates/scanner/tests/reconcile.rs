use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mediacat_core::identity;
use mediacat_core::types::{Folder, Video, VideoAttributes};
use mediacat_db::{CatalogStore, SqliteStore, VideoFilter};
use mediacat_probe::{DurationProbe, ProbeError};
use mediacat_scanner::Reconciler;

struct FixedProbe(Duration);

#[async_trait::async_trait]
impl DurationProbe for FixedProbe {
    async fn probe(&self, _file: &Path, _timeout: Duration) -> Result<Duration, ProbeError> {
        Ok(self.0)
    }
}

struct BrokenProbe;

#[async_trait::async_trait]
impl DurationProbe for BrokenProbe {
    async fn probe(&self, _file: &Path, timeout: Duration) -> Result<Duration, ProbeError> {
        Err(ProbeError::TimedOut(timeout))
    }
}

async fn test_store() -> Arc<SqliteStore> {
    let pool = mediacat_db::connect(":memory:").await.unwrap();
    mediacat_db::migrate::run(&pool).await.unwrap();
    Arc::new(SqliteStore::new(pool))
}

async fn add_folder(store: &SqliteStore, path: &Path) -> Folder {
    let path = path.to_string_lossy().into_owned();
    let folder = Folder {
        id: identity::folder_id(&path).unwrap(),
        path,
    };
    store.create_folder(&folder).await.unwrap();
    folder
}

fn reconciler(store: Arc<SqliteStore>, probe: Option<Arc<dyn DurationProbe>>) -> Reconciler {
    Reconciler::new(store, probe, Duration::from_secs(1))
}

fn sparse_file(path: &Path, len: u64) {
    let f = fs::File::create(path).unwrap();
    f.set_len(len).unwrap();
}

#[tokio::test]
async fn end_to_end_media_folder() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store().await;
    add_folder(&store, dir.path()).await;
    let engine = reconciler(store.clone(), None);

    let video_path = dir.path().join("a.mp4");
    let picture_path = dir.path().join("b.jpg");
    sparse_file(&video_path, 10 * 1024 * 1024);
    fs::write(&picture_path, b"jpeg").unwrap();

    let first = engine.run_pass().await.unwrap();
    assert_eq!(first.videos_created, 1);
    assert_eq!(first.pictures_created, 1);

    let videos = store.list_videos(VideoFilter::default()).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert!(videos[0].attributes.exists);
    assert_eq!(videos[0].size_bytes, 10 * 1024 * 1024);
    let video_id = videos[0].id.clone();
    assert_eq!(store.list_pictures().await.unwrap().len(), 1);

    fs::remove_file(&video_path).unwrap();
    let second = engine.run_pass().await.unwrap();
    assert_eq!(second.videos_retired, 1);
    let row = store.find_video(&video_id).await.unwrap().unwrap();
    assert!(!row.attributes.exists);
    assert_eq!(store.list_pictures().await.unwrap().len(), 1);

    fs::remove_file(&picture_path).unwrap();
    let third = engine.run_pass().await.unwrap();
    assert_eq!(third.pictures_removed, 1);
    assert!(store.list_pictures().await.unwrap().is_empty());
    assert!(store.find_video(&video_id).await.unwrap().is_some());
}

#[tokio::test]
async fn second_pass_on_unchanged_tree_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("a.mp4"), b"aaaa").unwrap();
    fs::write(dir.path().join("nested/b.mp4"), b"bb").unwrap();
    fs::write(dir.path().join("nested/c.PNG"), b"png").unwrap();

    let store = test_store().await;
    add_folder(&store, dir.path()).await;
    let engine = reconciler(store.clone(), None);

    let first = engine.run_pass().await.unwrap();
    assert_eq!(first.writes(), 3);

    let second = engine.run_pass().await.unwrap();
    assert_eq!(second.writes(), 0);
    assert_eq!(second.videos_seen, 2);
    assert_eq!(second.pictures_seen, 1);
    assert_eq!(second.errors, 0);
}

#[tokio::test]
async fn restored_video_is_revived_under_same_id() {
    let dir = tempfile::tempdir().unwrap();
    let video_path = dir.path().join("movie.mp4");
    fs::write(&video_path, b"same bytes").unwrap();

    let store = test_store().await;
    add_folder(&store, dir.path()).await;
    let engine = reconciler(store.clone(), None);
    engine.run_pass().await.unwrap();

    let original = store.list_videos(VideoFilter::default()).await.unwrap();
    let id = original[0].id.clone();
    store.update_video_watched(&id, true).await.unwrap();

    fs::remove_file(&video_path).unwrap();
    engine.run_pass().await.unwrap();
    assert!(!store.find_video(&id).await.unwrap().unwrap().attributes.exists);

    fs::write(&video_path, b"same bytes").unwrap();
    let report = engine.run_pass().await.unwrap();
    assert_eq!(report.videos_revived, 1);
    assert_eq!(report.videos_created, 0);

    let all = store.list_videos(VideoFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert!(all[0].attributes.exists);
    assert!(all[0].attributes.watched);
}

#[tokio::test]
async fn changed_size_creates_new_video() {
    let dir = tempfile::tempdir().unwrap();
    let video_path = dir.path().join("movie.mp4");
    fs::write(&video_path, b"short").unwrap();

    let store = test_store().await;
    add_folder(&store, dir.path()).await;
    let engine = reconciler(store.clone(), None);
    engine.run_pass().await.unwrap();

    fs::write(&video_path, b"a good deal longer").unwrap();
    let report = engine.run_pass().await.unwrap();
    assert_eq!(report.videos_created, 1);
    assert_eq!(report.videos_retired, 1);

    let live = store.list_videos(VideoFilter::existing()).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].size_bytes, 18);
    assert_eq!(store.count_videos().await.unwrap(), 2);
}

#[tokio::test]
async fn orphan_videos_are_removed_at_pass_start() {
    let store = test_store().await;
    store
        .create_video(&Video {
            id: "v-orphan".into(),
            title: "lost.mp4".into(),
            file_path: "/nowhere/lost.mp4".into(),
            duration_ms: 0,
            size_bytes: 0,
            folder_id: String::new(),
            attributes: VideoAttributes {
                exists: true,
                watched: false,
            },
        })
        .await
        .unwrap();

    let report = reconciler(store.clone(), None).run_pass().await.unwrap();
    assert_eq!(report.orphans_removed, 1);
    assert!(store.find_video("v-orphan").await.unwrap().is_none());
}

#[tokio::test]
async fn probe_failure_does_not_block_insert() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.mp4"), b"x").unwrap();

    let store = test_store().await;
    add_folder(&store, dir.path()).await;
    let report = reconciler(store.clone(), Some(Arc::new(BrokenProbe)))
        .run_pass()
        .await
        .unwrap();

    assert_eq!(report.videos_created, 1);
    assert_eq!(report.errors, 0);
    let videos = store.list_videos(VideoFilter::default()).await.unwrap();
    assert_eq!(videos[0].duration_ms, 0);
}

#[tokio::test]
async fn probed_duration_is_stored_without_changing_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.mp4");
    fs::write(&path, b"xyz").unwrap();

    let store = test_store().await;
    add_folder(&store, dir.path()).await;
    let engine = reconciler(store.clone(), Some(Arc::new(FixedProbe(Duration::from_secs(90)))));
    engine.run_pass().await.unwrap();

    let videos = store.list_videos(VideoFilter::default()).await.unwrap();
    assert_eq!(videos[0].duration_ms, 90_000);
    assert_eq!(
        videos[0].id,
        identity::video_id(3, 0, &path.to_string_lossy()).unwrap()
    );

    let again = engine.run_pass().await.unwrap();
    assert_eq!(again.writes(), 0);
}

#[tokio::test]
async fn missing_folder_root_retires_its_videos() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("library");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.mp4"), b"x").unwrap();

    let store = test_store().await;
    add_folder(&store, &root).await;
    let engine = reconciler(store.clone(), None);
    engine.run_pass().await.unwrap();

    fs::remove_dir_all(&root).unwrap();
    let report = engine.run_pass().await.unwrap();
    assert_eq!(report.videos_retired, 1);
    assert_eq!(report.folders_scanned, 1);
    assert!(store.list_videos(VideoFilter::existing()).await.unwrap().is_empty());
}
