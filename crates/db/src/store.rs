//! The persisted-store seam consumed by the scanner and catalog crates.
//!
//! Every method is its own unit of work. Nothing here opens a transaction that
//! spans several entities, so a reconciliation pass can be observed mid-flight.

use async_trait::async_trait;
use mediacat_core::types::{Folder, Picture, Session, Video};
use sqlx::SqlitePool;

use crate::DbError;
use crate::repo::{folders, pictures, sessions, videos};

/// Row filter for video listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub exists: Option<bool>,
}

impl VideoFilter {
    pub fn existing() -> Self {
        Self { exists: Some(true) }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_folders(&self) -> Result<Vec<Folder>, DbError>;
    async fn find_folder_by_path(&self, path: &str) -> Result<Option<Folder>, DbError>;
    async fn create_folder(&self, folder: &Folder) -> Result<(), DbError>;
    async fn delete_folder(&self, folder_id: &str) -> Result<bool, DbError>;

    async fn find_video(&self, video_id: &str) -> Result<Option<Video>, DbError>;
    async fn list_videos(&self, filter: VideoFilter) -> Result<Vec<Video>, DbError>;
    async fn create_video(&self, video: &Video) -> Result<(), DbError>;
    async fn update_video_exists(&self, video_id: &str, exists: bool) -> Result<bool, DbError>;
    async fn update_video_watched(&self, video_id: &str, watched: bool) -> Result<bool, DbError>;
    async fn update_video_duration(
        &self,
        video_id: &str,
        duration_ms: i64,
    ) -> Result<bool, DbError>;
    async fn delete_video(&self, video_id: &str) -> Result<bool, DbError>;
    async fn delete_orphan_videos(&self) -> Result<u64, DbError>;
    async fn count_videos(&self) -> Result<i64, DbError>;

    async fn find_picture(&self, picture_id: &str) -> Result<Option<Picture>, DbError>;
    async fn list_pictures(&self) -> Result<Vec<Picture>, DbError>;
    async fn create_picture(&self, picture: &Picture) -> Result<(), DbError>;
    async fn delete_picture(&self, picture_id: &str) -> Result<bool, DbError>;

    async fn list_sessions(&self) -> Result<Vec<Session>, DbError>;
    async fn create_session(&self, session: &Session) -> Result<(), DbError>;
    async fn delete_session(&self, session_id: &str) -> Result<bool, DbError>;
    async fn delete_user_sessions(&self, user_id: &str) -> Result<u64, DbError>;
}

/// `CatalogStore` backed by the SQLite repositories.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn list_folders(&self) -> Result<Vec<Folder>, DbError> {
        Ok(folders::list_folders(&self.pool).await?)
    }

    async fn find_folder_by_path(&self, path: &str) -> Result<Option<Folder>, DbError> {
        Ok(folders::find_by_path(&self.pool, path).await?)
    }

    async fn create_folder(&self, folder: &Folder) -> Result<(), DbError> {
        Ok(folders::insert_folder(&self.pool, folder).await?)
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<bool, DbError> {
        Ok(folders::delete_folder(&self.pool, folder_id).await?)
    }

    async fn find_video(&self, video_id: &str) -> Result<Option<Video>, DbError> {
        Ok(videos::get_video(&self.pool, video_id).await?)
    }

    async fn list_videos(&self, filter: VideoFilter) -> Result<Vec<Video>, DbError> {
        let rows = match filter.exists {
            Some(exists) => videos::list_videos_by_exists(&self.pool, exists).await?,
            None => videos::list_videos(&self.pool).await?,
        };
        Ok(rows)
    }

    async fn create_video(&self, video: &Video) -> Result<(), DbError> {
        Ok(videos::insert_video(&self.pool, video).await?)
    }

    async fn update_video_exists(&self, video_id: &str, exists: bool) -> Result<bool, DbError> {
        Ok(videos::set_exists(&self.pool, video_id, exists).await?)
    }

    async fn update_video_watched(&self, video_id: &str, watched: bool) -> Result<bool, DbError> {
        Ok(videos::set_watched(&self.pool, video_id, watched).await?)
    }

    async fn update_video_duration(
        &self,
        video_id: &str,
        duration_ms: i64,
    ) -> Result<bool, DbError> {
        Ok(videos::set_duration(&self.pool, video_id, duration_ms).await?)
    }

    async fn delete_video(&self, video_id: &str) -> Result<bool, DbError> {
        Ok(videos::delete_video(&self.pool, video_id).await?)
    }

    async fn delete_orphan_videos(&self) -> Result<u64, DbError> {
        Ok(videos::delete_orphans(&self.pool).await?)
    }

    async fn count_videos(&self) -> Result<i64, DbError> {
        Ok(videos::count_videos(&self.pool).await?)
    }

    async fn find_picture(&self, picture_id: &str) -> Result<Option<Picture>, DbError> {
        Ok(pictures::get_picture(&self.pool, picture_id).await?)
    }

    async fn list_pictures(&self) -> Result<Vec<Picture>, DbError> {
        Ok(pictures::list_pictures(&self.pool).await?)
    }

    async fn create_picture(&self, picture: &Picture) -> Result<(), DbError> {
        Ok(pictures::insert_picture(&self.pool, picture).await?)
    }

    async fn delete_picture(&self, picture_id: &str) -> Result<bool, DbError> {
        Ok(pictures::delete_picture(&self.pool, picture_id).await?)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, DbError> {
        Ok(sessions::list_sessions(&self.pool).await?)
    }

    async fn create_session(&self, session: &Session) -> Result<(), DbError> {
        Ok(sessions::insert_session(&self.pool, session).await?)
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, DbError> {
        Ok(sessions::delete_session(&self.pool, session_id).await?)
    }

    async fn delete_user_sessions(&self, user_id: &str) -> Result<u64, DbError> {
        Ok(sessions::delete_user_sessions(&self.pool, user_id).await?)
    }
}
