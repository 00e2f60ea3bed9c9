use mediacat_core::types::{Video, VideoAttributes};
use sqlx::SqlitePool;

type VideoTuple = (String, String, String, i64, i64, String, bool, bool);

const SELECT_COLUMNS: &str = "SELECT id, title, file_path, duration_ms, size_bytes, folder_id, \
     attr_exists, attr_watched FROM video";

fn row_to_video(r: VideoTuple) -> Video {
    Video {
        id: r.0,
        title: r.1,
        file_path: r.2,
        duration_ms: r.3,
        size_bytes: r.4,
        folder_id: r.5,
        attributes: VideoAttributes {
            exists: r.6,
            watched: r.7,
        },
    }
}

pub async fn insert_video(pool: &SqlitePool, video: &Video) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO video (id, title, file_path, duration_ms, size_bytes, folder_id, \
         attr_exists, attr_watched, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&video.id)
    .bind(&video.title)
    .bind(&video.file_path)
    .bind(video.duration_ms)
    .bind(video.size_bytes)
    .bind(&video.folder_id)
    .bind(video.attributes.exists)
    .bind(video.attributes.watched)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_video(pool: &SqlitePool, video_id: &str) -> Result<Option<Video>, sqlx::Error> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row: Option<VideoTuple> = sqlx::query_as(&sql)
        .bind(video_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(row_to_video))
}

pub async fn list_videos(pool: &SqlitePool) -> Result<Vec<Video>, sqlx::Error> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY file_path");
    let rows: Vec<VideoTuple> = sqlx::query_as(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(row_to_video).collect())
}

pub async fn list_videos_by_exists(
    pool: &SqlitePool,
    exists: bool,
) -> Result<Vec<Video>, sqlx::Error> {
    let sql = format!("{SELECT_COLUMNS} WHERE attr_exists = ? ORDER BY file_path");
    let rows: Vec<VideoTuple> = sqlx::query_as(&sql)
        .bind(exists)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(row_to_video).collect())
}

/// Update only the existence column; every other attribute is preserved.
pub async fn set_exists(
    pool: &SqlitePool,
    video_id: &str,
    exists: bool,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("UPDATE video SET attr_exists = ?, updated_ts = ? WHERE id = ?")
        .bind(exists)
        .bind(now)
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_watched(
    pool: &SqlitePool,
    video_id: &str,
    watched: bool,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("UPDATE video SET attr_watched = ?, updated_ts = ? WHERE id = ?")
        .bind(watched)
        .bind(now)
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_duration(
    pool: &SqlitePool,
    video_id: &str,
    duration_ms: i64,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("UPDATE video SET duration_ms = ?, updated_ts = ? WHERE id = ?")
        .bind(duration_ms)
        .bind(now)
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_video(pool: &SqlitePool, video_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM video WHERE id = ?")
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete videos that were never attributed to a folder.
pub async fn delete_orphans(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM video WHERE folder_id = ''")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_videos(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM video")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
