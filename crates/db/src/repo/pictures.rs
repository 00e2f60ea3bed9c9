use mediacat_core::types::Picture;
use sqlx::SqlitePool;

fn row_to_picture(
    (id, file_path, title, size_bytes, folder_id): (String, String, String, Option<i64>, String),
) -> Picture {
    Picture {
        id,
        file_path,
        title,
        size_bytes,
        folder_id,
    }
}

pub async fn insert_picture(pool: &SqlitePool, picture: &Picture) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO picture (id, file_path, title, size_bytes, folder_id, created_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&picture.id)
    .bind(&picture.file_path)
    .bind(&picture.title)
    .bind(picture.size_bytes)
    .bind(&picture.folder_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_picture(
    pool: &SqlitePool,
    picture_id: &str,
) -> Result<Option<Picture>, sqlx::Error> {
    let row: Option<(String, String, String, Option<i64>, String)> = sqlx::query_as(
        "SELECT id, file_path, title, size_bytes, folder_id FROM picture WHERE id = ?",
    )
    .bind(picture_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_picture))
}

pub async fn list_pictures(pool: &SqlitePool) -> Result<Vec<Picture>, sqlx::Error> {
    let rows: Vec<(String, String, String, Option<i64>, String)> = sqlx::query_as(
        "SELECT id, file_path, title, size_bytes, folder_id FROM picture ORDER BY file_path",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_picture).collect())
}

pub async fn delete_picture(pool: &SqlitePool, picture_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM picture WHERE id = ?")
        .bind(picture_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
