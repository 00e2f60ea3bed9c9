use mediacat_core::types::Folder;
use sqlx::SqlitePool;

pub async fn insert_folder(pool: &SqlitePool, folder: &Folder) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query("INSERT INTO folder (id, path, created_ts) VALUES (?, ?, ?)")
        .bind(&folder.id)
        .bind(&folder.path)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_folders(pool: &SqlitePool) -> Result<Vec<Folder>, sqlx::Error> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT id, path FROM folder ORDER BY path")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, path)| Folder { id, path })
        .collect())
}

pub async fn find_by_path(pool: &SqlitePool, path: &str) -> Result<Option<Folder>, sqlx::Error> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id, path FROM folder WHERE path = ?")
            .bind(path)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id, path)| Folder { id, path }))
}

pub async fn delete_folder(pool: &SqlitePool, folder_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM folder WHERE id = ?")
        .bind(folder_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
