use mediacat_core::types::Session;
use sqlx::SqlitePool;

pub async fn insert_session(pool: &SqlitePool, session: &Session) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO session (id, user_id, created_ts, lifespan_secs) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(session.created_ts)
    .bind(session.lifespan_secs)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_sessions(pool: &SqlitePool) -> Result<Vec<Session>, sqlx::Error> {
    let rows: Vec<(String, String, i64, i64)> =
        sqlx::query_as("SELECT id, user_id, created_ts, lifespan_secs FROM session")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, user_id, created_ts, lifespan_secs)| Session {
            id,
            user_id,
            created_ts,
            lifespan_secs,
        })
        .collect())
}

pub async fn delete_session(pool: &SqlitePool, session_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM session WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop every session of a user (sign-out, or a new login superseding old ones).
pub async fn delete_user_sessions(pool: &SqlitePool, user_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM session WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
