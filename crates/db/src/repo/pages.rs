use mediacat_core::identity;
use mediacat_core::types::Page;
use sqlx::SqlitePool;
use tracing::warn;

const DEFAULT_PAGES: &[(&str, &str, bool)] = &[
    ("Login", "/login", false),
    ("Logout", "/logout", true),
    ("Gallery", "/gallery", true),
    ("OpenApi", "/oapi/scalar", true),
    ("GraphQL", "/gql/playground", true),
];

/// Insert the built-in pages. Existing rows are left alone.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (title, url, auth_required) in DEFAULT_PAGES {
        let id = match identity::page_id(url) {
            Ok(id) => id,
            Err(e) => {
                warn!(url, error = %e, "skipping page without id");
                continue;
            }
        };
        sqlx::query(
            "INSERT INTO page (id, title, url, auth_required) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&id)
        .bind(title)
        .bind(url)
        .bind(auth_required)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn list_pages(
    pool: &SqlitePool,
    auth_required: Option<bool>,
) -> Result<Vec<Page>, sqlx::Error> {
    let rows: Vec<(String, String, String, bool)> = match auth_required {
        Some(flag) => {
            sqlx::query_as(
                "SELECT id, title, url, auth_required FROM page WHERE auth_required = ? ORDER BY title",
            )
            .bind(flag)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT id, title, url, auth_required FROM page ORDER BY title")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows
        .into_iter()
        .map(|(id, title, url, auth_required)| Page {
            id,
            title,
            url,
            auth_required,
        })
        .collect())
}
