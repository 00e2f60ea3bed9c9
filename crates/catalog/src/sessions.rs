//! Login session lifecycle: issuing tokens and sweeping expired ones.

use std::time::Duration;

use mediacat_core::types::Session;
use mediacat_db::{CatalogStore, DbError};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{debug, error, info, warn};

use crate::CatalogError;

pub const TOKEN_LEN: usize = 32;

/// Default lifetime of a freshly issued session.
pub const DEFAULT_LIFESPAN: Duration = Duration::from_secs(60 * 60);

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn new_session(
    user_id: &str,
    lifespan: Duration,
    now_ts: i64,
) -> Result<Session, CatalogError> {
    if user_id.trim().is_empty() {
        return Err(CatalogError::Invalid("user id must not be empty".into()));
    }
    Ok(Session {
        id: generate_token(),
        user_id: user_id.to_string(),
        created_ts: now_ts,
        lifespan_secs: lifespan.as_secs() as i64,
    })
}

/// Issue a session for `user_id`, dropping any session the user already had.
pub async fn open_session(
    store: &dyn CatalogStore,
    user_id: &str,
    lifespan: Duration,
) -> Result<Session, CatalogError> {
    let session = new_session(user_id, lifespan, chrono::Utc::now().timestamp())?;
    let superseded = store.delete_user_sessions(user_id).await?;
    if superseded > 0 {
        debug!(user_id, superseded, "previous sessions replaced");
    }
    store.create_session(&session).await?;
    info!(user_id, "session opened");
    Ok(session)
}

/// Remove every session of `user_id`. Returns how many were removed.
pub async fn sign_out(store: &dyn CatalogStore, user_id: &str) -> Result<u64, CatalogError> {
    let removed = store.delete_user_sessions(user_id).await?;
    info!(user_id, removed, "signed out");
    Ok(removed)
}

/// Delete every session that expired strictly before `now_ts`.
///
/// A failed delete is logged and skipped; the sweep only fails if the
/// session list cannot be read.
pub async fn sweep_expired(store: &dyn CatalogStore, now_ts: i64) -> Result<usize, DbError> {
    let sessions = store.list_sessions().await?;
    let mut removed = 0;

    for session in sessions.iter().filter(|s| s.is_expired(now_ts)) {
        match store.delete_session(&session.id).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => error!(user_id = %session.user_id, error = %e, "cannot delete session"),
        }
    }

    if removed > 0 {
        warn!(removed, "expired sessions removed");
    }
    Ok(removed)
}
