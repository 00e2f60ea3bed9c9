use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mediacat_catalog::admin::{self, IngestReport};
use mediacat_catalog::metrics::MetricsSnapshot;
use mediacat_catalog::ReloadSummary;
use mediacat_core::error::ApiError;
use mediacat_core::types::{Folder, Page, Picture, Video};
use mediacat_db::repo::pages;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Cached videos
        .route("/videos", get(list_videos))
        .route("/videos/{id}", get(get_video))
        .route("/videos/{id}/watched", post(set_watched))
        .route("/reload-data", get(reload_data).post(reload_data))
        // Library administration
        .route("/folders", get(list_folders).post(add_folder))
        .route("/folders/{id}", delete(remove_folder))
        .route("/pictures", get(list_pictures))
        .route("/pages", get(list_pages))
        .route("/metrics", get(metrics))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    cached_videos: usize,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        cached_videos: state.catalog.cache().len().await,
    }))
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

async fn list_videos(State(state): State<AppState>) -> Json<Vec<Video>> {
    let snapshot = state.catalog.snapshot().await;
    Json(snapshot.as_ref().clone())
}

async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Video>, AppError> {
    state
        .catalog
        .find_cached(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("video {id}")).into())
}

#[derive(Deserialize)]
struct WatchedRequest {
    watched: bool,
}

#[derive(Serialize)]
struct WatchedResponse {
    id: String,
    watched: bool,
}

async fn set_watched(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<WatchedRequest>,
) -> Result<Json<WatchedResponse>, AppError> {
    state.catalog.mark_watched(&id, body.watched).await?;
    Ok(Json(WatchedResponse {
        id,
        watched: body.watched,
    }))
}

async fn reload_data(State(state): State<AppState>) -> Result<Json<ReloadSummary>, AppError> {
    let summary = state.catalog.force_reconcile().await?;
    Ok(Json(summary))
}

// ---------------------------------------------------------------------------
// Library administration
// ---------------------------------------------------------------------------

async fn list_folders(State(state): State<AppState>) -> Result<Json<Vec<Folder>>, AppError> {
    Ok(Json(state.catalog.store().list_folders().await?))
}

#[derive(Deserialize)]
struct AddFolderRequest {
    path: String,
}

async fn add_folder(
    State(state): State<AppState>,
    Json(body): Json<AddFolderRequest>,
) -> Result<(StatusCode, Json<IngestReport>), AppError> {
    let path = body.path.trim();
    if path.is_empty() {
        return Err(ApiError::BadRequest("path must not be empty".into()).into());
    }
    let report = admin::add_folder(state.catalog.reconciler(), path).await?;
    state.catalog.refresh_cache().await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn remove_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    admin::remove_folder(state.catalog.store().as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_pictures(State(state): State<AppState>) -> Result<Json<Vec<Picture>>, AppError> {
    Ok(Json(state.catalog.store().list_pictures().await?))
}

#[derive(Deserialize)]
struct PagesQuery {
    auth_required: Option<bool>,
}

async fn list_pages(
    State(state): State<AppState>,
    Query(q): Query<PagesQuery>,
) -> Result<Json<Vec<Page>>, AppError> {
    let rows = pages::list_pages(&state.db, q.auth_required)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(rows))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.catalog.metrics().snapshot())
}
