use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediacat_catalog::CatalogError;
use mediacat_core::error::{ApiError, ErrorEnvelope};
use mediacat_db::DbError;
use tracing::error;

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        let api = match e {
            CatalogError::NotFound(msg) => ApiError::NotFound(msg),
            CatalogError::Conflict(msg) => ApiError::Conflict(msg),
            CatalogError::Invalid(msg) => ApiError::BadRequest(msg),
            CatalogError::Identity(e) => ApiError::BadRequest(e.to_string()),
            other => {
                error!(error = %other, "catalog operation failed");
                ApiError::Internal(other.to_string())
            }
        };
        Self(api)
    }
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        error!(error = %e, "store operation failed");
        Self(ApiError::Internal(e.to_string()))
    }
}
