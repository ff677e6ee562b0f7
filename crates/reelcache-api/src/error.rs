//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; any
//! `AppError` (or type converting into one) renders consistently as a
//! status code plus a JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reelcache_core::AppError;
use reelcache_storage::StoreError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse. Needed because of
/// Rust's orphan rules: IntoResponse is external and AppError lives in
/// reelcache-core.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<StoreError> for HttpAppError {
    fn from(err: StoreError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::Download(_)
        | AppError::CacheWrite(_)
        | AppError::CacheRead(_)
        | AppError::Config(_)
        | AppError::Internal(_)
        | AppError::InternalWithSource { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.0.error_code(), "Request rejected");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.error_code().to_string(),
            error_type: Some(self.0.error_type().to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let err = AppError::Upstream("scraper down".to_string());
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("no entry".to_string());
        assert_eq!(status_for(&err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_errors_convert_through_the_taxonomy() {
        let http: HttpAppError = StoreError::Corrupt("bad json".to_string()).into();
        assert!(matches!(http.0, AppError::CacheRead(_)));
    }
}
