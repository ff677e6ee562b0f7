//! Reel fetch, lookup, and admin-delete handlers.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use reelcache_core::{AppError, ReelRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct FetchReelRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ReelResponse {
    #[serde(flatten)]
    pub record: ReelRecord,
    pub from_cache: bool,
    /// Playable location for the cached copy, when one exists. A signed
    /// URL on the hybrid backend, a filesystem path on the local one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_video_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoUrlResponse {
    pub reel_id: String,
    pub video_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteReelQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteReelResponse {
    pub reel_id: String,
    pub deleted: bool,
}

/// Resolve a playable URL for the cached copy, if any. Resolution
/// failures degrade to metadata-only rather than failing the request.
async fn resolve_video_url(state: &AppState, record: &ReelRecord) -> Option<String> {
    if record.blob_ref.is_none() {
        return None;
    }
    match state.store.get_video_url(&record.reel_id).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(reel_id = %record.reel_id, error = %e, "Failed to resolve cached video URL");
            None
        }
    }
}

/// POST /api/v0/reels/fetch - serve a reel from cache, fetching upstream on a miss.
pub async fn fetch_reel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchReelRequest>,
) -> Result<Json<ReelResponse>, HttpAppError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidInput("url must not be empty".to_string()).into());
    }

    let record = state.fetcher.fetch(url).await?;
    let cached_video_url = resolve_video_url(&state, &record).await;
    let from_cache = record.from_cache;

    Ok(Json(ReelResponse {
        record,
        from_cache,
        cached_video_url,
    }))
}

/// GET /api/v0/reels/{reel_id} - cached metadata only; never goes upstream.
pub async fn get_reel(
    State(state): State<Arc<AppState>>,
    Path(reel_id): Path<String>,
) -> Result<Json<ReelResponse>, HttpAppError> {
    let record = state
        .store
        .get_metadata(&reel_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("No cached reel for id {}", reel_id)))?;

    let cached_video_url = resolve_video_url(&state, &record).await;

    Ok(Json(ReelResponse {
        record,
        from_cache: true,
        cached_video_url,
    }))
}

/// GET /api/v0/reels/{reel_id}/video-url - playable URL for the cached copy.
pub async fn get_reel_video_url(
    State(state): State<Arc<AppState>>,
    Path(reel_id): Path<String>,
) -> Result<Json<VideoUrlResponse>, HttpAppError> {
    let video_url = state
        .store
        .get_video_url(&reel_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("No cached video for id {}", reel_id)))?;

    Ok(Json(VideoUrlResponse { reel_id, video_url }))
}

/// DELETE /api/v0/reels?url=... - admin eviction by source URL.
pub async fn delete_reel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteReelQuery>,
) -> Result<Json<DeleteReelResponse>, HttpAppError> {
    let url = query.url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidInput("url must not be empty".to_string()).into());
    }

    let (deleted, reel_id) = state.fetcher.delete(url).await?;
    tracing::info!(reel_id = %reel_id, deleted, "Admin delete processed");

    Ok(Json(DeleteReelResponse { reel_id, deleted }))
}
