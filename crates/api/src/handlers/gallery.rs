//! Handlers for the shared gallery.
//!
//! Gallery items cache their media URLs at share time, but grid storage is
//! transient, so media recovery walks an ordered chain of sources: a live
//! grid poll, direct bucket knowledge, the cached URLs, and finally a
//! guessed CDN URL. Deletion is wallet-gated via the `X-Wallet-Address`
//! header; there is no session state anywhere else.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use easel_core::error::CoreError;
use easel_core::media;
use easel_db::models::{GalleryItem, GalleryQuery, NewGalleryItem};
use easel_db::store::StoreError;

use crate::error::AppResult;
use crate::query::{GalleryListParams, LimitParam};
use crate::response::DataResponse;
use crate::state::AppState;

/// How long a media-recovery grid poll may take before falling through to
/// the next source.
const MEDIA_POLL_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_LIST_LIMIT: i64 = 25;
const MAX_LIST_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Request / response DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /gallery`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddGalleryRequest {
    pub job_id: String,
    pub model_id: String,
    pub model_name: String,
    pub prompt: String,
    pub negative_prompt: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_nsfw: bool,
    pub is_public: bool,
    pub wallet_address: String,
    pub params: serde_json::Value,
    pub media_urls: Vec<String>,
    pub generation_ids: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItemRef {
    pub job_id: String,
}

/// Wallet-scoped listing body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletGallery {
    pub items: Vec<GalleryItem>,
    pub count: usize,
    pub wallet: String,
}

/// Recovered media for one gallery item. `source` names the tier the URLs
/// came from: `grid-api`, `r2`, `cache`, or `fallback`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub job_id: String,
    pub media_urls: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// GET /gallery
// ---------------------------------------------------------------------------

/// Public listing, newest first, with kind filter, search, and pagination.
pub async fn list_gallery(
    State(state): State<AppState>,
    Query(params): Query<GalleryListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params
        .limit
        .filter(|l| *l > 0 && *l <= MAX_LIST_LIMIT)
        .unwrap_or(DEFAULT_LIST_LIMIT);
    let offset = params.offset.filter(|o| *o >= 0).unwrap_or(0);

    let query = GalleryQuery {
        kind: params.kind.unwrap_or_default(),
        search: params.q.unwrap_or_default(),
        limit,
        offset,
    };
    let page = state.store.list(&query).await?;
    Ok(Json(DataResponse { data: page }))
}

// ---------------------------------------------------------------------------
// POST /gallery
// ---------------------------------------------------------------------------

/// Share a generation. Re-adding an existing job id refreshes its cached
/// media URLs and visibility rather than duplicating the item.
pub async fn add_to_gallery(
    State(state): State<AppState>,
    Json(req): Json<AddGalleryRequest>,
) -> AppResult<impl IntoResponse> {
    if req.job_id.trim().is_empty() {
        return Err(CoreError::Validation("jobId is required".into()).into());
    }
    if req.prompt.trim().is_empty() {
        return Err(CoreError::Validation("prompt is required".into()).into());
    }

    let job_id = req.job_id.trim().to_string();
    let item = NewGalleryItem {
        job_id: job_id.clone(),
        model_id: req.model_id,
        model_name: req.model_name,
        prompt: req.prompt,
        negative_prompt: req.negative_prompt,
        kind: req.kind,
        is_nsfw: req.is_nsfw,
        is_public: req.is_public,
        wallet_address: req.wallet_address.trim().to_lowercase(),
        params: req.params,
        media_urls: req.media_urls,
        generation_ids: req.generation_ids,
        tags: req.tags,
    };
    state.store.add(item).await?;

    tracing::info!(job_id = %job_id, "Gallery item added");
    Ok(Json(DataResponse {
        data: GalleryItemRef { job_id },
    }))
}

// ---------------------------------------------------------------------------
// GET /gallery/wallet/{wallet}
// ---------------------------------------------------------------------------

/// Every item owned by a wallet, public or not.
pub async fn list_by_wallet(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<LimitParam>,
) -> AppResult<impl IntoResponse> {
    let wallet = wallet.trim().to_lowercase();
    if wallet.is_empty() {
        return Err(CoreError::Validation("wallet address is required".into()).into());
    }
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(100);

    let items = state.store.list_by_wallet(&wallet, limit).await?;
    let count = items.len();
    Ok(Json(DataResponse {
        data: WalletGallery { items, count, wallet },
    }))
}

// ---------------------------------------------------------------------------
// GET /gallery/{id}
// ---------------------------------------------------------------------------

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let item = state.store.get(&id).await?.ok_or(StoreError::NotFound)?;
    Ok(Json(DataResponse { data: item }))
}

// ---------------------------------------------------------------------------
// DELETE /gallery/{id}
// ---------------------------------------------------------------------------

/// Remove an item. The caller proves ownership with the `X-Wallet-Address`
/// header; the store enforces the case-insensitive owner match.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let wallet = headers
        .get("x-wallet-address")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_default();
    if wallet.is_empty() {
        return Err(
            CoreError::Unauthorized("X-Wallet-Address header is required".into()).into(),
        );
    }

    state.store.delete(&id, &wallet).await?;

    tracing::info!(job_id = %id, wallet = %wallet, "Gallery item deleted");
    Ok(Json(DataResponse {
        data: GalleryItemRef { job_id: id },
    }))
}

// ---------------------------------------------------------------------------
// GET /gallery/{id}/media
// ---------------------------------------------------------------------------

/// Recover media URLs for a gallery item.
///
/// Sources are tried in order of freshness: a live grid poll, bucket
/// storage keyed by the recorded generation ids, the URLs cached at share
/// time (only once the grid has actually failed), and last a CDN URL
/// guessed from the job id.
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let item = state.store.get(&id).await?.ok_or(StoreError::NotFound)?;

    let mut grid_failed = false;
    match tokio::time::timeout(MEDIA_POLL_TIMEOUT, state.grid.job_status(&id)).await {
        Ok(Ok(status)) => {
            let urls: Vec<String> = status
                .generations
                .iter()
                .filter(|gen| !gen.id.is_empty())
                .map(|gen| media::cdn_url_for_id(&gen.id))
                .collect();
            if !urls.is_empty() {
                return Ok(Json(DataResponse {
                    data: media_response(&item, urls, "grid-api", None),
                }));
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(job_id = %id, error = %e, "Grid poll failed during media recovery");
            grid_failed = true;
        }
        Err(_) => {
            tracing::warn!(job_id = %id, "Grid poll timed out during media recovery");
            grid_failed = true;
        }
    }

    if let Some(storage) = &state.storage {
        if !item.generation_ids.is_empty() {
            let urls: Vec<String> = item
                .generation_ids
                .iter()
                .map(|gen_id| storage.media_url(gen_id))
                .collect();
            return Ok(Json(DataResponse {
                data: media_response(&item, urls, "r2", None),
            }));
        }
    }

    if grid_failed && !item.media_urls.is_empty() {
        // Presigned bucket URLs carry their own auth; rewriting them to CDN
        // form would break them.
        let urls: Vec<String> = item
            .media_urls
            .iter()
            .map(|url| {
                if url.contains(".r2.cloudflarestorage.com") || url.contains("presigned") {
                    url.clone()
                } else {
                    media::convert_to_cdn_url(url)
                }
            })
            .collect();
        return Ok(Json(DataResponse {
            data: media_response(&item, urls, "cache", Some("Job may have expired from Grid API")),
        }));
    }

    let urls = vec![media::cdn_url_for_id(&id)];
    Ok(Json(DataResponse {
        data: media_response(&item, urls, "fallback", None),
    }))
}

fn media_response(
    item: &GalleryItem,
    media_urls: Vec<String>,
    source: &'static str,
    error: Option<&'static str>,
) -> MediaResponse {
    MediaResponse {
        job_id: item.job_id.clone(),
        media_urls,
        kind: item.kind.clone(),
        source,
        error,
    }
}
