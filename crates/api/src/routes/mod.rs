pub mod gallery;
pub mod health;
pub mod jobs;
pub mod models;
pub mod styles;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// GET    /models                  list presets with live status
/// GET    /models/{id}             single preset view
/// POST   /jobs                    submit a generation job
/// GET    /jobs/{id}               poll job status
/// GET    /jobs/wallet/{wallet}    per-wallet job history
/// GET    /gallery                 public listing (filter, search, paginate)
/// POST   /gallery                 share a completed job
/// GET    /gallery/wallet/{wallet} items owned by a wallet
/// GET    /gallery/{id}            single item
/// GET    /gallery/{id}/media      refreshed media URLs
/// DELETE /gallery/{id}            owner-only removal
/// GET    /styles                  curated styles document
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(models::router())
        .merge(jobs::router())
        .merge(gallery::router())
        .merge(styles::router())
}
