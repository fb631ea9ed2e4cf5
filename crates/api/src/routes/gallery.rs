//! Route definitions for the shared gallery.
//!
//! ```text
//! GET    /gallery                  list_gallery
//! POST   /gallery                  add_to_gallery
//! GET    /gallery/wallet/{wallet}  list_by_wallet
//! GET    /gallery/{id}             get_item
//! GET    /gallery/{id}/media       get_media
//! DELETE /gallery/{id}             delete_item
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::gallery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/gallery",
            get(gallery::list_gallery).post(gallery::add_to_gallery),
        )
        .route("/gallery/wallet/{wallet}", get(gallery::list_by_wallet))
        .route(
            "/gallery/{id}",
            get(gallery::get_item).delete(gallery::delete_item),
        )
        .route("/gallery/{id}/media", get(gallery::get_media))
}
