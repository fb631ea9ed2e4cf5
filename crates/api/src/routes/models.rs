//! Route definitions for the model listing.
//!
//! ```text
//! GET /models        list_models
//! GET /models/{id}   get_model
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::models;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/models", get(models::list_models))
        .route("/models/{id}", get(models::get_model))
}
