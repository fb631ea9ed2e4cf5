//! Route definition for the curated styles document.

use axum::routing::get;
use axum::Router;

use crate::handlers::styles;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/styles", get(styles::get_styles))
}
