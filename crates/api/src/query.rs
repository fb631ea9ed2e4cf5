//! Shared query parameter types for API handlers.
//!
//! Common query structs that appear across multiple handler modules are
//! extracted here to avoid duplication.

use serde::Deserialize;

/// Bare `?limit=` parameter for capped, unpaginated listings.
///
/// Non-positive values fall back to the handler's default.
#[derive(Debug, Deserialize)]
pub struct LimitParam {
    pub limit: Option<i64>,
}

/// Gallery listing parameters (`?type=&q=&limit=&offset=`).
///
/// `limit` outside `1..=100` and negative `offset` fall back to the
/// defaults rather than erroring.
#[derive(Debug, Deserialize)]
pub struct GalleryListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
