//! Route definitions for job submission and polling.
//!
//! ```text
//! POST /jobs                  create_job
//! GET  /jobs/{id}             job_status
//! GET  /jobs/wallet/{wallet}  jobs_by_wallet
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/wallet/{wallet}", get(jobs::jobs_by_wallet))
        .route("/jobs/{id}", get(jobs::job_status))
}
