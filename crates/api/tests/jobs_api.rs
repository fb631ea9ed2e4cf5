//! Integration tests for job submission and status polling.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with_config, expect_error, get, post_json,
    test_config, ScriptedGrid,
};
use easel_grid::wire::{Generation, JobStatusResponse};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: submission validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_job_requires_prompt() {
    let app = build_test_app(ScriptedGrid::new()).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "flux.1-krea-dev", "prompt": "   ", "apiKey": "k"}),
    )
    .await;
    expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION").await;
    assert!(app.grid.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn create_job_rejects_unknown_model() {
    let app = build_test_app(ScriptedGrid::new()).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "not-a-model", "prompt": "a cat", "apiKey": "k"}),
    )
    .await;
    let body = expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION").await;
    assert!(body["error"].as_str().unwrap().contains("not-a-model"));
}

#[tokio::test]
async fn create_job_requires_an_api_key() {
    // Neither the request nor the server config carries a key; the job must
    // be rejected before anything reaches the grid.
    let app = build_test_app(ScriptedGrid::new()).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "flux.1-krea-dev", "prompt": "a cat"}),
    )
    .await;
    expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION").await;
    assert!(app.grid.submissions.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: successful submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_job_returns_202_with_job_id() {
    let app = build_test_app(ScriptedGrid::new().with_job_id("abc-123")).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({
            "modelId": "flux.1-krea-dev",
            "prompt": "a lighthouse at dusk",
            "apiKey": "user-key"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["jobId"], "abc-123");
    assert_eq!(body["data"]["status"], "queued");

    let (payload, api_key) = app.grid.only_submission();
    assert_eq!(api_key, "user-key");
    assert_eq!(payload.models, vec!["flux.1-krea-dev".to_string()]);
    assert_eq!(payload.source_processing.as_deref(), Some("txt2img"));
    assert!(payload.censor_nsfw);
}

#[tokio::test]
async fn create_job_clamps_out_of_range_params() {
    let app = build_test_app(ScriptedGrid::new()).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({
            "modelId": "flux.1-krea-dev",
            "prompt": "a lighthouse at dusk",
            "apiKey": "k",
            "params": {"steps": 9999, "cfgScale": 100.0}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (payload, _) = app.grid.only_submission();
    assert_eq!(payload.params.steps, Some(50));
    assert_eq!(payload.params.cfg_scale, Some(20.0));
}

#[tokio::test]
async fn karras_scheduler_sets_the_flag() {
    let app = build_test_app(ScriptedGrid::new()).await;

    // SDXL defaults to the karras scheduler; the flag must follow it.
    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "SDXL 1.0", "prompt": "a cat", "apiKey": "k"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (payload, _) = app.grid.only_submission();
    assert_eq!(payload.params.karras, Some(true));
    assert_eq!(payload.params.sampler_name.as_deref(), Some("k_dpmpp_2m"));
}

#[tokio::test]
async fn configured_key_is_the_fallback() {
    let mut config = test_config();
    config.grid_api_key = "server-key".into();
    let app = build_test_app_with_config(ScriptedGrid::new(), config).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "flux.1-krea-dev", "prompt": "a cat"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (_, api_key) = app.grid.only_submission();
    assert_eq!(api_key, "server-key");
}

#[tokio::test]
async fn request_key_overrides_configured_key() {
    let mut config = test_config();
    config.grid_api_key = "server-key".into();
    let app = build_test_app_with_config(ScriptedGrid::new(), config).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "flux.1-krea-dev", "prompt": "a cat", "apiKey": "user-key"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (_, api_key) = app.grid.only_submission();
    assert_eq!(api_key, "user-key");
}

#[tokio::test]
async fn video_submission_infers_txt2video() {
    let app = build_test_app(ScriptedGrid::new()).await;

    let response = post_json(
        &app,
        "/api/jobs",
        json!({"modelId": "wan2.2_ti2v_5B", "prompt": "waves rolling in", "apiKey": "k"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (payload, _) = app.grid.only_submission();
    assert_eq!(payload.media_type.as_deref(), Some("video"));
    assert_eq!(payload.source_processing.as_deref(), Some("txt2video"));
    assert_eq!(payload.params.length, Some(81));
    assert_eq!(payload.params.video_length, Some(81));
    // Preset ids with an explicit grid mapping submit under the grid name.
    assert_eq!(payload.models, vec!["wan2_2_ti2v_5b".to_string()]);
}

// ---------------------------------------------------------------------------
// Test: status polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_status_normalizes_generations() {
    let status = JobStatusResponse {
        done: true,
        finished: 1,
        generations: vec![Generation {
            id: "gen-1".into(),
            video: "https://worker.host/gen-1".into(),
            mime_type: "video/mp4".into(),
            seed: serde_json::json!(123456),
            worker_name: "worker-a".into(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let app = build_test_app(ScriptedGrid::new().with_status(status)).await;

    let response = get(&app, "/api/jobs/abc-123").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let view = &body["data"];
    assert_eq!(view["jobId"], "abc-123");
    assert_eq!(view["status"], "completed");
    assert_eq!(view["faulted"], false);

    let gen = &view["generations"][0];
    assert_eq!(gen["kind"], "video");
    assert_eq!(gen["url"], "https://images.aipg.art/gen-1.webp");
    assert_eq!(gen["seed"], "123456");
    assert_eq!(gen["workerName"], "worker-a");
    assert!(gen.get("base64").is_none());
}

#[tokio::test]
async fn faulted_job_reports_faulted_status() {
    let status = JobStatusResponse {
        done: true,
        faulted: true,
        ..Default::default()
    };
    let app = build_test_app(ScriptedGrid::new().with_status(status)).await;

    let response = get(&app, "/api/jobs/abc-123").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "faulted");
    assert_eq!(body["data"]["faulted"], true);
}

// ---------------------------------------------------------------------------
// Test: wallet job history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wallet_history_is_empty_on_the_file_store() {
    let app = build_test_app(ScriptedGrid::new()).await;

    let response = get(&app, "/api/jobs/wallet/0xAbCd").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}
