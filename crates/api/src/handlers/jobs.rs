//! Handlers for job submission and status polling.
//!
//! Submission validates, resolves every parameter against the preset's
//! defaults and limits (clamping, never rejecting), and forwards to the
//! grid. Polling collapses the upstream flag bag into one status and
//! normalizes each generation's media fields. Job history is best-effort
//! bookkeeping on top: it never fails a request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use easel_core::catalog::{ModelKind, ModelPreset};
use easel_core::error::CoreError;
use easel_core::media;
use easel_core::params;
use easel_core::prompts;
use easel_core::resolve::Resolver;
use easel_core::sampler::map_sampler_name;
use easel_core::status::{derive_status, JobStatus};
use easel_grid::wire::{CreateJobPayload, GenerationParams, JobStatusResponse};

use crate::error::AppResult;
use crate::query::LimitParam;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// User-supplied generation parameters. Absent fields fall back to the
/// preset defaults; present values are clamped into the preset limits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobParams {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub steps: Option<i64>,
    pub cfg_scale: Option<f64>,
    pub sampler: Option<String>,
    pub scheduler: Option<String>,
    pub seed: Option<String>,
    pub denoise: Option<f64>,
    pub length: Option<i64>,
    pub fps: Option<i64>,
    pub tiling: Option<bool>,
    pub hires_fix: Option<bool>,
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJobRequest {
    pub model_id: String,
    pub prompt: String,
    pub negative_prompt: String,
    /// Per-request upstream key; overrides the configured default.
    pub api_key: String,
    pub wallet_address: String,
    pub params: JobParams,
    pub nsfw: bool,
    pub public: bool,
    pub source_image: String,
    pub source_mask: String,
    pub source_processing: String,
    pub media_type: String,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// 202 body for a submitted job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedJob {
    pub job_id: String,
    pub status: JobStatus,
}

/// Normalized job status view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: String,
    pub status: JobStatus,
    pub faulted: bool,
    pub wait_time: i64,
    pub queue_position: i64,
    pub processing: i64,
    pub finished: i64,
    pub waiting: i64,
    pub generations: Vec<GenerationView>,
}

/// One normalized generation. For `kind:"image"` at most one of `url` and
/// `base64` is populated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationView {
    pub id: String,
    pub seed: String,
    pub kind: &'static str,
    pub mime_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base64: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub worker_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub worker_name: String,
}

// ---------------------------------------------------------------------------
// POST /jobs
// ---------------------------------------------------------------------------

/// Submit a generation job to the grid.
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    if req.prompt.trim().is_empty() {
        return Err(CoreError::Validation("prompt is required".into()).into());
    }
    if req.model_id.trim().is_empty() {
        return Err(CoreError::Validation("modelId is required".into()).into());
    }
    let preset = state
        .catalog
        .get(&req.model_id)
        .ok_or_else(|| CoreError::Validation(format!("unknown model: {}", req.model_id)))?
        .clone();

    let api_key = if !req.api_key.trim().is_empty() {
        req.api_key.trim().to_string()
    } else if !state.config.grid_api_key.is_empty() {
        state.config.grid_api_key.clone()
    } else {
        return Err(CoreError::Validation("apiKey is required".into()).into());
    };

    let payload = build_payload(&req, &preset, &state.resolver);

    tracing::info!(
        model = %req.model_id,
        grid_model = %payload.models[0],
        media_type = payload.media_type.as_deref().unwrap_or(""),
        source_processing = payload.source_processing.as_deref().unwrap_or(""),
        "Submitting generation job"
    );

    let resp = state.grid.create_job(&payload, &api_key).await?;

    // Job history is best-effort; a tracking failure never fails the
    // submission that already happened.
    let wallet = req.wallet_address.trim().to_lowercase();
    if !wallet.is_empty() {
        if let Err(e) = state.store.record_job(&resp.id, &wallet).await {
            tracing::warn!(job_id = %resp.id, error = %e, "Failed to record job history");
        }
    }

    tracing::info!(job_id = %resp.id, "Job accepted by grid");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: CreatedJob {
                job_id: resp.id,
                status: JobStatus::Queued,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /jobs/{id}
// ---------------------------------------------------------------------------

/// Poll the grid for a job and return the normalized view.
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let upstream = state.grid.job_status(&id).await?;
    let view = build_job_view(&id, &upstream);

    let error = if view.status == JobStatus::Faulted {
        "Job faulted"
    } else {
        ""
    };
    if let Err(e) = state.store.update_job_status(&id, view.status.as_str(), error).await {
        tracing::warn!(job_id = %id, error = %e, "Failed to write back job status");
    }

    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// GET /jobs/wallet/{wallet}
// ---------------------------------------------------------------------------

/// Tracked job history for a wallet, newest first.
pub async fn jobs_by_wallet(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<LimitParam>,
) -> AppResult<impl IntoResponse> {
    let wallet = wallet.trim().to_lowercase();
    if wallet.is_empty() {
        return Err(CoreError::Validation("wallet address is required".into()).into());
    }
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(50);

    let jobs = state.store.jobs_by_wallet(&wallet, limit).await?;
    Ok(Json(DataResponse { data: jobs }))
}

// ---------------------------------------------------------------------------
// Payload construction
// ---------------------------------------------------------------------------

fn build_payload(
    req: &CreateJobRequest,
    preset: &ModelPreset,
    resolver: &Resolver,
) -> CreateJobPayload {
    let (prompt, negative) =
        prompts::process_prompts(&req.prompt, &req.negative_prompt, &preset.id);

    let sampler_raw =
        params::effective_str(req.params.sampler.as_deref(), &preset.defaults.sampler);
    let sampler = map_sampler_name(sampler_raw);
    let scheduler =
        params::effective_str(req.params.scheduler.as_deref(), &preset.defaults.scheduler)
            .to_string();

    let limits = &preset.limits;
    let width = params::effective_int(req.params.width, preset.defaults.width, limits.width);
    let height = params::effective_int(req.params.height, preset.defaults.height, limits.height);
    let steps = params::effective_int(req.params.steps, preset.defaults.steps, limits.steps);
    let cfg_scale =
        params::effective_f64(req.params.cfg_scale, preset.defaults.cfg_scale, limits.cfg_scale);
    let denoise = params::effective_f64(req.params.denoise, preset.defaults.denoise, None);
    let length = params::effective_int(req.params.length, preset.defaults.length, limits.length);
    let fps = params::effective_int(req.params.fps, preset.defaults.fps, limits.fps);

    let source_processing = if req.source_processing.trim().is_empty() {
        infer_source_processing(preset.kind, !req.source_image.is_empty())
    } else {
        req.source_processing.as_str()
    };

    let media_type = if req.media_type.trim().is_empty() {
        preset.kind.as_str()
    } else {
        req.media_type.as_str()
    };

    CreateJobPayload {
        prompt,
        negative_prompt: Some(negative).filter(|n| !n.is_empty()),
        params: GenerationParams {
            sampler_name: Some(sampler.to_string()),
            scheduler: Some(scheduler.clone()),
            cfg_scale: Some(cfg_scale),
            denoising_strength: Some(denoise),
            seed: req.params.seed.clone().filter(|s| !s.is_empty()),
            height: (height > 0).then_some(height),
            width: (width > 0).then_some(width),
            steps: Some(steps),
            n: None,
            karras: Some(scheduler.eq_ignore_ascii_case("karras")),
            hires_fix: Some(req.params.hires_fix.unwrap_or(false)),
            tiling: Some(req.params.tiling.unwrap_or(false)),
            clip_skip: None,
            length: (length > 0).then_some(length),
            video_length: (length > 0).then_some(length),
            fps: (fps > 0).then_some(fps),
        },
        nsfw: req.nsfw,
        censor_nsfw: !req.nsfw,
        trusted_workers: true,
        models: vec![resolver.grid_model_name(&preset.id).to_string()],
        r2: true,
        shared: req.public,
        source_image: non_empty(&req.source_image),
        source_mask: non_empty(&req.source_mask),
        source_processing: Some(source_processing.to_string()),
        wallet_id: non_empty(&req.wallet_address),
        media_type: Some(media_type.to_string()),
    }
}

fn infer_source_processing(kind: ModelKind, has_source: bool) -> &'static str {
    match (kind, has_source) {
        (ModelKind::Video, true) => "img2video",
        (ModelKind::Video, false) => "txt2video",
        (ModelKind::Image, true) => "img2img",
        (ModelKind::Image, false) => "txt2img",
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Status normalization
// ---------------------------------------------------------------------------

fn build_job_view(job_id: &str, upstream: &JobStatusResponse) -> JobView {
    let status = derive_status(upstream.faulted, upstream.done, upstream.processing);

    let generations = upstream
        .generations
        .iter()
        .map(|gen| {
            let m = media::classify_generation(
                &gen.video,
                &gen.mime_type,
                &gen.img_url,
                &gen.img,
                &gen.image,
            );
            GenerationView {
                id: gen.id.clone(),
                seed: stringify_seed(&gen.seed),
                kind: m.kind().as_str(),
                mime_type: gen.mime_type.clone(),
                url: m.url,
                base64: m.base64,
                worker_id: gen.worker_id.clone(),
                worker_name: gen.worker_name.clone(),
            }
        })
        .collect();

    JobView {
        job_id: job_id.to_string(),
        status,
        faulted: upstream.faulted,
        wait_time: upstream.wait_time,
        queue_position: upstream.queue_position,
        processing: upstream.processing,
        finished: upstream.finished,
        waiting: upstream.waiting,
        generations,
    }
}

/// Seeds arrive as JSON numbers or strings depending on the worker; the
/// view always carries a string.
fn stringify_seed(seed: &serde_json::Value) -> String {
    match seed {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_preset() -> ModelPreset {
        let json = serde_json::json!([{
            "id": "flux.1-krea-dev",
            "displayName": "FLUX.1 Krea Dev",
            "type": "image",
            "defaults": {
                "width": 1024, "height": 1024, "steps": 28, "cfgScale": 3.5,
                "sampler": "euler", "scheduler": "simple", "denoise": 1.0
            },
            "limits": {
                "width": {"min": 256, "max": 2048, "step": 64},
                "height": {"min": 256, "max": 2048, "step": 64},
                "steps": {"min": 1, "max": 50, "step": 1},
                "cfgScale": {"min": 1.0, "max": 20.0, "step": 0.5}
            }
        }]);
        let catalog =
            easel_core::catalog::Catalog::from_json(&json.to_string()).unwrap();
        catalog.get("flux.1-krea-dev").unwrap().clone()
    }

    #[test]
    fn out_of_range_steps_clamp_to_limit() {
        let req = CreateJobRequest {
            model_id: "flux.1-krea-dev".into(),
            prompt: "a lighthouse at dusk".into(),
            params: JobParams {
                steps: Some(9999),
                ..Default::default()
            },
            ..Default::default()
        };
        let payload = build_payload(&req, &test_preset(), &Resolver::new());
        assert_eq!(payload.params.steps, Some(50));
    }

    #[test]
    fn defaults_fill_absent_params() {
        let req = CreateJobRequest {
            model_id: "flux.1-krea-dev".into(),
            prompt: "a lighthouse at dusk".into(),
            ..Default::default()
        };
        let payload = build_payload(&req, &test_preset(), &Resolver::new());
        assert_eq!(payload.params.width, Some(1024));
        assert_eq!(payload.params.cfg_scale, Some(3.5));
        assert_eq!(payload.params.sampler_name.as_deref(), Some("k_euler"));
        assert_eq!(payload.params.karras, Some(false));
        assert_eq!(payload.source_processing.as_deref(), Some("txt2img"));
        assert_eq!(payload.media_type.as_deref(), Some("image"));
    }

    #[test]
    fn nsfw_flag_disables_censoring() {
        let req = CreateJobRequest {
            model_id: "flux.1-krea-dev".into(),
            prompt: "a lighthouse at dusk".into(),
            nsfw: true,
            ..Default::default()
        };
        let payload = build_payload(&req, &test_preset(), &Resolver::new());
        assert!(payload.nsfw);
        assert!(!payload.censor_nsfw);
    }

    #[test]
    fn video_preset_mirrors_length() {
        let json = serde_json::json!([{
            "id": "wan2.2_ti2v_5B",
            "displayName": "WAN 2.2 TI2V 5B",
            "type": "video",
            "defaults": {"steps": 20, "cfgScale": 5.0, "sampler": "uni_pc",
                         "scheduler": "simple", "length": 81, "fps": 16},
            "limits": {"length": {"min": 17, "max": 121, "step": 4},
                       "fps": {"min": 8, "max": 24, "step": 1}}
        }]);
        let catalog = easel_core::catalog::Catalog::from_json(&json.to_string()).unwrap();
        let preset = catalog.get("wan2.2_ti2v_5B").unwrap().clone();

        let req = CreateJobRequest {
            model_id: "wan2.2_ti2v_5B".into(),
            prompt: "waves rolling in".into(),
            ..Default::default()
        };
        let payload = build_payload(&req, &preset, &Resolver::new());
        assert_eq!(payload.params.length, Some(81));
        assert_eq!(payload.params.video_length, Some(81));
        assert_eq!(payload.params.fps, Some(16));
        assert_eq!(payload.params.sampler_name.as_deref(), Some("dpmsolver"));
        assert_eq!(payload.source_processing.as_deref(), Some("txt2video"));
    }

    #[test]
    fn faulted_wins_over_done() {
        let upstream = JobStatusResponse {
            done: true,
            faulted: true,
            ..Default::default()
        };
        let view = build_job_view("j1", &upstream);
        assert_eq!(view.status, JobStatus::Faulted);
    }

    #[test]
    fn numeric_seed_is_stringified() {
        assert_eq!(stringify_seed(&serde_json::json!(123456)), "123456");
        assert_eq!(stringify_seed(&serde_json::json!("42")), "42");
        assert_eq!(stringify_seed(&serde_json::Value::Null), "");
    }
}
