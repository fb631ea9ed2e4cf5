//! Wire types for the grid REST API.
//!
//! The grid is loose with JSON number types: counters and timings arrive as
//! numbers from some worker versions and as strings from others, so the
//! telemetry and status types deserialize both forms.

use serde::{Deserialize, Deserializer, Serialize};

/// Accept a JSON number or a numeric string; anything else reads as zero.
fn flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or_else(|| {
            n.as_f64().map(|f| f as i64).unwrap_or(0)
        }),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// One row of `GET /status/models` telemetry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub name: String,
    /// Worker count; the grid calls this `count`.
    #[serde(default, deserialize_with = "flexible_i64")]
    pub count: i64,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub queued: i64,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub eta: i64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub performance: f64,
}

/// Generation parameters nested inside a job submission.
///
/// Every field is optional and omitted from the payload when unset; the
/// grid applies its own defaults for absent fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denoising_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karras: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hires_fix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    /// Duplicate of `length`; some worker bridges read this key instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<i64>,
}

/// Body of `POST /generate/async`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobPayload {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub params: GenerationParams,
    pub nsfw: bool,
    pub censor_nsfw: bool,
    pub trusted_workers: bool,
    pub models: Vec<String>,
    pub r2: bool,
    pub shared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_mask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_processing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// `202 Accepted` body from a job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobResponse {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// One finished (or in-flight) generation in a status poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub video: String,
    #[serde(default)]
    pub mime_type: String,
    /// Seeds arrive as numbers or strings depending on the worker.
    #[serde(default)]
    pub seed: serde_json::Value,
    #[serde(default)]
    pub worker_id: String,
    #[serde(default)]
    pub worker_name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub censored: bool,
}

/// Body of `GET /generate/status/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub finished: i64,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub processing: i64,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub restarted: i64,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub waiting: i64,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub faulted: bool,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub wait_time: i64,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub queue_position: i64,
    #[serde(default)]
    pub is_possible: bool,
    #[serde(default)]
    pub generations: Vec<Generation>,
}
