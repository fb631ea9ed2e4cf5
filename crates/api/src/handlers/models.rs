//! Handlers for the model listing.
//!
//! A model view merges three sources: the curated preset catalog (always),
//! live grid telemetry (status and queue numbers), and the on-chain model
//! registry (description and generation constraints). Chain failures
//! degrade silently to catalog-only data; a telemetry failure is a gateway
//! error because status would otherwise be a lie.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use easel_core::catalog::{ChainConstraints, ModelDefaults, ModelKind, ModelLimits, ModelPreset};
use easel_core::error::CoreError;
use easel_core::resolve::{TelemetryEntry, TelemetrySnapshot};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One catalog model with live status and chain-derived extras.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelView {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub description: String,
    pub tags: Vec<String>,
    pub capabilities: Vec<String>,
    pub samplers: Vec<String>,
    pub schedulers: Vec<String>,
    pub status: &'static str,
    pub online_workers: i64,
    pub queue_length: i64,
    pub estimated_wait_seconds: f64,
    pub defaults: ModelDefaults,
    /// Catalog limits, narrowed by chain constraints when present.
    pub limits: ModelLimits,
    pub on_chain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintsView>,
}

/// Raw chain constraints, exposed alongside the merged limits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsView {
    pub steps_min: i64,
    pub steps_max: i64,
    pub cfg_min: f64,
    pub cfg_max: f64,
    pub clip_skip: i64,
}

impl From<ChainConstraints> for ConstraintsView {
    fn from(c: ChainConstraints) -> Self {
        Self {
            steps_min: c.steps_min,
            steps_max: c.steps_max,
            cfg_min: c.cfg_min,
            cfg_max: c.cfg_max,
            clip_skip: c.clip_skip,
        }
    }
}

/// Body of `GET /models`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: Vec<ModelView>,
    /// Whether chain registry data was merged into this response.
    pub chain_source: bool,
    /// Whether the recipe-registry allow-list was applied.
    pub recipe_source: bool,
}

// ---------------------------------------------------------------------------
// GET /models
// ---------------------------------------------------------------------------

/// List every catalog model with live status, sorted by display name.
pub async fn list_models(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = state.grid.fetch_model_stats().await?;
    let snapshot = build_snapshot(&stats);

    // Chain registry data is best-effort: a failed refresh serves
    // catalog-only views rather than failing the listing.
    let mut chain_source = false;
    if state.model_vault.is_enabled() {
        match state.model_vault.fetch_all().await {
            Ok(_) => chain_source = true,
            Err(e) => {
                tracing::warn!(error = %e, "Model vault unavailable, serving catalog-only data")
            }
        }
    }

    // The recipe registry acts as an allow-list, but only when it is
    // enabled and actually produced model names.
    let mut recipe_source = false;
    let mut recipe_names: Vec<String> = Vec::new();
    if state.recipe_vault.is_enabled() {
        match state.recipe_vault.recipe_models().await {
            Ok(names) if !names.is_empty() => {
                recipe_source = true;
                recipe_names = names;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Recipe vault unavailable, listing unfiltered"),
        }
    }

    let mut views = Vec::new();
    for preset in state.catalog.list() {
        if recipe_source && !state.resolver.matches_recipe(&preset.id, &recipe_names) {
            tracing::debug!(preset = %preset.id, "Preset absent from recipe registry, dropped");
            continue;
        }
        views.push(build_model_view(&state, preset, &snapshot, chain_source).await);
    }
    views.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    tracing::debug!(
        count = views.len(),
        chain_source,
        recipe_source,
        "Listed models"
    );

    Ok(Json(DataResponse {
        data: ModelsResponse {
            models: views,
            chain_source,
            recipe_source,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /models/{id}
// ---------------------------------------------------------------------------

/// Get a single model view by preset id.
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let preset = state
        .catalog
        .get(&id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "Model",
            id: id.clone(),
        })?
        .clone();

    let stats = state.grid.fetch_model_stats().await?;
    let snapshot = build_snapshot(&stats);

    let chain_active = state.model_vault.is_enabled();
    let view = build_model_view(&state, &preset, &snapshot, chain_active).await;

    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_snapshot(stats: &[easel_grid::wire::ModelStatus]) -> TelemetrySnapshot {
    stats
        .iter()
        .map(|s| {
            (
                s.name.as_str(),
                TelemetryEntry {
                    workers: s.count,
                    queued: s.queued,
                    eta: s.eta as f64,
                    performance: s.performance,
                },
            )
        })
        .collect()
}

async fn build_model_view(
    state: &AppState,
    preset: &ModelPreset,
    snapshot: &TelemetrySnapshot,
    chain_active: bool,
) -> ModelView {
    let entry = match state.resolver.resolve(&preset.id, snapshot) {
        Some((stage, entry)) => {
            tracing::debug!(preset = %preset.id, ?stage, workers = entry.workers, "Resolved telemetry");
            entry
        }
        None => TelemetryEntry::default(),
    };

    let mut view = ModelView {
        id: preset.id.clone(),
        display_name: preset.display_name.clone(),
        kind: preset.kind,
        description: preset.description.clone(),
        tags: preset.tags.clone(),
        capabilities: preset.capabilities.clone(),
        samplers: preset.samplers.clone(),
        schedulers: preset.schedulers.clone(),
        status: if entry.is_online() { "online" } else { "offline" },
        online_workers: entry.workers,
        queue_length: entry.queued,
        estimated_wait_seconds: entry.eta,
        defaults: preset.defaults.clone(),
        limits: preset.limits.clone(),
        on_chain: false,
        constraints: None,
    };

    if !chain_active {
        return view;
    }

    // Registered models are keyed by display name in the vault; fall back
    // to the preset id for entries registered under their file name.
    let chain_model = match state.model_vault.find_model(&preset.display_name).await {
        Ok(Some(model)) => Some(model),
        Ok(None) => state.model_vault.find_model(&preset.id).await.ok().flatten(),
        Err(_) => None,
    };

    if let Some(model) = chain_model {
        view.on_chain = true;
        if !model.description.is_empty() && model.description != preset.description {
            view.description = model.description.clone();
        }
        if let Some(constraints) = state.model_vault.constraints(model.model_hash).await {
            view.limits = preset.limits.intersect(constraints);
            view.constraints = Some(constraints.into());
        }
    }

    view
}
