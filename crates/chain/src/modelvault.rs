//! Model vault reads.
//!
//! The vault registers every model available on the grid with metadata
//! (type, file name, capabilities) and optional per-model generation
//! constraints keyed by model hash. Models are fetched one by one through
//! `getModel(uint256)` with a rate-limit delay between calls, then cached
//! for thirty minutes; a disabled client answers every query with "no
//! models" so the gateway degrades to its static catalog.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use easel_core::catalog::ChainConstraints;
use tokio::sync::RwLock;

use crate::abi::{call_data, uint_word, AbiReader};
use crate::rpc::{ChainError, RpcClient};

/// How long a fetched registry snapshot stays valid.
const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Delay between consecutive RPC calls during a bulk fetch. The public
/// Base endpoint starts returning 429s around 3 req/s.
const RPC_RATE_LIMIT: Duration = Duration::from_millis(300);

/// Selector for `getModelCount()`.
const SEL_GET_MODEL_COUNT: [u8; 4] = [0x49, 0x89, 0xdb, 0xb0];
/// Selector for `getModel(uint256)`.
const SEL_GET_MODEL: [u8; 4] = [0x6d, 0x36, 0x16, 0x94];
/// Selector for `getConstraints(bytes32)`.
const SEL_GET_CONSTRAINTS: [u8; 4] = [0x00, 0x28, 0x28, 0xc0];

/// Registered model class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainModelKind {
    Text,
    Image,
    Video,
    Unknown,
}

impl ChainModelKind {
    fn from_u8(value: u64) -> Self {
        match value {
            0 => ChainModelKind::Text,
            1 => ChainModelKind::Image,
            2 => ChainModelKind::Video,
            _ => ChainModelKind::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChainModelKind::Text => "text",
            ChainModelKind::Image => "image",
            ChainModelKind::Video => "video",
            ChainModelKind::Unknown => "unknown",
        }
    }
}

/// One registered model.
#[derive(Debug, Clone)]
pub struct ChainModel {
    pub model_hash: [u8; 32],
    pub kind: ChainModelKind,
    pub file_name: String,
    pub display_name: String,
    pub description: String,
    pub is_nsfw: bool,
    pub size_bytes: u64,
    pub inpainting: bool,
    pub img2img: bool,
    pub controlnet: bool,
    pub lora: bool,
    pub base_model: String,
    pub architecture: String,
    pub is_active: bool,
}

type ModelMap = HashMap<String, Arc<ChainModel>>;

struct Cache {
    models: ModelMap,
    expires_at: Option<Instant>,
}

/// Read-side client for the model vault facet.
pub struct ModelVaultClient {
    rpc: Option<RpcClient>,
    contract: String,
    cache: RwLock<Cache>,
}

impl ModelVaultClient {
    /// Create a client. A disabled client makes no RPC calls and returns
    /// empty results from every query.
    pub fn new(rpc_url: String, contract: String, enabled: bool) -> Self {
        let rpc = enabled.then(|| RpcClient::new(rpc_url));
        if rpc.is_some() {
            tracing::info!(contract = %contract, "Model vault client initialized");
        }
        Self {
            rpc,
            contract,
            cache: RwLock::new(Cache {
                models: HashMap::new(),
                expires_at: None,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rpc.is_some()
    }

    /// Total number of registered models.
    pub async fn model_count(&self) -> Result<u64, ChainError> {
        let Some(rpc) = &self.rpc else { return Ok(0) };
        let data = rpc
            .eth_call(&self.contract, &call_data(SEL_GET_MODEL_COUNT, &[]))
            .await?;
        AbiReader::new(&data).uint().map_err(ChainError::from)
    }

    /// Fetch one model by registry id (ids start at 1). Returns `None` for
    /// entries with an empty hash, which the contract uses for deleted or
    /// never-set slots.
    pub async fn model(&self, model_id: u64) -> Result<Option<ChainModel>, ChainError> {
        let Some(rpc) = &self.rpc else { return Ok(None) };
        let data = rpc
            .eth_call(
                &self.contract,
                &call_data(SEL_GET_MODEL, &[uint_word(model_id)]),
            )
            .await?;
        decode_model(&data).map_err(ChainError::from)
    }

    /// Fetch generation constraints for a model hash. Missing constraints
    /// are normal and come back as `None`, never as an error.
    pub async fn constraints(&self, model_hash: [u8; 32]) -> Option<ChainConstraints> {
        let rpc = self.rpc.as_ref()?;
        let data = rpc
            .eth_call(
                &self.contract,
                &call_data(SEL_GET_CONSTRAINTS, &[model_hash]),
            )
            .await
            .ok()?;
        decode_constraints(&data)
    }

    /// Fetch every active model, keyed by display name (exact and
    /// lowercase) and file name. Served from cache when fresh; partial
    /// results from a rate-limited fetch still refresh the cache.
    pub async fn fetch_all(&self) -> Result<ModelMap, ChainError> {
        if self.rpc.is_none() {
            return Ok(HashMap::new());
        }

        {
            let cache = self.cache.read().await;
            if let Some(expires_at) = cache.expires_at {
                if Instant::now() < expires_at && !cache.models.is_empty() {
                    tracing::debug!(entries = cache.models.len(), "Using cached vault models");
                    return Ok(cache.models.clone());
                }
            }
        }

        let count = self.model_count().await?;
        tracing::info!(count, "Fetching models from vault");

        let mut models: ModelMap = HashMap::new();
        let mut loaded = 0usize;
        let mut failed = 0usize;

        for id in 1..=count {
            if id > 1 {
                tokio::time::sleep(RPC_RATE_LIMIT).await;
            }

            let model = match self.model(id).await {
                Ok(Some(m)) => m,
                Ok(None) => continue,
                Err(e) => {
                    failed += 1;
                    // Rate-limit errors repeat for every remaining id; log
                    // the first one only.
                    if failed == 1 {
                        tracing::warn!(model_id = id, error = %e, "Failed to fetch vault model");
                    }
                    continue;
                }
            };
            if !model.is_active {
                continue;
            }

            loaded += 1;
            let model = Arc::new(model);
            models.insert(model.display_name.clone(), model.clone());
            models.insert(model.display_name.to_lowercase(), model.clone());
            if !model.file_name.is_empty() {
                models.insert(model.file_name.clone(), model);
            }
        }

        if loaded > 0 {
            let mut cache = self.cache.write().await;
            cache.models = models.clone();
            cache.expires_at = Some(Instant::now() + CACHE_TTL);
        }

        tracing::info!(loaded, failed, "Loaded active models from vault");
        Ok(models)
    }

    /// Look up one model by name: exact, then lowercase, then with dots
    /// and hyphens collapsed to underscores.
    pub async fn find_model(&self, name: &str) -> Result<Option<Arc<ChainModel>>, ChainError> {
        let models = self.fetch_all().await?;

        if let Some(model) = models.get(name) {
            return Ok(Some(model.clone()));
        }
        let lower = name.to_lowercase();
        if let Some(model) = models.get(&lower) {
            return Ok(Some(model.clone()));
        }

        let wanted = fold_name(&lower);
        for (key, model) in &models {
            if fold_name(&key.to_lowercase()) == wanted {
                return Ok(Some(model.clone()));
            }
        }
        Ok(None)
    }
}

fn fold_name(name: &str) -> String {
    name.replace(['.', '-'], "_")
}

/// Decode the `getModel` return tuple.
///
/// Field order: modelHash, modelType, fileName, name, version, ipfsCid,
/// downloadUrl, sizeBytes, quantization, format, vramMB, baseModel,
/// inpainting, img2img, controlnet, lora, isActive, isNSFW, timestamp,
/// creator.
fn decode_model(data: &[u8]) -> Result<Option<ChainModel>, crate::abi::AbiError> {
    let mut outer = AbiReader::new(data);
    let mut tuple = outer.tuple()?;

    let model_hash = tuple.bytes32()?;
    if model_hash == [0u8; 32] {
        return Ok(None);
    }

    let kind = ChainModelKind::from_u8(tuple.uint()?);
    let file_name = tuple.string()?;
    let display_name = tuple.string()?;
    let _version = tuple.string()?;
    let _ipfs_cid = tuple.string()?;
    let _download_url = tuple.string()?;
    let size_bytes = tuple.uint()?;
    let _quantization = tuple.string()?;
    let architecture = tuple.string()?;
    let _vram_mb = tuple.uint()?;
    let base_model = tuple.string()?;
    let inpainting = tuple.bool()?;
    let img2img = tuple.bool()?;
    let controlnet = tuple.bool()?;
    let lora = tuple.bool()?;
    let is_active = tuple.bool()?;
    let is_nsfw = tuple.bool()?;

    let description = describe_model(&display_name);

    Ok(Some(ChainModel {
        model_hash,
        kind,
        file_name,
        display_name,
        description,
        is_nsfw,
        size_bytes,
        inpainting,
        img2img,
        controlnet,
        lora,
        base_model,
        architecture,
        is_active,
    }))
}

/// Decode the `getConstraints` return tuple.
///
/// Field order: stepsMin, stepsMax, cfgMinTenths, cfgMaxTenths, clipSkip,
/// allowedSamplers, allowedSchedulers, exists. CFG bounds are stored in
/// tenths on chain. Absent or non-existent constraints decode to `None`.
fn decode_constraints(data: &[u8]) -> Option<ChainConstraints> {
    let mut outer = AbiReader::new(data);
    let mut tuple = outer.tuple().ok()?;

    let steps_min = tuple.uint().ok()? as i64;
    let steps_max = tuple.uint().ok()? as i64;
    let cfg_min_tenths = tuple.uint().ok()?;
    let cfg_max_tenths = tuple.uint().ok()?;
    let clip_skip = tuple.uint().ok()? as i64;
    let _allowed_samplers = tuple.bytes32_array().ok()?;
    let _allowed_schedulers = tuple.bytes32_array().ok()?;
    let exists = tuple.bool().ok()?;

    if !exists {
        return None;
    }

    Some(ChainConstraints {
        steps_min,
        steps_max,
        cfg_min: cfg_min_tenths as f64 / 10.0,
        cfg_max: cfg_max_tenths as f64 / 10.0,
        clip_skip,
    })
}

/// Synthesize a human-readable description from the model family. The
/// registry stores no descriptions, so these are derived for the catalog
/// view.
pub fn describe_model(display_name: &str) -> String {
    let lower = display_name.to_lowercase();

    if lower.contains("wan2.2") || lower.contains("wan2_2") {
        if lower.contains("ti2v") || lower.contains("i2v") {
            return "WAN 2.2 Image-to-Video generation model".into();
        }
        if lower.contains("t2v") {
            if lower.contains("hq") {
                return "WAN 2.2 Text-to-Video 14B model - High quality mode".into();
            }
            return "WAN 2.2 Text-to-Video model".into();
        }
        return "WAN 2.2 Video generation model".into();
    }

    if lower.contains("flux") {
        if lower.contains("kontext") {
            return "FLUX Kontext model for context-aware image generation".into();
        }
        if lower.contains("krea") {
            return "FLUX Krea model - Advanced image generation".into();
        }
        if lower.contains("schnell") {
            return "FLUX Schnell - Fast image generation".into();
        }
        return "FLUX.1 model for high-quality image generation".into();
    }

    if lower.contains("sdxl") || lower.contains("xl") {
        return "Stable Diffusion XL model".into();
    }
    if lower.contains("chroma") {
        return "Chroma model for image generation".into();
    }
    if lower.contains("ltxv") || lower.contains("ltx") {
        return "LTX Video generation model".into();
    }

    format!("{display_name} model")
}
