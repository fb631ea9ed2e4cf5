//! Recipe vault reads.
//!
//! Recipes are published ComfyUI workflows; the gateway only cares about
//! public ones, and only as an allow-list of model files the community has
//! built workflows for. Workflow payloads are stored gzip-compressed on
//! chain; a payload that fails to decompress keeps its recipe visible with
//! the error recorded instead of dropping it.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flate2::read::GzDecoder;
use tokio::sync::RwLock;

use crate::abi::{call_data, uint_word, AbiReader};
use crate::rpc::{encode_hex, ChainError, RpcClient};
use crate::workflow;

const CACHE_TTL: Duration = Duration::from_secs(30 * 60);
const RPC_RATE_LIMIT: Duration = Duration::from_millis(300);

/// Selector for `getTotalRecipes()`.
const SEL_GET_TOTAL_RECIPES: [u8; 4] = [0x16, 0x50, 0xac, 0x6d];
/// Selector for `getRecipe(uint256)`.
const SEL_GET_RECIPE: [u8; 4] = [0xf8, 0xd1, 0x2a, 0x41];

/// Workflow compression schemes used by the publishing SDK.
const COMPRESSION_NONE: u64 = 0;
const COMPRESSION_GZIP: u64 = 1;

/// One published recipe.
#[derive(Debug, Clone)]
pub struct ChainRecipe {
    pub recipe_id: u64,
    pub recipe_root: String,
    pub creator: String,
    pub can_create_nfts: bool,
    pub is_public: bool,
    pub compression: u64,
    pub created_at: u64,
    pub name: String,
    pub description: String,
    /// Decompressed workflow JSON, when the payload was readable.
    pub workflow: Option<serde_json::Value>,
    /// Why `workflow` is `None`, when it is.
    pub workflow_error: String,
}

type RecipeMap = HashMap<String, Arc<ChainRecipe>>;

struct Cache {
    recipes: RecipeMap,
    expires_at: Option<Instant>,
}

/// Read-side client for the recipe vault facet.
pub struct RecipeVaultClient {
    rpc: Option<RpcClient>,
    contract: String,
    cache: RwLock<Cache>,
}

impl RecipeVaultClient {
    /// Create a client; disabled clients answer every query with nothing.
    pub fn new(rpc_url: String, contract: String, enabled: bool) -> Self {
        let rpc = enabled.then(|| RpcClient::new(rpc_url));
        if rpc.is_some() {
            tracing::info!(contract = %contract, "Recipe vault client initialized");
        }
        Self {
            rpc,
            contract,
            cache: RwLock::new(Cache {
                recipes: HashMap::new(),
                expires_at: None,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rpc.is_some()
    }

    /// Total number of published recipes.
    pub async fn total_recipes(&self) -> Result<u64, ChainError> {
        let Some(rpc) = &self.rpc else { return Ok(0) };
        let data = rpc
            .eth_call(&self.contract, &call_data(SEL_GET_TOTAL_RECIPES, &[]))
            .await?;
        AbiReader::new(&data).uint().map_err(ChainError::from)
    }

    /// Fetch one recipe by id (ids start at 1).
    pub async fn recipe(&self, recipe_id: u64) -> Result<Option<ChainRecipe>, ChainError> {
        let Some(rpc) = &self.rpc else { return Ok(None) };
        let data = rpc
            .eth_call(
                &self.contract,
                &call_data(SEL_GET_RECIPE, &[uint_word(recipe_id)]),
            )
            .await?;
        decode_recipe(&data).map(Some).map_err(ChainError::from)
    }

    /// Fetch every public recipe, keyed by name (exact and normalized).
    /// Served from cache when fresh.
    pub async fn fetch_all(&self) -> Result<RecipeMap, ChainError> {
        if self.rpc.is_none() {
            return Ok(HashMap::new());
        }

        {
            let cache = self.cache.read().await;
            if let Some(expires_at) = cache.expires_at {
                if Instant::now() < expires_at && !cache.recipes.is_empty() {
                    tracing::debug!(entries = cache.recipes.len(), "Using cached vault recipes");
                    return Ok(cache.recipes.clone());
                }
            }
        }

        let count = self.total_recipes().await?;
        tracing::info!(count, "Fetching recipes from vault");

        let mut recipes: RecipeMap = HashMap::new();
        let mut loaded = 0usize;
        let mut failed = 0usize;

        for id in 1..=count {
            if id > 1 {
                tokio::time::sleep(RPC_RATE_LIMIT).await;
            }

            let recipe = match self.recipe(id).await {
                Ok(Some(r)) => r,
                Ok(None) => continue,
                Err(e) => {
                    failed += 1;
                    if failed == 1 {
                        tracing::warn!(recipe_id = id, error = %e, "Failed to fetch vault recipe");
                    }
                    continue;
                }
            };
            if !recipe.is_public {
                continue;
            }

            loaded += 1;
            let normalized = recipe.name.to_lowercase().replace(['.', '-'], "_");
            let recipe = Arc::new(recipe);
            recipes.insert(recipe.name.clone(), recipe.clone());
            recipes.insert(normalized, recipe);
        }

        if loaded > 0 {
            let mut cache = self.cache.write().await;
            cache.recipes = recipes.clone();
            cache.expires_at = Some(Instant::now() + CACHE_TTL);
        }

        tracing::info!(loaded, failed, "Loaded public recipes from vault");
        Ok(recipes)
    }

    /// Unique model file names referenced across all public recipe
    /// workflows, sorted. This is the allow-list the catalog filters on.
    pub async fn recipe_models(&self) -> Result<Vec<String>, ChainError> {
        let recipes = self.fetch_all().await?;

        let mut models = Vec::new();
        for recipe in recipes.values() {
            let Some(flow) = &recipe.workflow else {
                tracing::debug!(recipe = %recipe.name, error = %recipe.workflow_error,
                    "Recipe has no readable workflow");
                continue;
            };
            models.extend(workflow::extract_models(flow));
        }

        models.sort();
        models.dedup();
        tracing::debug!(count = models.len(), "Extracted models from recipes");
        Ok(models)
    }
}

/// Decode the `getRecipe` return tuple.
///
/// Field order: recipeId, recipeRoot, workflowData, creator,
/// canCreateNFTs, isPublic, compression, createdAt, name, description.
fn decode_recipe(data: &[u8]) -> Result<ChainRecipe, crate::abi::AbiError> {
    let mut outer = AbiReader::new(data);
    let mut tuple = outer.tuple()?;

    let recipe_id = tuple.uint()?;
    let root = tuple.bytes32()?;
    let workflow_data = tuple.bytes()?;
    let creator = tuple.address()?;
    let can_create_nfts = tuple.bool()?;
    let is_public = tuple.bool()?;
    let compression = tuple.uint()?;
    let created_at = tuple.uint()?;
    let name = tuple.string()?;
    let description = tuple.string()?;

    let (workflow, workflow_error) = decompress_workflow(&workflow_data, compression);

    Ok(ChainRecipe {
        recipe_id,
        recipe_root: encode_hex(&root)
            .trim_start_matches("0x")
            .to_string(),
        creator,
        can_create_nfts,
        is_public,
        compression,
        created_at,
        name,
        description,
        workflow,
        workflow_error,
    })
}

/// Inflate and parse a workflow payload. Failures return the reason in
/// the second slot instead of an error so one bad recipe never aborts a
/// bulk fetch.
fn decompress_workflow(data: &[u8], compression: u64) -> (Option<serde_json::Value>, String) {
    if data.is_empty() {
        return (None, "empty workflow data".into());
    }

    let json_bytes = match compression {
        COMPRESSION_GZIP => {
            let mut decoder = GzDecoder::new(data);
            let mut buf = Vec::new();
            if let Err(e) = decoder.read_to_end(&mut buf) {
                return (None, format!("failed to decompress gzip: {e}"));
            }
            buf
        }
        COMPRESSION_NONE => data.to_vec(),
        other => return (None, format!("unsupported compression type: {other}")),
    };

    match serde_json::from_slice::<serde_json::Value>(&json_bytes) {
        Ok(value) if value.is_object() => (Some(value), String::new()),
        Ok(_) => (None, "workflow JSON is not an object".into()),
        Err(e) => (None, format!("failed to parse workflow JSON: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn gzip_workflow_round_trips() {
        let workflow = br#"{"1":{"class_type":"CheckpointLoaderSimple","inputs":{"ckpt_name":"m.safetensors"}}}"#;
        let (parsed, err) = decompress_workflow(&gzip(workflow), COMPRESSION_GZIP);
        assert!(err.is_empty());
        let models = workflow::extract_models(&parsed.unwrap());
        assert_eq!(models, vec!["m.safetensors"]);
    }

    #[test]
    fn uncompressed_workflow_parses() {
        let (parsed, err) = decompress_workflow(b"{\"nodes\":[]}", COMPRESSION_NONE);
        assert!(err.is_empty());
        assert!(parsed.is_some());
    }

    #[test]
    fn bad_gzip_reports_error_without_panicking() {
        let (parsed, err) = decompress_workflow(b"not gzip at all", COMPRESSION_GZIP);
        assert!(parsed.is_none());
        assert!(err.contains("gzip"));
    }

    #[test]
    fn unknown_compression_is_rejected() {
        let (parsed, err) = decompress_workflow(b"{}", 2);
        assert!(parsed.is_none());
        assert!(err.contains("unsupported compression"));
    }

    #[test]
    fn empty_payload_is_reported() {
        let (parsed, err) = decompress_workflow(b"", COMPRESSION_GZIP);
        assert!(parsed.is_none());
        assert_eq!(err, "empty workflow data");
    }

    fn string_body(text: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&uint_word(text.len() as u64));
        let mut chunk = vec![0u8; text.len().div_ceil(32).max(1) * 32];
        chunk[..text.len()].copy_from_slice(text.as_bytes());
        body.extend_from_slice(&chunk);
        body
    }

    #[test]
    fn decodes_recipe_tuple() {
        let workflow = gzip(br#"{"1":{"class_type":"VAELoader","inputs":{"vae_name":"ae.safetensors"}}}"#);

        // 10 head words, then workflowData, name, description bodies.
        let head_len = 10 * 32;
        let mut tail = Vec::new();

        let data_offset = head_len;
        tail.extend_from_slice(&uint_word(workflow.len() as u64));
        let mut padded = vec![0u8; workflow.len().div_ceil(32).max(1) * 32];
        padded[..workflow.len()].copy_from_slice(&workflow);
        tail.extend_from_slice(&padded);

        let name_offset = head_len + tail.len();
        tail.extend_from_slice(&string_body("FLUX Krea Workflow"));
        let desc_offset = head_len + tail.len();
        tail.extend_from_slice(&string_body("Community workflow"));

        let mut tuple = Vec::new();
        tuple.extend_from_slice(&uint_word(7)); // recipeId
        let mut root = [0u8; 32];
        root[0] = 0xab;
        tuple.extend_from_slice(&root); // recipeRoot
        tuple.extend_from_slice(&uint_word(data_offset as u64)); // workflowData
        tuple.extend_from_slice(&[0u8; 32]); // creator
        tuple.extend_from_slice(&uint_word(0)); // canCreateNFTs
        tuple.extend_from_slice(&uint_word(1)); // isPublic
        tuple.extend_from_slice(&uint_word(COMPRESSION_GZIP)); // compression
        tuple.extend_from_slice(&uint_word(1_700_000_000)); // createdAt
        tuple.extend_from_slice(&uint_word(name_offset as u64)); // name
        tuple.extend_from_slice(&uint_word(desc_offset as u64)); // description
        tuple.extend_from_slice(&tail);

        let mut payload = Vec::new();
        payload.extend_from_slice(&uint_word(32));
        payload.extend_from_slice(&tuple);

        let recipe = decode_recipe(&payload).unwrap();
        assert_eq!(recipe.recipe_id, 7);
        assert!(recipe.recipe_root.starts_with("ab"));
        assert!(recipe.is_public);
        assert_eq!(recipe.name, "FLUX Krea Workflow");
        assert_eq!(recipe.description, "Community workflow");
        assert!(recipe.workflow_error.is_empty());
        let models = workflow::extract_models(&recipe.workflow.unwrap());
        assert_eq!(models, vec!["ae.safetensors"]);
    }

    #[tokio::test]
    async fn disabled_client_returns_empty() {
        let client = RecipeVaultClient::new(
            "https://mainnet.base.org".into(),
            crate::DEFAULT_CONTRACT_ADDRESS.into(),
            false,
        );
        assert!(!client.is_enabled());
        assert_eq!(client.total_recipes().await.unwrap(), 0);
        assert!(client.recipe_models().await.unwrap().is_empty());
    }
}
