//! Shared test harness for the API integration tests.
//!
//! Builds the full application router with the same middleware stack that
//! `main.rs` uses, substituting a scripted grid double, a temp-dir file
//! store, and disabled chain readers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use async_trait::async_trait;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use easel_api::config::{ServerConfig, VaultConfig};
use easel_api::router::build_app_router;
use easel_api::state::AppState;
use easel_chain::{ModelVaultClient, RecipeVaultClient};
use easel_cloud::{MediaStorage, R2Config, StorageError};
use easel_core::catalog::Catalog;
use easel_core::resolve::Resolver;
use easel_db::{FileGalleryStore, GalleryStore};
use easel_grid::wire::{CreateJobPayload, CreateJobResponse, JobStatusResponse, ModelStatus};
use easel_grid::{GridApi, GridError};

// ---------------------------------------------------------------------------
// Scripted grid double
// ---------------------------------------------------------------------------

/// How a scripted call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFailure {
    Timeout,
    Unavailable,
}

impl GridFailure {
    fn into_error(self) -> GridError {
        match self {
            GridFailure::Timeout => GridError::Timeout,
            GridFailure::Unavailable => GridError::UpstreamStatus {
                status: 503,
                body: "maintenance".into(),
            },
        }
    }
}

/// In-memory [`GridApi`] double. Responses are configured up front;
/// submissions are recorded for later inspection.
pub struct ScriptedGrid {
    stats: Vec<ModelStatus>,
    stats_failure: Option<GridFailure>,
    status: JobStatusResponse,
    status_failure: Option<GridFailure>,
    job_id: String,
    /// Every `(payload, api_key)` pair passed to `create_job`.
    pub submissions: Mutex<Vec<(CreateJobPayload, String)>>,
}

impl Default for ScriptedGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGrid {
    pub fn new() -> Self {
        Self {
            stats: Vec::new(),
            stats_failure: None,
            status: JobStatusResponse::default(),
            status_failure: None,
            job_id: "job-0001".into(),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_stats(mut self, stats: Vec<ModelStatus>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_stats_failure(mut self, failure: GridFailure) -> Self {
        self.stats_failure = Some(failure);
        self
    }

    pub fn with_status(mut self, status: JobStatusResponse) -> Self {
        self.status = status;
        self
    }

    pub fn with_status_failure(mut self, failure: GridFailure) -> Self {
        self.status_failure = Some(failure);
        self
    }

    pub fn with_job_id(mut self, job_id: &str) -> Self {
        self.job_id = job_id.into();
        self
    }

    /// The single recorded submission, panicking when there is not exactly
    /// one.
    pub fn only_submission(&self) -> (CreateJobPayload, String) {
        let submissions = self.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1, "expected exactly one submission");
        submissions[0].clone()
    }
}

#[async_trait]
impl GridApi for ScriptedGrid {
    async fn fetch_model_stats(&self) -> Result<Vec<ModelStatus>, GridError> {
        match self.stats_failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(self.stats.clone()),
        }
    }

    async fn create_job(
        &self,
        payload: &CreateJobPayload,
        api_key: &str,
    ) -> Result<CreateJobResponse, GridError> {
        self.submissions
            .lock()
            .unwrap()
            .push((payload.clone(), api_key.to_string()));
        Ok(CreateJobResponse {
            id: self.job_id.clone(),
            message: String::new(),
        })
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatusResponse, GridError> {
        match self.status_failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(self.status.clone()),
        }
    }
}

/// Telemetry row shorthand for scripting `fetch_model_stats`.
pub fn stats_row(name: &str, count: i64, queued: i64, eta: i64) -> ModelStatus {
    ModelStatus {
        name: name.into(),
        count,
        queued,
        eta,
        performance: 1.0,
    }
}

// ---------------------------------------------------------------------------
// Stub media storage
// ---------------------------------------------------------------------------

/// Storage double that only serves the default CDN URL mapping.
pub struct StubStorage;

#[async_trait]
impl MediaStorage for StubStorage {
    async fn download_url(
        &self,
        _object_key: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn object_exists(&self, _object_key: &str) -> bool {
        false
    }

    async fn delete_object(&self, _object_key: &str) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// A small catalog covering the shapes the handlers care about: an image
/// preset with limits, a plain image preset, and a video preset.
pub fn test_catalog() -> Catalog {
    let raw = serde_json::json!([
        {
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
        },
        {
            "id": "SDXL 1.0",
            "displayName": "SDXL 1.0",
            "type": "image",
            "defaults": {
                "width": 1024, "height": 1024, "steps": 30, "cfgScale": 7.0,
                "sampler": "dpmpp_2m", "scheduler": "karras", "denoise": 1.0
            }
        },
        {
            "id": "wan2.2_ti2v_5B",
            "displayName": "WAN 2.2 TI2V 5B",
            "type": "video",
            "defaults": {
                "steps": 20, "cfgScale": 5.0, "sampler": "uni_pc",
                "scheduler": "simple", "length": 81, "fps": 16
            },
            "limits": {
                "length": {"min": 17, "max": 121, "step": 4},
                "fps": {"min": 8, "max": 24, "step": 1}
            }
        }
    ]);
    Catalog::from_json(&raw.to_string()).unwrap()
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        addr: "127.0.0.1:0".into(),
        grid_api_url: "http://grid.invalid/api/v2".into(),
        grid_client_agent: "easel-test:0".into(),
        grid_api_key: String::new(),
        model_presets_path: "config/model_presets.json".into(),
        styles_path: "config/styles.json".into(),
        allowed_origins: Vec::new(),
        gallery_store_path: String::new(),
        gallery_max_items: 100,
        database_url: None,
        modelvault: VaultConfig {
            enabled: false,
            rpc_url: easel_chain::DEFAULT_RPC_URL.into(),
            contract: easel_chain::DEFAULT_CONTRACT_ADDRESS.into(),
        },
        recipevault: VaultConfig {
            enabled: false,
            rpc_url: easel_chain::DEFAULT_RPC_URL.into(),
            contract: String::new(),
        },
        r2: R2Config::default(),
    }
}

/// A fully wired application plus the handles tests inspect afterwards.
/// Dropping it removes the temp-dir gallery store.
pub struct TestApp {
    pub router: Router,
    pub grid: Arc<ScriptedGrid>,
    pub store: Arc<dyn GalleryStore>,
    _tmp: TempDir,
}

pub async fn build_test_app(grid: ScriptedGrid) -> TestApp {
    build_app(grid, test_config(), None).await
}

pub async fn build_test_app_with_config(grid: ScriptedGrid, config: ServerConfig) -> TestApp {
    build_app(grid, config, None).await
}

pub async fn build_test_app_with_storage(grid: ScriptedGrid) -> TestApp {
    build_app(grid, test_config(), Some(Arc::new(StubStorage))).await
}

async fn build_app(
    grid: ScriptedGrid,
    config: ServerConfig,
    storage: Option<Arc<dyn MediaStorage>>,
) -> TestApp {
    let tmp = TempDir::new().expect("create temp dir");
    let store: Arc<dyn GalleryStore> = Arc::new(
        FileGalleryStore::open(tmp.path().join("gallery.json"), config.gallery_max_items)
            .await
            .expect("open gallery store"),
    );

    let grid = Arc::new(grid);
    let state = AppState {
        catalog: Arc::new(test_catalog()),
        resolver: Arc::new(Resolver::new()),
        grid: grid.clone(),
        store: store.clone(),
        model_vault: Arc::new(ModelVaultClient::new(
            config.modelvault.rpc_url.clone(),
            config.modelvault.contract.clone(),
            false,
        )),
        recipe_vault: Arc::new(RecipeVaultClient::new(
            config.recipevault.rpc_url.clone(),
            config.recipevault.contract.clone(),
            false,
        )),
        storage,
        config: Arc::new(config),
    };

    TestApp {
        router: build_app_router(state),
        grid,
        store,
        _tmp: tmp,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &TestApp, path: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &TestApp, path: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

/// DELETE with an optional `X-Wallet-Address` header.
pub async fn delete(app: &TestApp, path: &str, wallet: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("DELETE").uri(path);
    if let Some(wallet) = wallet {
        builder = builder.header("x-wallet-address", wallet);
    }
    let request = builder.body(Body::empty()).unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a status code and return the error body.
pub async fn expect_error(
    response: Response<Body>,
    status: StatusCode,
    code: &str,
) -> serde_json::Value {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    json
}
