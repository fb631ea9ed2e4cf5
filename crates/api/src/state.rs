use std::sync::Arc;

use easel_chain::{ModelVaultClient, RecipeVaultClient};
use easel_cloud::MediaStorage;
use easel_core::catalog::Catalog;
use easel_core::resolve::Resolver;
use easel_db::GalleryStore;
use easel_grid::GridApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (everything is behind `Arc`). The grid and
/// store sit behind trait objects so integration tests can substitute
/// scripted doubles.
#[derive(Clone)]
pub struct AppState {
    /// Immutable preset catalog, loaded once at boot.
    pub catalog: Arc<Catalog>,
    /// Model-name resolver (alias tables and match stages).
    pub resolver: Arc<Resolver>,
    /// Grid API client.
    pub grid: Arc<dyn GridApi>,
    /// Gallery store backend (Postgres or file).
    pub store: Arc<dyn GalleryStore>,
    /// On-chain model registry reader.
    pub model_vault: Arc<ModelVaultClient>,
    /// On-chain recipe registry reader.
    pub recipe_vault: Arc<RecipeVaultClient>,
    /// Object storage, when credentials were configured.
    pub storage: Option<Arc<dyn MediaStorage>>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
