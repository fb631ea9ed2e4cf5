use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use easel_api::config::ServerConfig;
use easel_api::router::build_app_router;
use easel_api::state::AppState;
use easel_chain::{ModelVaultClient, RecipeVaultClient};
use easel_cloud::{MediaStorage, R2Storage};
use easel_core::catalog::Catalog;
use easel_core::resolve::Resolver;
use easel_db::{FileGalleryStore, GalleryStore, PostgresGalleryStore};
use easel_grid::GridClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "easel_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(addr = %config.addr, grid = %config.grid_api_url, "Loaded server configuration");

    // --- Model catalog ---
    let catalog = Catalog::load(&config.model_presets_path)
        .expect("Failed to load model presets");
    tracing::info!(presets = catalog.len(), "Model catalog loaded");

    let resolver = Arc::new(Resolver::new());

    // --- Grid client ---
    let grid = Arc::new(GridClient::new(
        config.grid_api_url.clone(),
        config.grid_client_agent.clone(),
    ));

    // --- Chain readers ---
    let model_vault = Arc::new(ModelVaultClient::new(
        config.modelvault.rpc_url.clone(),
        config.modelvault.contract.clone(),
        config.modelvault.enabled,
    ));
    let recipe_vault = Arc::new(RecipeVaultClient::new(
        config.recipevault.rpc_url.clone(),
        config.recipevault.contract.clone(),
        config.recipevault.enabled,
    ));
    tracing::info!(
        model_vault = model_vault.is_enabled(),
        recipe_vault = recipe_vault.is_enabled(),
        "Chain readers configured"
    );

    // --- Media storage ---
    let storage: Option<Arc<dyn MediaStorage>> = if config.r2.is_configured() {
        match R2Storage::connect(config.r2.clone()).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                // Media recovery falls back to cached URLs without R2.
                tracing::warn!(error = %e, "R2 storage unavailable, continuing without it");
                None
            }
        }
    } else {
        tracing::info!("No R2 credentials configured, media recovery uses cached URLs");
        None
    };

    // --- Gallery store ---
    let store: Arc<dyn GalleryStore> = match &config.database_url {
        Some(database_url) => {
            let pool = easel_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            easel_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            easel_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PostgresGalleryStore::new(pool))
        }
        None => {
            let store = FileGalleryStore::open(
                config.gallery_store_path.clone().into(),
                config.gallery_max_items,
            )
            .await
            .expect("Failed to open gallery store file");
            tracing::info!(path = %config.gallery_store_path, "Using file-backed gallery store");
            Arc::new(store)
        }
    };

    // --- App state ---
    let addr = config.addr.clone();
    let state = AppState {
        catalog: Arc::new(catalog),
        resolver,
        grid,
        store,
        model_vault,
        recipe_vault,
        storage,
        config: Arc::new(config),
    };

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
