//! The `GalleryStore` contract implemented by both backends.

use async_trait::async_trait;

use crate::models::{GalleryItem, GalleryPage, GalleryQuery, GenerationJob, NewGalleryItem};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No item with the given job id.
    #[error("gallery item not found")]
    NotFound,

    /// The requester does not own the item.
    #[error("requester does not own this item")]
    Forbidden,

    /// The relational backend failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The file backend failed to read or write its document.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file backend's document is not valid JSON.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Gallery persistence operations.
///
/// Job-history methods default to no-ops so the file backend can skip
/// tracking entirely; only the Postgres backend overrides them.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    /// Insert an item, or refresh `media_urls` and `is_public` when the
    /// job id already exists. Adding is idempotent.
    async fn add(&self, item: NewGalleryItem) -> Result<(), StoreError>;

    async fn get(&self, job_id: &str) -> Result<Option<GalleryItem>, StoreError>;

    /// Public items only, newest first, filtered and paginated.
    async fn list(&self, query: &GalleryQuery) -> Result<GalleryPage, StoreError>;

    /// Every item owned by a wallet (public or not), newest first.
    async fn list_by_wallet(&self, wallet: &str, limit: i64)
        -> Result<Vec<GalleryItem>, StoreError>;

    /// Delete with ownership enforcement: unknown id is `NotFound`, an
    /// owner mismatch (case-insensitive) is `Forbidden`, and an empty
    /// recorded owner permits deletion by anyone (legacy items; logged).
    async fn delete(&self, job_id: &str, requester_wallet: &str) -> Result<(), StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Record a freshly submitted job for the wallet's history.
    async fn record_job(&self, _job_id: &str, _wallet: &str) -> Result<(), StoreError> {
        Ok(())
    }

    /// Write back the latest observed status of a tracked job.
    async fn update_job_status(
        &self,
        _job_id: &str,
        _status: &str,
        _error: &str,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    /// Tracked jobs for a wallet, newest first. Empty when tracking is
    /// inactive.
    async fn jobs_by_wallet(
        &self,
        _wallet: &str,
        _limit: i64,
    ) -> Result<Vec<GenerationJob>, StoreError> {
        Ok(Vec::new())
    }
}
