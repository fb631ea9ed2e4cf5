//! JSON-file gallery store.
//!
//! Keeps every item in memory (newest first) under an async `RwLock` and
//! persists the whole vector as one pretty-printed JSON document after
//! each write. Suited to single-instance deployments without a database;
//! the vector is trimmed to a configured cap so the file cannot grow
//! unbounded. Job-history tracking is not supported here and uses the
//! trait's no-op defaults.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{GalleryItem, GalleryPage, GalleryQuery, NewGalleryItem};
use crate::store::{GalleryStore, StoreError};

/// Default cap on stored items.
pub const DEFAULT_MAX_ITEMS: usize = 5000;

pub struct FileGalleryStore {
    path: PathBuf,
    max_items: usize,
    items: RwLock<Vec<GalleryItem>>,
}

impl FileGalleryStore {
    /// Open a store backed by `path`, loading any existing document. A
    /// missing file is an empty store; a corrupt one is an error rather
    /// than silent data loss.
    pub async fn open(path: PathBuf, max_items: usize) -> Result<Self, StoreError> {
        let items = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice::<Vec<GalleryItem>>(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), items = items.len(), "File gallery store opened");

        Ok(Self {
            path,
            max_items: if max_items == 0 {
                DEFAULT_MAX_ITEMS
            } else {
                max_items
            },
            items: RwLock::new(items),
        })
    }

    async fn persist(&self, items: &[GalleryItem]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(items)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

/// True when any word of `haystack` starts with `needle` (both already
/// lower-cased by the caller).
fn word_start_match(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .split_whitespace()
        .any(|word| word.starts_with(needle))
}

fn matches_search(item: &GalleryItem, needle: &str) -> bool {
    word_start_match(&item.prompt, needle)
        || word_start_match(&item.model_name, needle)
        || item.tags.iter().any(|tag| word_start_match(tag, needle))
}

#[async_trait]
impl GalleryStore for FileGalleryStore {
    async fn add(&self, item: NewGalleryItem) -> Result<(), StoreError> {
        let mut items = self.items.write().await;

        if let Some(existing) = items.iter_mut().find(|i| i.job_id == item.job_id) {
            existing.media_urls = item.media_urls;
            existing.is_public = item.is_public;
        } else {
            items.insert(0, item.into_item(Utc::now()));
            items.truncate(self.max_items);
        }

        self.persist(&items).await
    }

    async fn get(&self, job_id: &str) -> Result<Option<GalleryItem>, StoreError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|i| i.job_id == job_id).cloned())
    }

    async fn list(&self, query: &GalleryQuery) -> Result<GalleryPage, StoreError> {
        let items = self.items.read().await;
        let needle = query.search.to_lowercase();
        let filter_kind = !query.kind.is_empty() && query.kind != "all";

        let matching: Vec<&GalleryItem> = items
            .iter()
            .filter(|i| i.is_public)
            .filter(|i| !filter_kind || i.kind == query.kind)
            .filter(|i| needle.is_empty() || matches_search(i, &needle))
            .collect();

        let total = matching.len() as i64;
        let page: Vec<GalleryItem> = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(GalleryPage::new(page, total, query.offset))
    }

    async fn list_by_wallet(
        &self,
        wallet: &str,
        limit: i64,
    ) -> Result<Vec<GalleryItem>, StoreError> {
        if wallet.is_empty() {
            return Ok(Vec::new());
        }
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|i| i.wallet_address.eq_ignore_ascii_case(wallet))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, job_id: &str, requester_wallet: &str) -> Result<(), StoreError> {
        let mut items = self.items.write().await;

        let index = items
            .iter()
            .position(|i| i.job_id == job_id)
            .ok_or(StoreError::NotFound)?;

        let owner = &items[index].wallet_address;
        if owner.is_empty() {
            tracing::warn!(job_id, requester = requester_wallet,
                "Deleting legacy gallery item with no recorded owner");
        } else if !owner.eq_ignore_ascii_case(requester_wallet) {
            tracing::warn!(job_id, owner = %owner, requester = requester_wallet,
                "Rejected gallery delete from non-owner");
            return Err(StoreError::Forbidden);
        }

        items.remove(index);
        self.persist(&items).await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.items.read().await.len() as i64)
    }
}
