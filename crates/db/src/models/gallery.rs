//! Gallery item and listing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shared generation. `job_id` is the public identifier; `wallet_address`
/// is the owner and may be empty for items that predate wallet attribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub job_id: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub model_name: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    /// `"image"` or `"video"`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_nsfw: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub wallet_address: String,
    /// Generation parameter snapshot taken at share time.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Media URLs cached when the item was shared; refreshed on re-add.
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub generation_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for adding (or re-adding) a gallery item. The store assigns
/// `created_at` on first insert.
#[derive(Debug, Clone, Default)]
pub struct NewGalleryItem {
    pub job_id: String,
    pub model_id: String,
    pub model_name: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub kind: String,
    pub is_nsfw: bool,
    pub is_public: bool,
    pub wallet_address: String,
    pub params: serde_json::Value,
    pub media_urls: Vec<String>,
    pub generation_ids: Vec<String>,
    pub tags: Vec<String>,
}

impl NewGalleryItem {
    pub fn into_item(self, created_at: DateTime<Utc>) -> GalleryItem {
        GalleryItem {
            job_id: self.job_id,
            model_id: self.model_id,
            model_name: self.model_name,
            prompt: self.prompt,
            negative_prompt: self.negative_prompt,
            kind: if self.kind.is_empty() {
                "image".into()
            } else {
                self.kind
            },
            is_nsfw: self.is_nsfw,
            is_public: self.is_public,
            wallet_address: self.wallet_address,
            params: self.params,
            media_urls: self.media_urls,
            generation_ids: self.generation_ids,
            tags: self.tags,
            created_at,
        }
    }
}

/// Filters for the public listing.
#[derive(Debug, Clone, Default)]
pub struct GalleryQuery {
    /// Kind filter; empty or `"all"` passes everything.
    pub kind: String,
    /// Free-text search, matched at word starts.
    pub search: String,
    pub limit: i64,
    pub offset: i64,
}

/// One page of the public listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPage {
    pub items: Vec<GalleryItem>,
    pub total: i64,
    pub has_more: bool,
    pub next_offset: i64,
}

impl GalleryPage {
    /// Derive pagination fields from the page contents.
    pub fn new(items: Vec<GalleryItem>, total: i64, offset: i64) -> Self {
        let next_offset = offset + items.len() as i64;
        Self {
            has_more: next_offset < total,
            next_offset,
            items,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_type() {
        let item = NewGalleryItem {
            job_id: "j1".into(),
            prompt: "a cat".into(),
            kind: "video".into(),
            ..Default::default()
        }
        .into_item(Utc::now());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["jobId"], "j1");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn empty_kind_defaults_to_image() {
        let item = NewGalleryItem {
            job_id: "j1".into(),
            prompt: "p".into(),
            ..Default::default()
        }
        .into_item(Utc::now());
        assert_eq!(item.kind, "image");
    }

    #[test]
    fn page_pagination_fields() {
        let page = GalleryPage::new(Vec::new(), 40, 40);
        assert!(!page.has_more);
        assert_eq!(page.next_offset, 40);

        let items = vec![
            NewGalleryItem {
                job_id: "a".into(),
                prompt: "p".into(),
                ..Default::default()
            }
            .into_item(Utc::now()),
        ];
        let page = GalleryPage::new(items, 40, 0);
        assert!(page.has_more);
        assert_eq!(page.next_offset, 1);
    }
}
