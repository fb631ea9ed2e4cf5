//! Postgres-backed gallery store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::{GalleryItem, GalleryPage, GalleryQuery, GenerationJob, NewGalleryItem};
use crate::store::{GalleryStore, StoreError};

const COLUMNS: &str = "job_id, model_id, model_name, prompt, negative_prompt, kind, \
     is_nsfw, is_public, wallet_address, params, media_urls, generation_ids, tags, created_at";

const JOB_COLUMNS: &str = "job_id, wallet_address, status, error, created_at, updated_at";

/// Row shape with `Json` wrappers for the JSONB columns.
#[derive(sqlx::FromRow)]
struct GalleryRow {
    job_id: String,
    model_id: String,
    model_name: String,
    prompt: String,
    negative_prompt: String,
    kind: String,
    is_nsfw: bool,
    is_public: bool,
    wallet_address: String,
    params: Json<serde_json::Value>,
    media_urls: Json<Vec<String>>,
    generation_ids: Json<Vec<String>>,
    tags: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl From<GalleryRow> for GalleryItem {
    fn from(row: GalleryRow) -> Self {
        GalleryItem {
            job_id: row.job_id,
            model_id: row.model_id,
            model_name: row.model_name,
            prompt: row.prompt,
            negative_prompt: row.negative_prompt,
            kind: row.kind,
            is_nsfw: row.is_nsfw,
            is_public: row.is_public,
            wallet_address: row.wallet_address,
            params: row.params.0,
            media_urls: row.media_urls.0,
            generation_ids: row.generation_ids.0,
            tags: row.tags.0,
            created_at: row.created_at,
        }
    }
}

/// Gallery store over a `PgPool`.
pub struct PostgresGalleryStore {
    pool: PgPool,
}

impl PostgresGalleryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Anchor a user search term at word starts: escape regex metacharacters,
/// then prepend the `\m` word-boundary marker.
fn word_start_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    for ch in search.to_lowercase().chars() {
        if "\\^$.|?*+()[]{}".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("\\m{escaped}")
}

#[async_trait]
impl GalleryStore for PostgresGalleryStore {
    async fn add(&self, item: NewGalleryItem) -> Result<(), StoreError> {
        let item = item.into_item(Utc::now());
        let query = format!(
            "INSERT INTO gallery_items ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (job_id) DO UPDATE SET \
                media_urls = EXCLUDED.media_urls, \
                is_public = EXCLUDED.is_public"
        );
        sqlx::query(&query)
            .bind(&item.job_id)
            .bind(&item.model_id)
            .bind(&item.model_name)
            .bind(&item.prompt)
            .bind(&item.negative_prompt)
            .bind(&item.kind)
            .bind(item.is_nsfw)
            .bind(item.is_public)
            .bind(item.wallet_address.to_lowercase())
            .bind(Json(&item.params))
            .bind(Json(&item.media_urls))
            .bind(Json(&item.generation_ids))
            .bind(Json(&item.tags))
            .bind(item.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<GalleryItem>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM gallery_items WHERE job_id = $1");
        let row = sqlx::query_as::<_, GalleryRow>(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(GalleryItem::from))
    }

    async fn list(&self, query: &GalleryQuery) -> Result<GalleryPage, StoreError> {
        let mut clauses = vec!["is_public = TRUE".to_string()];
        let mut arg = 0;

        let kind_filter = (!query.kind.is_empty() && query.kind != "all").then(|| {
            arg += 1;
            clauses.push(format!("kind = ${arg}"));
            query.kind.clone()
        });
        let search_filter = (!query.search.is_empty()).then(|| {
            arg += 1;
            clauses.push(format!(
                "(prompt ~* ${arg} OR model_name ~* ${arg} OR EXISTS ( \
                     SELECT 1 FROM jsonb_array_elements_text(tags) AS t WHERE t ~* ${arg}))"
            ));
            word_start_pattern(&query.search)
        });

        let where_clause = clauses.join(" AND ");

        let count_sql = format!("SELECT COUNT(*) FROM gallery_items WHERE {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(kind) = &kind_filter {
            count_query = count_query.bind(kind);
        }
        if let Some(pattern) = &search_filter {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT {COLUMNS} FROM gallery_items WHERE {where_clause} \
             ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            arg + 1,
            arg + 2
        );
        let mut list_query = sqlx::query_as::<_, GalleryRow>(&list_sql);
        if let Some(kind) = &kind_filter {
            list_query = list_query.bind(kind);
        }
        if let Some(pattern) = &search_filter {
            list_query = list_query.bind(pattern);
        }
        let rows = list_query
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(GalleryItem::from).collect();
        Ok(GalleryPage::new(items, total, query.offset))
    }

    async fn list_by_wallet(
        &self,
        wallet: &str,
        limit: i64,
    ) -> Result<Vec<GalleryItem>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM gallery_items \
             WHERE LOWER(wallet_address) = LOWER($1) \
             ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, GalleryRow>(&query)
            .bind(wallet)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GalleryItem::from).collect())
    }

    async fn delete(&self, job_id: &str, requester_wallet: &str) -> Result<(), StoreError> {
        let owner: Option<String> =
            sqlx::query_scalar("SELECT wallet_address FROM gallery_items WHERE job_id = $1")
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?;

        let owner = owner.ok_or(StoreError::NotFound)?;

        if owner.is_empty() {
            // Items from before wallet attribution have no owner on record.
            tracing::warn!(job_id, requester = requester_wallet,
                "Deleting legacy gallery item with no recorded owner");
        } else if !owner.eq_ignore_ascii_case(requester_wallet) {
            tracing::warn!(job_id, owner = %owner, requester = requester_wallet,
                "Rejected gallery delete from non-owner");
            return Err(StoreError::Forbidden);
        }

        let result = sqlx::query("DELETE FROM gallery_items WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gallery_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn record_job(&self, job_id: &str, wallet: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO generation_jobs (job_id, wallet_address) VALUES ($1, $2) \
             ON CONFLICT (job_id) DO NOTHING",
        )
        .bind(job_id)
        .bind(wallet.to_lowercase())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_job_status(
        &self,
        job_id: &str,
        status: &str,
        error: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE generation_jobs \
             SET status = $2, error = $3, updated_at = NOW() \
             WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(status)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn jobs_by_wallet(
        &self,
        wallet: &str,
        limit: i64,
    ) -> Result<Vec<GenerationJob>, StoreError> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM generation_jobs \
             WHERE wallet_address = LOWER($1) \
             ORDER BY created_at DESC LIMIT $2"
        );
        let jobs = sqlx::query_as::<_, GenerationJob>(&query)
            .bind(wallet)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }
}
