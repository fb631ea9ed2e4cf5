//! S3-compatible storage client for R2 buckets.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use easel_core::media;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No credential set was configured for the requested operation.
    #[error("No R2 client available")]
    NotConfigured,

    /// Presigning or the S3 request itself failed.
    #[error("R2 request failed: {0}")]
    Request(String),
}

/// Connection settings for both R2 credential sets. Either pair may be
/// absent; at least one must be present to build a client.
#[derive(Debug, Clone, Default)]
pub struct R2Config {
    pub endpoint: String,
    pub transient_bucket: String,
    pub permanent_bucket: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub shared_key_id: String,
    pub shared_key_secret: String,
}

impl R2Config {
    fn has_transient(&self) -> bool {
        !self.access_key_id.is_empty() && !self.access_key_secret.is_empty()
    }

    fn has_shared(&self) -> bool {
        !self.shared_key_id.is_empty() && !self.shared_key_secret.is_empty()
    }

    pub fn is_configured(&self) -> bool {
        self.has_transient() || self.has_shared()
    }
}

// ---------------------------------------------------------------------------
// MediaStorage trait
// ---------------------------------------------------------------------------

/// Storage operations the gateway needs for media recovery.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Public URL for a generation's media. Always the CDN form; the CDN
    /// sets correct content types for video stored under `.webp` keys,
    /// which presigned bucket URLs do not.
    fn media_url(&self, generation_id: &str) -> String {
        media::cdn_url_for_id(generation_id)
    }

    /// Presigned GET URL for direct bucket access. Tries the permanent
    /// bucket first; shared media outlives the transient bucket's TTL.
    async fn download_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    /// Whether the object exists in either bucket.
    async fn object_exists(&self, object_key: &str) -> bool;

    /// Remove an object from the transient bucket.
    async fn delete_object(&self, object_key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// R2Storage
// ---------------------------------------------------------------------------

/// Live R2 client over `aws-sdk-s3`.
pub struct R2Storage {
    transient: Option<aws_sdk_s3::Client>,
    shared: Option<aws_sdk_s3::Client>,
    transient_bucket: String,
    permanent_bucket: String,
}

impl R2Storage {
    /// Build clients for whichever credential pairs are set.
    pub async fn connect(config: R2Config) -> Result<Self, StorageError> {
        if !config.is_configured() {
            return Err(StorageError::NotConfigured);
        }

        let transient = if config.has_transient() {
            Some(
                Self::build_client(
                    &config.endpoint,
                    &config.access_key_id,
                    &config.access_key_secret,
                )
                .await,
            )
        } else {
            None
        };

        let shared = if config.has_shared() {
            Some(
                Self::build_client(
                    &config.endpoint,
                    &config.shared_key_id,
                    &config.shared_key_secret,
                )
                .await,
            )
        } else {
            None
        };

        tracing::info!(
            transient = transient.is_some(),
            shared = shared.is_some(),
            "R2 storage initialized"
        );

        Ok(Self {
            transient,
            shared,
            transient_bucket: config.transient_bucket,
            permanent_bucket: config.permanent_bucket,
        })
    }

    async fn build_client(endpoint: &str, key_id: &str, secret: &str) -> aws_sdk_s3::Client {
        let credentials = Credentials::from_keys(key_id, secret, None);
        let base = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("auto"))
            .load()
            .await;
        // R2 requires path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&base)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();
        aws_sdk_s3::Client::from_conf(s3_config)
    }

    async fn presign(
        client: &aws_sdk_s3::Client,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let request = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl MediaStorage for R2Storage {
    async fn download_url(
        &self,
        object_key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        if let Some(client) = &self.shared {
            if let Ok(url) =
                Self::presign(client, &self.permanent_bucket, object_key, expires_in).await
            {
                return Ok(url);
            }
        }

        if let Some(client) = &self.transient {
            return Self::presign(client, &self.transient_bucket, object_key, expires_in).await;
        }

        Err(StorageError::NotConfigured)
    }

    async fn object_exists(&self, object_key: &str) -> bool {
        if let Some(client) = &self.shared {
            if client
                .head_object()
                .bucket(&self.permanent_bucket)
                .key(object_key)
                .send()
                .await
                .is_ok()
            {
                return true;
            }
        }

        if let Some(client) = &self.transient {
            return client
                .head_object()
                .bucket(&self.transient_bucket)
                .key(object_key)
                .send()
                .await
                .is_ok();
        }

        false
    }

    async fn delete_object(&self, object_key: &str) -> Result<(), StorageError> {
        let client = self.transient.as_ref().ok_or(StorageError::NotConfigured)?;
        client
            .delete_object()
            .bucket(&self.transient_bucket)
            .key(object_key)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(())
    }
}
