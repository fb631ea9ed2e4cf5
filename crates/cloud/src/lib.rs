//! R2 object storage access.
//!
//! Workers upload finished media to Cloudflare R2 (S3-compatible) under
//! `{generation_id}.webp`. The gateway serves those objects through the
//! public CDN and only falls back to presigned URLs for direct bucket
//! access. Two credential sets exist: a transient bucket for fresh
//! generations and a permanent bucket for shared gallery media.

pub mod storage;

pub use storage::{MediaStorage, R2Config, R2Storage, StorageError};
