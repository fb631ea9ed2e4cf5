//! Per-wallet job history rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked generation job. History is best-effort: rows exist only
/// when the relational backend was active and the submitter supplied a
/// wallet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub job_id: String,
    pub wallet_address: String,
    pub status: String,
    #[serde(default)]
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
