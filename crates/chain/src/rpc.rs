//! JSON-RPC transport for contract reads.
//!
//! The vaults are read-only, so the only method needed is `eth_call`
//! against the latest block. Requests are plain JSON-RPC 2.0 over HTTPS.

use std::time::Duration;

use serde::Deserialize;

use crate::abi::AbiError;

/// Deadline for a single RPC round trip.
const RPC_TIMEOUT: Duration = Duration::from_secs(15);

/// Error type for on-chain reads.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The HTTP request to the RPC endpoint failed.
    #[error("RPC request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The RPC node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response was not valid JSON-RPC or held malformed hex.
    #[error("Invalid RPC response: {0}")]
    Decode(String),

    /// The returned call data could not be ABI-decoded.
    #[error(transparent)]
    Abi(#[from] AbiError),
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Thin `eth_call` client over one RPC endpoint.
pub struct RpcClient {
    client: reqwest::Client,
    rpc_url: String,
}

impl RpcClient {
    pub fn new(rpc_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, rpc_url }
    }

    /// Execute `eth_call` against the latest block and return the raw
    /// returndata bytes.
    pub async fn eth_call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": to, "data": encode_hex(data)}, "latest"],
        });

        let response: RpcResponse = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| ChainError::Decode("missing result field".into()))?;
        decode_hex(&result)
    }
}

/// Render bytes as a `0x`-prefixed hex string.
pub fn encode_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(2 + data.len() * 2);
    out.push_str("0x");
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Parse a `0x`-prefixed hex string into bytes.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, ChainError> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.len() % 2 != 0 {
        return Err(ChainError::Decode(format!(
            "odd-length hex string ({} digits)",
            digits.len()
        )));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ChainError::Decode(format!("invalid hex at byte {}", i / 2)))
        })
        .collect()
}
