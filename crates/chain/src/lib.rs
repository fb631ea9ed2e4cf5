//! On-chain model and recipe registries.
//!
//! The gateway reads two registries from a single diamond-proxy contract on
//! Base Mainnet: the model vault (registered model metadata and generation
//! constraints) and the recipe vault (public ComfyUI workflows). Both are
//! read via raw `eth_call` with hand-decoded ABI tuples, cached in memory,
//! and rate-limited so bulk refreshes stay under the public RPC's limits.

pub mod abi;
pub mod modelvault;
pub mod recipevault;
pub mod rpc;
pub mod workflow;

pub use modelvault::{ChainModel, ChainModelKind, ModelVaultClient};
pub use recipevault::{ChainRecipe, RecipeVaultClient};
pub use rpc::{ChainError, RpcClient};

/// Public RPC endpoint for Base Mainnet.
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";

/// Diamond proxy hosting both vault facets.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x79F39f2a0eA476f53994812e6a8f3C8CFe08c609";
