use easel_cloud::R2Config;

/// Settings for one chain-registry reader.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub enabled: bool,
    pub rpc_url: String,
    pub contract: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default `0.0.0.0:4000`).
    pub addr: String,
    /// Grid API base URL.
    pub grid_api_url: String,
    /// `Client-Agent` header value sent on every grid call.
    pub grid_client_agent: String,
    /// Default upstream API key for submissions without a per-request key.
    /// Empty means no default; such requests must carry their own key.
    pub grid_api_key: String,
    /// Path to the curated model presets JSON file.
    pub model_presets_path: String,
    /// Path to the curated styles JSON document.
    pub styles_path: String,
    /// Allowed CORS origins; empty list means any origin.
    pub allowed_origins: Vec<String>,
    /// File-store path, used only when `DATABASE_URL` is absent.
    pub gallery_store_path: String,
    /// File-store item cap.
    pub gallery_max_items: usize,
    /// Postgres URL; presence selects the relational backend and enables
    /// per-wallet job tracking.
    pub database_url: Option<String>,
    /// Model-registry reader.
    pub modelvault: VaultConfig,
    /// Recipe-registry reader.
    pub recipevault: VaultConfig,
    /// Object storage credentials; inactive unless a key is present.
    pub r2: R2Config,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                                      |
    /// |-----------------------|----------------------------------------------|
    /// | `EASEL_ADDR`          | `0.0.0.0:4000`                               |
    /// | `GRID_API_URL`        | `https://api.aipowergrid.io/api/v2`          |
    /// | `GRID_CLIENT_AGENT`   | `easel:1.0`                                  |
    /// | `GRID_API_KEY`        | *(empty)*                                    |
    /// | `MODEL_PRESETS_PATH`  | `config/model_presets.json`                  |
    /// | `STYLES_PATH`         | `config/styles.json`                         |
    /// | `ALLOWED_ORIGINS`     | *(empty; any origin)*                        |
    /// | `GALLERY_STORE_PATH`  | `data/gallery.json`                          |
    /// | `GALLERY_MAX_ITEMS`   | `5000`                                       |
    /// | `DATABASE_URL`        | *(unset; file store)*                        |
    /// | `MODELVAULT_ENABLED`  | `true`                                       |
    /// | `MODELVAULT_RPC_URL`  | `https://mainnet.base.org`                   |
    /// | `MODELVAULT_CONTRACT` | `0x79F39f2a0eA476f53994812e6a8f3C8CFe08c609` |
    /// | `RECIPEVAULT_ENABLED` | `true`                                       |
    /// | `RECIPEVAULT_RPC_URL` | same default as the model vault              |
    /// | `RECIPEVAULT_CONTRACT`| same default as the model vault              |
    /// | `R2_ENDPOINT`         | *(empty)*                                    |
    /// | `R2_TRANSIENT_BUCKET` | `horde-transient`                            |
    /// | `R2_PERMANENT_BUCKET` | `horde-permanent`                            |
    /// | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`       | *(empty)*      |
    /// | `SHARED_AWS_ACCESS_ID` / `SHARED_AWS_ACCESS_KEY`    | *(empty)*      |
    pub fn from_env() -> Self {
        Self {
            addr: env_or("EASEL_ADDR", "0.0.0.0:4000"),
            grid_api_url: env_or("GRID_API_URL", "https://api.aipowergrid.io/api/v2"),
            grid_client_agent: env_or("GRID_CLIENT_AGENT", "easel:1.0"),
            grid_api_key: env_or("GRID_API_KEY", ""),
            model_presets_path: env_or("MODEL_PRESETS_PATH", "config/model_presets.json"),
            styles_path: env_or("STYLES_PATH", "config/styles.json"),
            allowed_origins: split_and_clean(&env_or("ALLOWED_ORIGINS", "")),
            gallery_store_path: env_or("GALLERY_STORE_PATH", "data/gallery.json"),
            gallery_max_items: env_or("GALLERY_MAX_ITEMS", "5000")
                .parse()
                .unwrap_or(5000),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            modelvault: VaultConfig {
                enabled: env_or("MODELVAULT_ENABLED", "true") == "true",
                rpc_url: env_or("MODELVAULT_RPC_URL", easel_chain::DEFAULT_RPC_URL),
                contract: env_or("MODELVAULT_CONTRACT", easel_chain::DEFAULT_CONTRACT_ADDRESS),
            },
            recipevault: VaultConfig {
                enabled: env_or("RECIPEVAULT_ENABLED", "true") == "true",
                rpc_url: env_or("RECIPEVAULT_RPC_URL", easel_chain::DEFAULT_RPC_URL),
                contract: env_or("RECIPEVAULT_CONTRACT", easel_chain::DEFAULT_CONTRACT_ADDRESS),
            },
            r2: R2Config {
                endpoint: env_or("R2_ENDPOINT", ""),
                transient_bucket: env_or("R2_TRANSIENT_BUCKET", "horde-transient"),
                permanent_bucket: env_or("R2_PERMANENT_BUCKET", "horde-permanent"),
                access_key_id: env_or("AWS_ACCESS_KEY_ID", ""),
                access_key_secret: env_or("AWS_SECRET_ACCESS_KEY", ""),
                shared_key_id: env_or("SHARED_AWS_ACCESS_ID", ""),
                shared_key_secret: env_or("SHARED_AWS_ACCESS_KEY", ""),
            },
        }
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn split_and_clean(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_clean_drops_blanks() {
        let origins = split_and_clean(" https://a.example , , https://b.example ");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn split_and_clean_empty_input_is_empty() {
        assert!(split_and_clean("").is_empty());
    }
}
