//! Client configuration loader for DocuTalk.
//!
//! Reads `config.toml` from the data directory (`~/.docutalk/` by default)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use docutalk_types::config::ClientConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DOCUTALK_DATA_DIR";

/// Environment variable overriding `api_url`.
pub const API_URL_ENV: &str = "DOCUTALK_API_URL";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `DOCUTALK_DATA_DIR` environment variable
/// 2. `~/.docutalk`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".docutalk");
    }

    PathBuf::from(".docutalk")
}

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`ClientConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
///
/// `DOCUTALK_API_URL` overrides `api_url` in every case.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let mut config = read_config_file(data_dir).await;
    apply_api_url_override(&mut config, std::env::var(API_URL_ENV).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

fn apply_api_url_override(config: &mut ClientConfig, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        tracing::debug!(api_url = %url, "API URL overridden from environment");
        config.api_url = url;
    }
}
