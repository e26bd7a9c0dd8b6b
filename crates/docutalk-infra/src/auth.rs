//! Bearer token resolution and storage.
//!
//! The token is looked up in `DOCUTALK_TOKEN` first, then in
//! `{data_dir}/token`. It is wrapped in [`SecretString`] as soon as it is
//! read and never logged.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "DOCUTALK_TOKEN";

const TOKEN_FILE: &str = "token";

/// Resolve the bearer token. Returns `None` when no source provides one.
pub async fn resolve_token(data_dir: &Path) -> Option<SecretString> {
    if let Some(token) = non_empty(std::env::var(TOKEN_ENV).ok()) {
        tracing::debug!("using token from {TOKEN_ENV}");
        return Some(SecretString::from(token));
    }
    read_token_file(data_dir).await
}

async fn read_token_file(data_dir: &Path) -> Option<SecretString> {
    let path = data_dir.join(TOKEN_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => non_empty(Some(content)).map(SecretString::from),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}", path.display());
            None
        }
    }
}

/// Persist the token to `{data_dir}/token`, readable by the owner only.
pub async fn store_token(data_dir: &Path, token: &SecretString) -> std::io::Result<()> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = data_dir.join(TOKEN_FILE);
    tokio::fs::write(&path, token.expose_secret().trim()).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
