//! `docutalk login`: store a bearer token for later commands.

use anyhow::{Context, Result};
use console::style;
use dialoguer::Password;
use secrecy::SecretString;

use docutalk_infra::auth::store_token;
use docutalk_infra::config::resolve_data_dir;

/// Prompt for a token (hidden input) and save it under the data directory.
pub async fn login(json: bool) -> Result<()> {
    let data_dir = resolve_data_dir();

    let token: String = Password::new()
        .with_prompt("DocuTalk token")
        .interact()
        .context("Failed to read token")?;
    let token = SecretString::from(token);

    store_token(&data_dir, &token)
        .await
        .with_context(|| format!("Failed to write token to {}", data_dir.display()))?;

    if json {
        let out = serde_json::json!({ "stored": true, "data_dir": data_dir.display().to_string() });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Token saved to {}",
            style("✓").green().bold(),
            style(data_dir.join("token").display()).dim()
        );
        println!();
    }
    Ok(())
}
