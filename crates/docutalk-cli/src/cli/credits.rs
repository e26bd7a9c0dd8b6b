//! Credit display and gating.

use anyhow::Result;
use console::style;

use docutalk_core::credits::{CreditLedger, CreditSnapshot};

use crate::state::AppState;

use super::format::styled_credits;

/// Show remaining credits (`docutalk credits`).
pub async fn show_credits(state: &AppState, json: bool) -> Result<()> {
    let profile = state.load_account().await?;
    let snapshot = state.ledger.snapshot();

    if json {
        let out = serde_json::json!({
            "email": profile.email,
            "total": snapshot.total,
            "consumed": snapshot.consumed,
            "remaining": snapshot.remaining(),
            "period_dollar_amount": profile.period_dollar_amount,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {}  {}",
        style("Account:").bold(),
        style(&profile.email).cyan()
    );
    println!("  {}  {}", style("Credits:").bold(), styled_credits(&snapshot));
    println!();
    Ok(())
}

/// Refuse an operation when the balance is unknown or used up.
///
/// The ledger never clamps; this is the only place a low balance blocks
/// anything.
pub fn ensure_credits(ledger: &CreditLedger) -> Result<()> {
    check_snapshot(&ledger.snapshot())
}

fn check_snapshot(snapshot: &CreditSnapshot) -> Result<()> {
    match snapshot.remaining() {
        Some(remaining) if remaining > 0 => Ok(()),
        Some(remaining) => anyhow::bail!(
            "No credits left ({remaining}). Credits reset at the start of the next period."
        ),
        None => anyhow::bail!("Credit balance is not known yet. Try again in a moment."),
    }
}
