//! Reconciling the ledger with the backend.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use docutalk_types::account::UserProfile;
use docutalk_types::error::ClientError;

use crate::backend::ChatbotBackend;

use super::ledger::CreditLedger;

/// Fire-and-forget refetch of the consumed price.
///
/// Several refetches may be in flight at once; whichever completes last
/// sets the balance. Failures are logged and leave the provisional balance
/// in place.
pub fn spawn_refetch<B>(backend: Arc<B>, token: Arc<SecretString>, ledger: CreditLedger) -> JoinHandle<()>
where
    B: ChatbotBackend + 'static,
{
    tokio::spawn(async move {
        match backend.consumed_price(&token).await {
            Ok(price) => {
                debug!(consumed_price = price, "credit refetch complete");
                ledger.apply(price);
            }
            Err(e) => warn!(error = %e, "credit refetch failed, keeping provisional balance"),
        }
    })
}

/// Fetch the profile and consumed price, and reset the ledger from them.
pub async fn refresh_account<B: ChatbotBackend>(
    backend: &B,
    token: &SecretString,
    ledger: &CreditLedger,
) -> Result<UserProfile, ClientError> {
    let profile = backend.fetch_profile(token).await?;
    ledger.set_allowance(profile.period_dollar_amount);
    let price = backend.consumed_price(token).await?;
    ledger.apply(price);
    debug!(
        chatbots = profile.chatbots.len(),
        remaining = ?ledger.remaining(),
        "account refreshed"
    );
    Ok(profile)
}
