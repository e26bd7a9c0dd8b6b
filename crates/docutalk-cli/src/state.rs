//! Application state wiring the services together.
//!
//! The core services are generic over the `ChatbotBackend` port; AppState
//! pins them to the reqwest-based `HttpBackend`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;

use docutalk_core::credits::{refresh_account, CreditLedger};
use docutalk_core::service::{ChatService, CreationService};
use docutalk_infra::auth::resolve_token;
use docutalk_infra::config::{load_client_config, resolve_data_dir};
use docutalk_infra::http::HttpBackend;
use docutalk_types::account::{ChatbotSummary, UserProfile};
use docutalk_types::config::{ClientConfig, ModelTier};

pub type ConcreteChatService = ChatService<HttpBackend>;
pub type ConcreteCreationService = CreationService<HttpBackend>;

/// Shared state for one CLI invocation.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<HttpBackend>,
    pub token: Arc<SecretString>,
    pub ledger: CreditLedger,
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config and token, build the backend.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_client_config(&data_dir).await;
        let token = resolve_token(&data_dir).await.ok_or_else(|| {
            anyhow::anyhow!("No DocuTalk token found. Set DOCUTALK_TOKEN or run: docutalk login")
        })?;
        let backend = HttpBackend::new(&config)?;
        let ledger = CreditLedger::new(config.credit_exchange_rate);

        tracing::debug!(api_url = %backend.base_url(), data_dir = %data_dir.display(), "state initialized");

        Ok(Self {
            backend: Arc::new(backend),
            token: Arc::new(token),
            ledger,
            config,
            data_dir,
        })
    }

    /// Fetch the profile and consumed price, seeding the ledger.
    pub async fn load_account(&self) -> anyhow::Result<UserProfile> {
        refresh_account(&*self.backend, &self.token, &self.ledger)
            .await
            .context("Failed to load account")
    }

    pub fn model(&self, premium: bool) -> &str {
        self.config.model(if premium {
            ModelTier::Premium
        } else {
            ModelTier::Standard
        })
    }

    pub fn chat_service(
        &self,
        chatbot: &ChatbotSummary,
        friendly_name: &str,
        premium: bool,
    ) -> ConcreteChatService {
        ChatService::new(
            self.backend.clone(),
            self.token.clone(),
            chatbot,
            friendly_name,
            self.model(premium),
            self.ledger.clone(),
        )
    }

    pub fn creation_service(&self, premium: bool) -> ConcreteCreationService {
        CreationService::new(
            self.backend.clone(),
            self.token.clone(),
            self.ledger.clone(),
            self.config.creation_limits,
            self.model(premium),
        )
    }
}
