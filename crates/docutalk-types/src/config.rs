//! Client configuration types for DocuTalk.
//!
//! `ClientConfig` represents the `config.toml` in the data directory that
//! controls the backend URL, model names, credit conversion and creation
//! limits. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, without the `/api` suffix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for regular asks and chatbot creation.
    #[serde(default = "default_standard_model")]
    pub standard_model: String,

    /// Model used when the premium tier is requested.
    #[serde(default = "default_premium_model")]
    pub premium_model: String,

    /// Credits per dollar, used for the provisional ledger update.
    #[serde(default = "default_credit_exchange_rate")]
    pub credit_exchange_rate: f64,

    /// Whole-request timeout for streamed calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub creation_limits: CreationLimits,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_standard_model() -> String {
    "gemini-2.0-flash-001".to_string()
}

fn default_premium_model() -> String {
    "gemini-1.5-pro-002".to_string()
}

fn default_credit_exchange_rate() -> f64 {
    1000.0
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            standard_model: default_standard_model(),
            premium_model: default_premium_model(),
            credit_exchange_rate: default_credit_exchange_rate(),
            request_timeout_secs: default_request_timeout_secs(),
            creation_limits: CreationLimits::default(),
        }
    }
}

impl ClientConfig {
    /// Model name for the requested tier.
    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.standard_model,
            ModelTier::Premium => &self.premium_model,
        }
    }
}

/// Which model family to ask with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Standard,
    Premium,
}

/// Upload limits enforced before a creation request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationLimits {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_files() -> usize {
    20
}

fn default_max_pages() -> u32 {
    200
}

impl Default for CreationLimits {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_pages: default_max_pages(),
        }
    }
}
