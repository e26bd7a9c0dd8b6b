//! DocuTalk REST API response bodies.
//!
//! Wire shapes only. The core never sees these; `HttpBackend` maps each of
//! them to a docutalk-types value.

use serde::Deserialize;

use docutalk_types::conversation::SourcesAnswer;
use docutalk_types::creation::CreationEstimate;

/// `POST /api/chatbots/create_conversation`
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
}

/// `POST /api/auth/get_remaining_credits`
///
/// `consumed_price` is null for a user with no usage recorded yet.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumedPriceResponse {
    #[serde(default)]
    pub consumed_price: Option<f64>,
}

/// `GET /api/chatbots/get_ask_estimation_duration`
#[derive(Debug, Clone, Deserialize)]
pub struct AskEstimationResponse {
    pub estimated_duration: f64,
}

/// `POST /api/chatbots/get_last_message_sources`
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesResponse {
    pub answer: String,
    #[serde(default)]
    pub consumed_credits: f64,
}

impl From<SourcesResponse> for SourcesAnswer {
    fn from(resp: SourcesResponse) -> Self {
        SourcesAnswer {
            answer: resp.answer,
            consumed_credits: resp.consumed_credits,
        }
    }
}

/// `POST /api/create_chatbot/get_create_chatbot_estimations`
#[derive(Debug, Clone, Deserialize)]
pub struct CreationEstimateResponse {
    pub total_pages: u32,
    pub estimated_duration: f64,
}

impl From<CreationEstimateResponse> for CreationEstimate {
    fn from(resp: CreationEstimateResponse) -> Self {
        CreationEstimate {
            total_pages: resp.total_pages,
            estimated_duration: resp.estimated_duration,
        }
    }
}
