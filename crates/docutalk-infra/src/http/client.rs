//! HttpBackend -- concrete [`ChatbotBackend`] implementation over `reqwest`.
//!
//! Every route lives under `{api_url}/api`. Requests authenticate with the
//! bearer token passed into each call. Form fields and document uploads are
//! both sent as `multipart/form-data`.
//! Streamed endpoints return the raw body as a [`ByteStream`] once the
//! response headers are in.

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use docutalk_core::backend::{ByteStream, ChatbotBackend};
use docutalk_types::account::UserProfile;
use docutalk_types::config::ClientConfig;
use docutalk_types::conversation::{AskRequest, ChatbotId, ConversationId, SourcesAnswer};
use docutalk_types::creation::{CreationEstimate, CreationRequest};
use docutalk_types::error::ClientError;

use super::types::{
    AskEstimationResponse, ConsumedPriceResponse, ConversationResponse, CreationEstimateResponse,
    SourcesResponse,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// DocuTalk REST backend.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

// No Debug: the client may carry connection state we never want in logs.

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn get(&self, path: &str, token: &SecretString) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .bearer_auth(token.expose_secret())
            .timeout(self.request_timeout)
    }

    fn post(&self, path: &str, token: &SecretString) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .bearer_auth(token.expose_secret())
            .timeout(self.request_timeout)
    }

    fn ask_request(&self, token: &SecretString, request: &AskRequest) -> reqwest::RequestBuilder {
        self.post("/chatbots/ask_chatbot", token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .multipart(text_form(&[
                ("chatbot_id", request.chatbot_id.as_str()),
                ("message", request.message.as_str()),
                ("model", request.model.as_str()),
                ("conversation_id", request.conversation_id.as_str()),
            ]))
    }

    fn documents_form(request: &CreationRequest) -> Result<reqwest::multipart::Form, ClientError> {
        let mut form = reqwest::multipart::Form::new().text("model", request.model.clone());
        for doc in &request.documents {
            let part = reqwest::multipart::Part::bytes(doc.bytes.clone())
                .file_name(doc.file_name.clone())
                .mime_str(&doc.content_type)
                .map_err(|e| {
                    ClientError::InvalidRequest(format!(
                        "invalid content type for {}: {e}",
                        doc.file_name
                    ))
                })?;
            form = form.part("documents_files", part);
        }
        Ok(form)
    }

    /// Send a request and fail on any non-success status.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Deserialization(format!("failed to parse response: {e}")))
    }

    async fn send_streaming(&self, builder: reqwest::RequestBuilder) -> Result<ByteStream, ClientError> {
        let response = self.send(builder).await?;
        Ok(Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(transport))))
    }
}

fn text_form(fields: &[(&str, &str)]) -> reqwest::multipart::Form {
    fields
        .iter()
        .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        })
}

fn transport(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Transport(format!("request timed out: {e}"))
    } else {
        ClientError::Transport(format!("HTTP request failed: {e}"))
    }
}

/// Map a non-success status to a [`ClientError`].
fn map_status(status: u16, body: String) -> ClientError {
    match status {
        401 | 403 => ClientError::Unauthorized,
        _ => ClientError::Http { status, body },
    }
}

impl ChatbotBackend for HttpBackend {
    async fn fetch_profile(&self, token: &SecretString) -> Result<UserProfile, ClientError> {
        self.send_json(self.get("/auth/user", token)).await
    }

    async fn consumed_price(&self, token: &SecretString) -> Result<f64, ClientError> {
        let resp: ConsumedPriceResponse = self
            .send_json(self.post("/auth/get_remaining_credits", token))
            .await?;
        Ok(resp.consumed_price.unwrap_or(0.0))
    }

    async fn create_conversation(
        &self,
        token: &SecretString,
        chatbot_id: &ChatbotId,
    ) -> Result<ConversationId, ClientError> {
        let builder = self
            .post("/chatbots/create_conversation", token)
            .multipart(text_form(&[("chatbot_id", chatbot_id.as_str())]));
        let resp: ConversationResponse = self.send_json(builder).await?;
        debug!(chatbot_id = %chatbot_id, conversation_id = %resp.conversation_id, "conversation created");
        Ok(ConversationId(resp.conversation_id))
    }

    async fn ask(&self, token: &SecretString, request: &AskRequest) -> Result<ByteStream, ClientError> {
        self.send_streaming(self.ask_request(token, request)).await
    }

    async fn estimate_ask_duration(
        &self,
        token: &SecretString,
        chatbot_id: &ChatbotId,
        model: &str,
    ) -> Result<f64, ClientError> {
        let builder = self
            .get("/chatbots/get_ask_estimation_duration", token)
            .query(&[("chatbot_id", chatbot_id.as_str()), ("model", model)]);
        let resp: AskEstimationResponse = self.send_json(builder).await?;
        Ok(resp.estimated_duration)
    }

    async fn last_message_sources(
        &self,
        token: &SecretString,
        chatbot_id: &ChatbotId,
        conversation_id: &ConversationId,
        model: &str,
    ) -> Result<SourcesAnswer, ClientError> {
        let builder = self
            .post("/chatbots/get_last_message_sources", token)
            .multipart(text_form(&[
                ("chatbot_id", chatbot_id.as_str()),
                ("model", model),
                ("conversation_id", conversation_id.as_str()),
            ]));
        let resp: SourcesResponse = self.send_json(builder).await?;
        Ok(resp.into())
    }

    async fn create_chatbot(
        &self,
        token: &SecretString,
        request: &CreationRequest,
    ) -> Result<ByteStream, ClientError> {
        let builder = self
            .post("/create_chatbot/create_chatbot", token)
            .multipart(Self::documents_form(request)?);
        self.send_streaming(builder).await
    }

    async fn estimate_creation(
        &self,
        token: &SecretString,
        request: &CreationRequest,
    ) -> Result<CreationEstimate, ClientError> {
        let builder = self
            .post("/create_chatbot/get_create_chatbot_estimations", token)
            .multipart(Self::documents_form(request)?);
        let resp: CreationEstimateResponse = self.send_json(builder).await?;
        Ok(resp.into())
    }
}
