//! In-memory `ChatbotBackend` with scripted responses for service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures_util::stream;
use secrecy::SecretString;

use docutalk_types::account::{ChatbotSummary, UserProfile};
use docutalk_types::conversation::{AskRequest, ChatbotId, ConversationId, SourcesAnswer};
use docutalk_types::creation::{CreationEstimate, CreationRequest};
use docutalk_types::error::ClientError;

use crate::backend::{ByteStream, ChatbotBackend};

pub(crate) const CREDIT_FRAME: &str =
    "event: credits\nid: 1718000000\ndata: {\"consumed_credits\": 0.57}\n\n";

pub(crate) struct ScriptedBackend {
    pub profile: UserProfile,
    pub consumed_price: f64,
    pub ask_chunks: Vec<Vec<u8>>,
    pub creation_chunks: Vec<Vec<u8>>,
    pub ask_duration: f64,
    pub estimate: CreationEstimate,
    pub sources: SourcesAnswer,
    failures: Mutex<HashMap<&'static str, usize>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    conversations: AtomicUsize,
    pub asks: Mutex<Vec<AskRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            profile: UserProfile {
                email: "ada@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                friendly_name: "Ada".to_string(),
                period_dollar_amount: 2.5,
                is_guest: false,
                chatbots: vec![ChatbotSummary {
                    id: "bot-1".to_string(),
                    title: "Manuals".to_string(),
                    description: "Product manuals".to_string(),
                    access: "private".to_string(),
                    user_role: "Admin".to_string(),
                    suggested_prompts: vec!["How do I reset it?".to_string()],
                }],
            },
            consumed_price: 0.0,
            ask_chunks: Vec::new(),
            creation_chunks: Vec::new(),
            ask_duration: 4.2,
            estimate: CreationEstimate {
                total_pages: 12,
                estimated_duration: 75.0,
            },
            sources: SourcesAnswer {
                answer: "Page 3 of manual.pdf".to_string(),
                consumed_credits: 0.4,
            },
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            conversations: AtomicUsize::new(0),
            asks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_consumed_price(mut self, price: f64) -> Self {
        self.consumed_price = price;
        self
    }

    pub fn with_ask_chunks(mut self, chunks: &[&str]) -> Self {
        self.ask_chunks = chunks.iter().map(|c| c.as_bytes().to_vec()).collect();
        self
    }

    pub fn with_creation_chunks(mut self, chunks: &[&str]) -> Self {
        self.creation_chunks = chunks.iter().map(|c| c.as_bytes().to_vec()).collect();
        self
    }

    /// Every call to `method` fails with a transport error.
    pub fn failing(self, method: &'static str) -> Self {
        self.fail_times(method, usize::MAX)
    }

    /// The next `times` calls to `method` fail with a transport error.
    pub fn fail_times(self, method: &'static str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(method, times);
        self
    }

    pub fn calls(&self, method: &'static str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn enter(&self, method: &'static str) -> Result<(), ClientError> {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(method) {
            Some(left) if *left > 0 => {
                *left = left.saturating_sub(1);
                Err(ClientError::Transport(format!("{method} unavailable")))
            }
            _ => Ok(()),
        }
    }

    fn body(chunks: &[Vec<u8>]) -> ByteStream {
        let items: Vec<Result<Bytes, ClientError>> =
            chunks.iter().map(|c| Ok(Bytes::from(c.clone()))).collect();
        Box::pin(stream::iter(items))
    }
}

impl ChatbotBackend for ScriptedBackend {
    async fn fetch_profile(&self, _token: &SecretString) -> Result<UserProfile, ClientError> {
        self.enter("fetch_profile")?;
        Ok(self.profile.clone())
    }

    async fn consumed_price(&self, _token: &SecretString) -> Result<f64, ClientError> {
        self.enter("consumed_price")?;
        Ok(self.consumed_price)
    }

    async fn create_conversation(
        &self,
        _token: &SecretString,
        _chatbot_id: &ChatbotId,
    ) -> Result<ConversationId, ClientError> {
        // Give concurrent callers a chance to pile up behind this one.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.enter("create_conversation")?;
        let n = self.conversations.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ConversationId(format!("conv-{n}")))
    }

    async fn ask(&self, _token: &SecretString, request: &AskRequest) -> Result<ByteStream, ClientError> {
        self.enter("ask")?;
        self.asks.lock().unwrap().push(request.clone());
        Ok(Self::body(&self.ask_chunks))
    }

    async fn estimate_ask_duration(
        &self,
        _token: &SecretString,
        _chatbot_id: &ChatbotId,
        _model: &str,
    ) -> Result<f64, ClientError> {
        self.enter("estimate_ask_duration")?;
        Ok(self.ask_duration)
    }

    async fn last_message_sources(
        &self,
        _token: &SecretString,
        _chatbot_id: &ChatbotId,
        _conversation_id: &ConversationId,
        _model: &str,
    ) -> Result<SourcesAnswer, ClientError> {
        self.enter("last_message_sources")?;
        Ok(self.sources.clone())
    }

    async fn create_chatbot(
        &self,
        _token: &SecretString,
        _request: &CreationRequest,
    ) -> Result<ByteStream, ClientError> {
        self.enter("create_chatbot")?;
        Ok(Self::body(&self.creation_chunks))
    }

    async fn estimate_creation(
        &self,
        _token: &SecretString,
        _request: &CreationRequest,
    ) -> Result<CreationEstimate, ClientError> {
        self.enter("estimate_creation")?;
        Ok(self.estimate.clone())
    }
}
