//! Chat service: sending messages to one chatbot and tracking the result.
//!
//! `ChatService` ties together the conversation session, the transcript,
//! the ask decoder and the credit ledger. It is generic over the
//! `ChatbotBackend` port so the core never depends on the HTTP client.

use std::sync::Arc;

use futures_util::Stream;
use secrecy::SecretString;
use tracing::{debug, info};

use docutalk_types::account::ChatbotSummary;
use docutalk_types::conversation::{AskRequest, ChatbotId, ConversationState, SourcesAnswer};
use docutalk_types::error::ClientError;
use docutalk_types::stream::{CreditNotice, StreamEvent};

use crate::backend::ChatbotBackend;
use crate::chat::{welcome_message, ConversationSession, Transcript};
use crate::credits::{spawn_refetch, CreditLedger};
use crate::stream::AskStreamDecoder;

/// Orchestrates conversation with one chatbot.
///
/// Only one ask stream can be active at a time: [`send_message`] borrows
/// the service mutably for the lifetime of the returned stream.
///
/// [`send_message`]: ChatService::send_message
pub struct ChatService<B: ChatbotBackend> {
    backend: Arc<B>,
    token: Arc<SecretString>,
    model: String,
    session: ConversationSession,
    transcript: Transcript,
    ledger: CreditLedger,
}

impl<B: ChatbotBackend + 'static> ChatService<B> {
    pub fn new(
        backend: Arc<B>,
        token: Arc<SecretString>,
        chatbot: &ChatbotSummary,
        friendly_name: &str,
        model: impl Into<String>,
        ledger: CreditLedger,
    ) -> Self {
        Self {
            backend,
            token,
            model: model.into(),
            session: ConversationSession::new(ChatbotId(chatbot.id.clone())),
            transcript: Transcript::new(welcome_message(friendly_name, &chatbot.title)),
            ledger,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn conversation_state(&self) -> ConversationState {
        self.session.state()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn current_remaining_credits(&self) -> Option<i64> {
        self.ledger.remaining()
    }

    /// Start over: forget the conversation id and reset the transcript to
    /// the welcome message.
    pub fn clear_conversation(&mut self) {
        self.session.reset();
        self.transcript.reset();
    }

    /// Expected duration of the next ask with the current model, in seconds.
    pub async fn estimate_duration(&self) -> Result<f64, ClientError> {
        self.backend
            .estimate_ask_duration(&self.token, self.session.chatbot_id(), &self.model)
            .await
    }

    /// Send a message and stream the reply.
    ///
    /// The conversation is created first if this is the first send. Text
    /// deltas are appended to the transcript as they arrive; credit notices
    /// update the ledger provisionally and schedule a refetch. The user
    /// message is recorded only once the conversation exists. A failure
    /// after that leaves the conversation id in place.
    pub fn send_message<'a>(
        &'a mut self,
        text: &'a str,
    ) -> impl Stream<Item = Result<StreamEvent, ClientError>> + Send + 'a {
        async_stream::try_stream! {
            let message = text.trim();
            if message.is_empty() {
                Err::<(), _>(ClientError::InvalidRequest("message is empty".to_string()))?;
            }

            let conversation_id = self.session.ensure_id(&*self.backend, &self.token).await?;
            self.transcript.push_user(message);

            let request = AskRequest {
                chatbot_id: self.session.chatbot_id().clone(),
                message: message.to_string(),
                model: self.model.clone(),
                conversation_id,
            };
            info!(
                chatbot_id = %request.chatbot_id,
                conversation_id = %request.conversation_id,
                model = %request.model,
                "sending message"
            );

            let body = self.backend.ask(&self.token, &request).await?;
            let mut decoder = AskStreamDecoder::new(body);

            while let Some(event) = decoder.next_event().await? {
                match &event {
                    StreamEvent::TextDelta { content } => self.transcript.append_assistant(content),
                    StreamEvent::CreditNotice(notice) => self.on_credit_notice(notice),
                }
                yield event;
            }

            debug!(reply_len = decoder.accumulated_text().len(), "reply complete");
        }
    }

    /// Ask the backend which documents the last reply drew from.
    ///
    /// Requires an existing conversation. The answer is appended to the
    /// transcript and its cost goes through the ledger like any notice.
    pub async fn identify_sources(&mut self) -> Result<SourcesAnswer, ClientError> {
        let conversation_id = self.session.id().ok_or(ClientError::NoConversation)?.clone();
        let answer = self
            .backend
            .last_message_sources(
                &self.token,
                self.session.chatbot_id(),
                &conversation_id,
                &self.model,
            )
            .await?;

        self.transcript.push_assistant(answer.answer.clone());
        self.on_credit_notice(&CreditNotice {
            consumed_credits: answer.consumed_credits,
        });
        Ok(answer)
    }

    fn on_credit_notice(&self, notice: &CreditNotice) {
        self.ledger.apply_notice(notice);
        spawn_refetch(self.backend.clone(), self.token.clone(), self.ledger.clone());
    }
}
