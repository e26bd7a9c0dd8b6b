//! Conversation id lifecycle.
//!
//! A conversation is created lazily on the first send and reused until an
//! explicit reset. Creation is single-flight: callers racing on an empty
//! session wait for the one in-progress creation instead of starting
//! their own.

use secrecy::SecretString;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use docutalk_types::conversation::{ChatbotId, ConversationId, ConversationState};
use docutalk_types::error::ClientError;

use crate::backend::ChatbotBackend;

/// Conversation state for one chatbot screen.
#[derive(Debug)]
pub struct ConversationSession {
    chatbot_id: ChatbotId,
    id: OnceCell<ConversationId>,
}

impl ConversationSession {
    pub fn new(chatbot_id: ChatbotId) -> Self {
        Self {
            chatbot_id,
            id: OnceCell::new(),
        }
    }

    pub fn chatbot_id(&self) -> &ChatbotId {
        &self.chatbot_id
    }

    /// The current conversation id, if one has been created.
    pub fn id(&self) -> Option<&ConversationId> {
        self.id.get()
    }

    pub fn state(&self) -> ConversationState {
        if self.id.initialized() {
            ConversationState::Created
        } else {
            ConversationState::None
        }
    }

    /// Return the conversation id, creating the conversation first if needed.
    ///
    /// A failed creation leaves the session empty, so the next call tries
    /// again.
    pub async fn ensure_id<B: ChatbotBackend>(
        &self,
        backend: &B,
        token: &SecretString,
    ) -> Result<ConversationId, ClientError> {
        let id = self
            .id
            .get_or_try_init(|| async {
                debug!(chatbot_id = %self.chatbot_id, "creating conversation");
                let id = backend.create_conversation(token, &self.chatbot_id).await?;
                info!(chatbot_id = %self.chatbot_id, conversation_id = %id, "conversation created");
                Ok::<_, ClientError>(id)
            })
            .await?;
        Ok(id.clone())
    }

    /// Forget the current conversation. The next send creates a new one.
    pub fn reset(&mut self) {
        if let Some(previous) = self.id.take() {
            info!(conversation_id = %previous, "conversation cleared");
        }
    }
}
