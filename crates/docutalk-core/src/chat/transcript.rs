//! In-memory chat transcript.

use docutalk_types::conversation::{Author, ChatMessage};

/// Greeting shown as the first assistant message of every conversation.
pub fn welcome_message(friendly_name: &str, chatbot_title: &str) -> String {
    format!("Hello {friendly_name}👋 I am the Chat Bot {chatbot_title}! How can I help you?")
}

/// Messages displayed for the current conversation.
///
/// Always starts with the welcome message. Not persisted.
#[derive(Debug, Clone)]
pub struct Transcript {
    welcome: String,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(welcome: impl Into<String>) -> Self {
        let welcome = welcome.into();
        Self {
            messages: vec![ChatMessage::assistant(welcome.clone())],
            welcome,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(text));
    }

    /// Append streamed text to the assistant reply in progress, starting a
    /// new reply if the last message is the user's.
    pub fn append_assistant(&mut self, delta: &str) {
        let replying = self.messages.len() > 1
            && self
                .messages
                .last()
                .is_some_and(|m| m.author == Author::Assistant);
        match self.messages.last_mut() {
            Some(last) if replying => last.text.push_str(delta),
            _ => self.push_assistant(delta),
        }
    }

    /// Drop everything but the welcome message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        if let Some(first) = self.messages.first_mut() {
            first.text.clone_from(&self.welcome);
        } else {
            self.messages.push(ChatMessage::assistant(self.welcome.clone()));
        }
    }

    /// The most recent assistant reply, excluding the welcome message.
    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .skip(1)
            .rev()
            .find(|m| m.author == Author::Assistant)
    }
}
