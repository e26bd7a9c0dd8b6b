//! Conversation state for the chat screen: the server-side conversation id
//! and the locally displayed transcript.

pub mod session;
pub mod transcript;

pub use session::ConversationSession;
pub use transcript::{welcome_message, Transcript};
