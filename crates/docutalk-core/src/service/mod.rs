//! Use cases driven by the CLI.
//!
//! Services depend on the `ChatbotBackend` port, never on a concrete
//! HTTP implementation.

pub mod chat;
pub mod creation;

pub use chat::ChatService;
pub use creation::{validate_documents, CreationService};
