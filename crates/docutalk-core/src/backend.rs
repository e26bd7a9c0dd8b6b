//! ChatbotBackend trait definition.
//!
//! The port through which the core reaches the DocuTalk REST API. Uses
//! RPITIT for the request/response calls. Streamed endpoints resolve to a
//! boxed [`ByteStream`] of raw body chunks that the decoders in
//! [`crate::stream`] consume.
//!
//! The bearer token is passed explicitly into every call; implementations
//! must not keep a process-wide default header.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use secrecy::SecretString;

use docutalk_types::account::UserProfile;
use docutalk_types::conversation::{AskRequest, ChatbotId, ConversationId, SourcesAnswer};
use docutalk_types::creation::{CreationEstimate, CreationRequest};
use docutalk_types::error::ClientError;

/// Raw response body, chunked however the transport delivered it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send + 'static>>;

/// Trait for the DocuTalk backend.
///
/// Implementations live in docutalk-infra (e.g., `HttpBackend`).
pub trait ChatbotBackend: Send + Sync {
    /// Fetch the authenticated user's profile and chatbot catalog.
    fn fetch_profile(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<UserProfile, ClientError>> + Send;

    /// Cumulative consumed price for the current period, in dollars.
    fn consumed_price(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<f64, ClientError>> + Send;

    /// Create a new conversation for a chatbot.
    fn create_conversation(
        &self,
        token: &SecretString,
        chatbot_id: &ChatbotId,
    ) -> impl Future<Output = Result<ConversationId, ClientError>> + Send;

    /// Send a message. Resolves once response headers arrive; the body is
    /// text interleaved with credit frames.
    fn ask(
        &self,
        token: &SecretString,
        request: &AskRequest,
    ) -> impl Future<Output = Result<ByteStream, ClientError>> + Send;

    /// Expected duration of an ask, in seconds.
    fn estimate_ask_duration(
        &self,
        token: &SecretString,
        chatbot_id: &ChatbotId,
        model: &str,
    ) -> impl Future<Output = Result<f64, ClientError>> + Send;

    /// Identify the sources of the last assistant message.
    fn last_message_sources(
        &self,
        token: &SecretString,
        chatbot_id: &ChatbotId,
        conversation_id: &ConversationId,
        model: &str,
    ) -> impl Future<Output = Result<SourcesAnswer, ClientError>> + Send;

    /// Upload documents and start chatbot creation. The body is a sequence
    /// of JSON objects interleaved with credit frames.
    fn create_chatbot(
        &self,
        token: &SecretString,
        request: &CreationRequest,
    ) -> impl Future<Output = Result<ByteStream, ClientError>> + Send;

    /// Page count and duration estimate for a prospective creation.
    fn estimate_creation(
        &self,
        token: &SecretString,
        request: &CreationRequest,
    ) -> impl Future<Output = Result<CreationEstimate, ClientError>> + Send;
}
