//! Events produced while decoding a streamed ask response.

use serde::{Deserialize, Serialize};

/// Payload of a credit-consumption frame (`event: credits`).
///
/// The backend reports the credits charged for the operation that just
/// produced output, already converted with its exchange rate and rounded
/// to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNotice {
    pub consumed_credits: f64,
}

/// One decoded item of an ask stream, in source byte order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text. Never contains credit frame bytes.
    TextDelta { content: String },

    /// A credit frame was found and excised from the text.
    CreditNotice(CreditNotice),
}

impl StreamEvent {
    /// Text carried by a `TextDelta`, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamEvent::TextDelta { content } => Some(content),
            StreamEvent::CreditNotice(_) => None,
        }
    }
}
