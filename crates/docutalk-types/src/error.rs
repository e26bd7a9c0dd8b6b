use thiserror::Error;

/// Errors from backend calls and stream consumption.
///
/// All variants are local to one operation; none of them invalidate the
/// conversation session.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Network failure, including a body read that failed mid-stream.
    /// Output already handed to the caller stays valid.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("authentication failed")]
    Unauthorized,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Rejected locally before any request was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no conversation has been started yet")]
    NoConversation,
}

/// Malformed framing found while decoding a stream.
///
/// Anomalies are logged and the offending bytes discarded; decoding
/// continues with the bytes that follow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingAnomaly {
    #[error("credit frame header without a terminated data line at end of stream ({len} bytes)")]
    UnterminatedCreditFrame { len: usize },

    #[error("credit frame without a data line ({len} bytes)")]
    MalformedCreditFrame { len: usize },

    #[error("credit frame data is not valid JSON: {reason}")]
    InvalidCreditPayload { reason: String },

    #[error("JSON object never balanced before end of stream ({len} bytes)")]
    UnbalancedObject { len: usize },

    #[error("balanced span is not valid JSON ({len} bytes): {reason}")]
    InvalidObject { len: usize, reason: String },

    #[error("{len} stray bytes outside any JSON object")]
    StrayBytes { len: usize },
}
