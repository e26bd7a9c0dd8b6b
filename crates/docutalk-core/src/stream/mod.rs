//! Incremental decoding of streamed response bodies.
//!
//! - `reader`: chunked UTF-8 decoding of the raw body
//! - `credit_frame`: extraction of `event: credits` frames from text
//! - `ask`: ordered text/credit events for the ask endpoint
//! - `json_objects`: back-to-back JSON objects for the creation endpoint

pub mod ask;
pub mod credit_frame;
pub mod json_objects;
pub mod reader;

pub use ask::AskStreamDecoder;
pub use credit_frame::{CreditFrameExtractor, DecoderBuffer, Segment, CREDIT_EVENT_MARKER};
pub use json_objects::{JsonObjectScanner, JsonObjectStreamDecoder, JsonStreamItem};
pub use reader::{ByteStreamReader, ReadResult, Utf8Decoder};
