//! Chunk-by-chunk UTF-8 decoding of a streamed response body.
//!
//! Transports split bodies wherever they like, including in the middle of a
//! multi-byte character. [`Utf8Decoder`] carries an incomplete trailing
//! sequence into the next chunk; [`ByteStreamReader`] drives it from a
//! [`ByteStream`].

use futures_util::StreamExt;
use tracing::debug;

use docutalk_types::error::ClientError;

use crate::backend::ByteStream;

/// Streaming UTF-8 decoder.
///
/// Invalid sequences become U+FFFD immediately. A sequence that is merely
/// incomplete at the end of a chunk is held until the next call, or replaced
/// by U+FFFD in [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk. The result may be empty when the chunk only
    /// extends a held partial character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        while start < self.pending.len() {
            let rest = &self.pending[start..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid_len = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_len]));
                    match e.error_len() {
                        Some(bad_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start += valid_len + bad_len;
                        }
                        // Incomplete sequence at the tail: keep it for the next chunk.
                        None => {
                            start += valid_len;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush whatever is still held. Returns an empty string when nothing is.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }

    /// Number of bytes carried over to the next chunk.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Result of one [`ByteStreamReader::pull`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// The body is exhausted. `text` holds the flushed decoder remainder.
    pub done: bool,
    pub text: String,
}

/// Pulls binary chunks from a response body and decodes them to text.
pub struct ByteStreamReader {
    body: ByteStream,
    decoder: Utf8Decoder,
    bytes_read: usize,
    done: bool,
}

impl ByteStreamReader {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: Utf8Decoder::new(),
            bytes_read: 0,
            done: false,
        }
    }

    /// Pull and decode the next chunk.
    ///
    /// Callable until a result with `done` is returned; later calls keep
    /// returning `done` with empty text. A transport error ends the reader
    /// but leaves earlier results valid.
    pub async fn pull(&mut self) -> Result<ReadResult, ClientError> {
        if self.done {
            return Ok(ReadResult {
                done: true,
                text: String::new(),
            });
        }

        match self.body.next().await {
            Some(Ok(chunk)) => {
                self.bytes_read += chunk.len();
                let text = self.decoder.decode(&chunk);
                debug!(
                    chunk_bytes = chunk.len(),
                    carried = self.decoder.pending_len(),
                    "decoded body chunk"
                );
                Ok(ReadResult { done: false, text })
            }
            Some(Err(e)) => {
                self.done = true;
                Err(e)
            }
            None => {
                self.done = true;
                debug!(total_bytes = self.bytes_read, "body exhausted");
                Ok(ReadResult {
                    done: true,
                    text: self.decoder.finish(),
                })
            }
        }
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }
}
