//! Decoder for the streamed ask response.
//!
//! Turns a raw body into ordered [`StreamEvent`]s: incremental assistant
//! text and the credit notices cut out of it.

use std::collections::VecDeque;

use futures_util::Stream;
use tracing::{debug, info};

use docutalk_types::error::{ClientError, FramingAnomaly};
use docutalk_types::stream::StreamEvent;

use crate::backend::ByteStream;

use super::credit_frame::{CreditFrameExtractor, Segment};
use super::reader::ByteStreamReader;

/// Pull-driven decoder for one ask response.
///
/// Events are handed out as soon as their bytes are complete. Only the
/// assistant text is retained, in [`accumulated_text`](Self::accumulated_text).
pub struct AskStreamDecoder {
    reader: ByteStreamReader,
    extractor: CreditFrameExtractor,
    ready: VecDeque<StreamEvent>,
    accumulated_text: String,
    typing_started: bool,
    finished: bool,
}

impl AskStreamDecoder {
    pub fn new(body: ByteStream) -> Self {
        Self {
            reader: ByteStreamReader::new(body),
            extractor: CreditFrameExtractor::new(),
            ready: VecDeque::new(),
            accumulated_text: String::new(),
            typing_started: false,
            finished: false,
        }
    }

    /// Next event, or `None` once the body is exhausted and fully decoded.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, ClientError> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }

            let read = self.reader.pull().await?;
            let segments = self.extractor.push(&read.text);
            self.enqueue(segments);

            if read.done {
                let tail = self.extractor.finish();
                self.enqueue(tail);
                self.finished = true;
                info!(
                    bytes = self.reader.bytes_read(),
                    text_len = self.accumulated_text.len(),
                    credit_frames = self.extractor.frames(),
                    anomalies = self.extractor.anomalies().len(),
                    "ask stream complete"
                );
            }
        }
    }

    /// All assistant text emitted so far.
    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    /// Whether a non-empty `TextDelta` has been produced.
    pub fn typing_started(&self) -> bool {
        self.typing_started
    }

    pub fn anomalies(&self) -> &[FramingAnomaly] {
        self.extractor.anomalies()
    }

    /// Adapt the decoder into a stream of events.
    pub fn into_stream(mut self) -> impl Stream<Item = Result<StreamEvent, ClientError>> + Send {
        async_stream::try_stream! {
            while let Some(event) = self.next_event().await? {
                yield event;
            }
        }
    }

    fn enqueue(&mut self, segments: Vec<Segment>) {
        for segment in segments {
            match segment {
                Segment::Text(content) => {
                    if content.is_empty() {
                        continue;
                    }
                    if !self.typing_started {
                        self.typing_started = true;
                        debug!("first assistant text received");
                    }
                    self.accumulated_text.push_str(&content);
                    self.ready.push_back(StreamEvent::TextDelta { content });
                }
                Segment::Credit(notice) => {
                    debug!(consumed_credits = notice.consumed_credits, "credit frame");
                    self.ready.push_back(StreamEvent::CreditNotice(notice));
                }
            }
        }
    }
}
