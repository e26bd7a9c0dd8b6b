//! Decoder for back-to-back JSON objects interleaved with credit frames.
//!
//! The creation endpoint writes one JSON object per stage with no delimiter
//! between them. [`JsonObjectScanner`] tracks brace depth, string and escape
//! state across appends, so braces inside string values never split an
//! object and no byte is scanned twice.

use std::collections::VecDeque;

use futures_util::Stream;
use serde_json::Value;
use tracing::{debug, info, warn};

use docutalk_types::error::{ClientError, FramingAnomaly};
use docutalk_types::stream::CreditNotice;

use crate::backend::ByteStream;

use super::credit_frame::{CreditFrameExtractor, Segment};
use super::reader::ByteStreamReader;

/// Incremental splitter for concatenated JSON objects.
#[derive(Debug, Default)]
pub struct JsonObjectScanner {
    buf: String,
    /// First byte not yet scanned.
    scan_pos: usize,
    /// Start of the object being assembled.
    object_start: Option<usize>,
    depth: usize,
    in_string: bool,
    escaped: bool,
    /// Length of the current run of bytes found outside any object.
    stray_run: usize,
    anomalies: Vec<FramingAnomaly>,
}

impl JsonObjectScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every object it completes, in order.
    pub fn feed(&mut self, text: &str) -> Vec<Value> {
        self.buf.push_str(text);
        let mut objects = Vec::new();

        let mut i = self.scan_pos;
        while i < self.buf.len() {
            let b = self.buf.as_bytes()[i];
            i += 1;

            let Some(start) = self.object_start else {
                match b {
                    b'{' => {
                        self.flush_stray_run();
                        self.object_start = Some(i - 1);
                        self.depth = 1;
                    }
                    b if b.is_ascii_whitespace() => {}
                    _ => self.stray_run += 1,
                }
                continue;
            };

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match b {
                b'"' => self.in_string = true,
                b'{' => self.depth += 1,
                b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth > 0 {
                        continue;
                    }
                    let candidate = &self.buf[start..i];
                    match serde_json::from_str::<Value>(candidate) {
                        Ok(value) => {
                            objects.push(value);
                            self.object_start = None;
                        }
                        // Balanced by our count but truncated for the parser:
                        // keep it pending and retry at the next closing brace.
                        Err(e) if e.is_eof() => {
                            debug!(len = candidate.len(), "candidate object truncated, waiting");
                        }
                        Err(e) => {
                            let anomaly = FramingAnomaly::InvalidObject {
                                len: candidate.len(),
                                reason: e.to_string(),
                            };
                            warn!(%anomaly, "discarding JSON object");
                            self.anomalies.push(anomaly);
                            self.object_start = None;
                        }
                    }
                }
                _ => {}
            }
        }

        self.scan_pos = i;
        self.compact();
        objects
    }

    /// End of input: report whatever never formed an object.
    pub fn finish(&mut self) {
        self.flush_stray_run();
        if let Some(start) = self.object_start.take() {
            let anomaly = FramingAnomaly::UnbalancedObject {
                len: self.buf.len() - start,
            };
            warn!(%anomaly, "discarding JSON tail");
            self.anomalies.push(anomaly);
        }
        self.buf.clear();
        self.scan_pos = 0;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }

    pub fn anomalies(&self) -> &[FramingAnomaly] {
        &self.anomalies
    }

    fn flush_stray_run(&mut self) {
        if self.stray_run > 0 {
            let anomaly = FramingAnomaly::StrayBytes {
                len: self.stray_run,
            };
            warn!(%anomaly, "discarding bytes between JSON objects");
            self.anomalies.push(anomaly);
            self.stray_run = 0;
        }
    }

    /// Drop everything before the pending object (or everything scanned).
    fn compact(&mut self) {
        let keep_from = self.object_start.unwrap_or(self.scan_pos);
        if keep_from == 0 {
            return;
        }
        self.buf.drain(..keep_from);
        self.scan_pos -= keep_from;
        if let Some(start) = self.object_start.as_mut() {
            *start -= keep_from;
        }
    }
}

/// One decoded item of a creation stream.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonStreamItem {
    Object(Value),
    Credit(CreditNotice),
}

/// Pull-driven decoder for a stream of JSON objects and credit frames.
///
/// Credit extraction runs on every pulled chunk before brace scanning, so
/// frame bytes never reach the scanner.
pub struct JsonObjectStreamDecoder {
    reader: ByteStreamReader,
    extractor: CreditFrameExtractor,
    scanner: JsonObjectScanner,
    ready: VecDeque<JsonStreamItem>,
    objects: usize,
    finished: bool,
}

impl JsonObjectStreamDecoder {
    pub fn new(body: ByteStream) -> Self {
        Self {
            reader: ByteStreamReader::new(body),
            extractor: CreditFrameExtractor::new(),
            scanner: JsonObjectScanner::new(),
            ready: VecDeque::new(),
            objects: 0,
            finished: false,
        }
    }

    /// Next item, or `None` once the body is exhausted.
    pub async fn next_item(&mut self) -> Result<Option<JsonStreamItem>, ClientError> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Ok(Some(item));
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
                self.scanner.finish();
                self.finished = true;
                info!(
                    bytes = self.reader.bytes_read(),
                    objects = self.objects,
                    credit_frames = self.extractor.frames(),
                    "JSON object stream complete"
                );
            }
        }
    }

    /// Every framing problem seen so far, credit frames first.
    pub fn anomalies(&self) -> Vec<FramingAnomaly> {
        self.extractor
            .anomalies()
            .iter()
            .chain(self.scanner.anomalies())
            .cloned()
            .collect()
    }

    pub fn into_stream(mut self) -> impl Stream<Item = Result<JsonStreamItem, ClientError>> + Send {
        async_stream::try_stream! {
            while let Some(item) = self.next_item().await? {
                yield item;
            }
        }
    }

    fn enqueue(&mut self, segments: Vec<Segment>) {
        for segment in segments {
            match segment {
                Segment::Text(text) => {
                    for object in self.scanner.feed(&text) {
                        self.objects += 1;
                        self.ready.push_back(JsonStreamItem::Object(object));
                    }
                }
                Segment::Credit(notice) => {
                    self.ready.push_back(JsonStreamItem::Credit(notice));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;
    use serde_json::json;

    const FRAME: &str = "event: credits\nid: 1\ndata: {\"consumed_credits\": 1.25}\n\n";

    fn body_from(chunks: Vec<Vec<u8>>) -> ByteStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok::<_, ClientError>(Bytes::from(c))),
        ))
    }

    async fn collect(decoder: &mut JsonObjectStreamDecoder) -> Vec<JsonStreamItem> {
        let mut items = Vec::new();
        while let Some(item) = decoder.next_item().await.unwrap() {
            items.push(item);
        }
        items
    }

    fn sample_objects() -> Vec<Value> {
        vec![
            json!({"title": "Manual {v2}", "description": "Covers \"}\" and {braces}"}),
            json!({"icon": "iVBORw0KGgo="}),
            json!({"suggested_prompts": ["What is \\ escaping?", "{\"nested\": true}"]}),
            json!({"chatbot_id": "6f1c", "meta": {"depth": {"x": [1, 2, {"y": "}"}]}}}),
        ]
    }

    #[test]
    fn scanner_splits_back_to_back_objects() {
        let mut scanner = JsonObjectScanner::new();
        let objects = scanner.feed(r#"{"a":1}{"b":"}"} {"c":{"d":2}}"#);
        assert_eq!(objects, vec![json!({"a": 1}), json!({"b": "}"}), json!({"c": {"d": 2}})]);
        scanner.finish();
        assert!(scanner.anomalies().is_empty());
    }

    #[test]
    fn scanner_holds_partial_object_across_feeds() {
        let mut scanner = JsonObjectScanner::new();
        assert!(scanner.feed(r#"{"title": "a \"quoted\" {"#).is_empty());
        assert!(scanner.feed(r#"brace", "description": "#).is_empty());
        let objects = scanner.feed(r#""d"}{"icon""#);
        assert_eq!(objects, vec![json!({"title": "a \"quoted\" {brace", "description": "d"})]);
        let objects = scanner.feed(r#": "x"}"#);
        assert_eq!(objects, vec![json!({"icon": "x"})]);
    }

    #[test]
    fn scanner_escape_split_across_feeds() {
        let mut scanner = JsonObjectScanner::new();
        assert!(scanner.feed(r#"{"s": "ends with \"#).is_empty());
        let objects = scanner.feed(r#""}"}"#);
        assert_eq!(objects, vec![json!({"s": "ends with \"}"})]);
    }

    #[test]
    fn scanner_reports_stray_bytes() {
        let mut scanner = JsonObjectScanner::new();
        let objects = scanner.feed("junk {\"a\":1}\n");
        assert_eq!(objects, vec![json!({"a": 1})]);
        scanner.finish();
        assert_eq!(scanner.anomalies(), &[FramingAnomaly::StrayBytes { len: 4 }]);
    }

    #[test]
    fn scanner_reports_unbalanced_tail() {
        let mut scanner = JsonObjectScanner::new();
        assert_eq!(scanner.feed(r#"{"a":1}{"b":"#), vec![json!({"a": 1})]);
        scanner.finish();
        assert_eq!(scanner.anomalies(), &[FramingAnomaly::UnbalancedObject { len: 5 }]);
    }

    #[test]
    fn scanner_skips_malformed_balanced_span() {
        let mut scanner = JsonObjectScanner::new();
        let objects = scanner.feed(r#"{"a": nope}{"b": 2}"#);
        assert_eq!(objects, vec![json!({"b": 2})]);
        assert!(matches!(
            scanner.anomalies(),
            [FramingAnomaly::InvalidObject { len: 11, .. }]
        ));
    }

    #[test]
    fn scanner_compacts_consumed_bytes() {
        let mut scanner = JsonObjectScanner::new();
        scanner.feed(r#"{"a":1}{"b""#);
        assert_eq!(scanner.buf, r#"{"b""#);
        assert_eq!(scanner.object_start, Some(0));
    }

    #[tokio::test]
    async fn round_trip_with_interleaved_frames_under_any_split() {
        let objects = sample_objects();
        let mut body = String::new();
        for (idx, object) in objects.iter().enumerate() {
            body.push_str(&object.to_string());
            if idx % 2 == 0 {
                body.push_str(FRAME);
            }
        }
        let bytes = body.as_bytes();

        for i in 0..=bytes.len() {
            let mut decoder =
                JsonObjectStreamDecoder::new(body_from(vec![bytes[..i].to_vec(), bytes[i..].to_vec()]));
            let items = collect(&mut decoder).await;

            let decoded: Vec<Value> = items
                .iter()
                .filter_map(|item| match item {
                    JsonStreamItem::Object(v) => Some(v.clone()),
                    JsonStreamItem::Credit(_) => None,
                })
                .collect();
            let credit_count = items
                .iter()
                .filter(|item| matches!(item, JsonStreamItem::Credit(_)))
                .count();

            assert_eq!(decoded, objects, "split at {i}");
            assert_eq!(credit_count, 2, "split at {i}");
            assert!(decoder.anomalies().is_empty(), "split at {i}");
        }
    }

    #[tokio::test]
    async fn credit_follows_the_object_it_trails() {
        let body = format!("{{\"title\":\"t\",\"description\":\"d\"}}{FRAME}{{\"icon\":\"i\"}}");
        let mut decoder = JsonObjectStreamDecoder::new(body_from(vec![body.into_bytes()]));
        let items = collect(&mut decoder).await;
        assert_eq!(
            items,
            vec![
                JsonStreamItem::Object(json!({"title": "t", "description": "d"})),
                JsonStreamItem::Credit(CreditNotice {
                    consumed_credits: 1.25
                }),
                JsonStreamItem::Object(json!({"icon": "i"})),
            ]
        );
    }

    #[tokio::test]
    async fn truncated_body_reports_unbalanced_object() {
        let mut decoder = JsonObjectStreamDecoder::new(body_from(vec![
            br#"{"icon":"abc"}{"suggested_prompts":["a","#.to_vec(),
        ]));
        let items = collect(&mut decoder).await;
        assert_eq!(items, vec![JsonStreamItem::Object(json!({"icon": "abc"}))]);
        assert!(matches!(
            decoder.anomalies().as_slice(),
            [FramingAnomaly::UnbalancedObject { .. }]
        ));
    }
}
