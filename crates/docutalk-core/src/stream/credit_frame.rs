//! Credit frame extraction from decoded stream text.
//!
//! The backend injects credit-consumption frames into otherwise plain
//! response bodies:
//!
//! ```text
//! event: credits
//! id: 1718000000
//! data: {"consumed_credits": 0.57}
//!
//! ```
//!
//! A frame may start in the middle of a line (model output does not have to
//! end with a newline) and may be split across any number of chunks. The
//! extractor removes complete frames, passes everything else through
//! verbatim, and holds back only the bytes that could still turn out to be a
//! frame.

use tracing::warn;

use docutalk_types::error::FramingAnomaly;
use docutalk_types::stream::CreditNotice;

/// Line that opens a credit frame.
pub const CREDIT_EVENT_MARKER: &str = "event: credits";

const DATA_PREFIX: &str = "data:";

/// Append-only text buffer with a read cursor.
///
/// Bytes before the cursor have been classified and are never looked at
/// again; bytes after it are retained verbatim until classified.
#[derive(Debug, Default)]
pub struct DecoderBuffer {
    buf: String,
    cursor: usize,
}

impl DecoderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Bytes not yet classified.
    pub fn unread(&self) -> &str {
        &self.buf[self.cursor..]
    }

    /// Mark the next `len` unread bytes as classified and return them.
    pub fn take(&mut self, len: usize) -> &str {
        let start = self.cursor;
        self.cursor += len;
        &self.buf[start..self.cursor]
    }

    /// Drop classified bytes from memory.
    pub fn compact(&mut self) {
        if self.cursor > 0 {
            self.buf.drain(..self.cursor);
            self.cursor = 0;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == self.buf.len()
    }
}

/// A classified piece of stream text.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text with every credit frame removed.
    Text(String),
    Credit(CreditNotice),
}

/// Outcome of parsing a frame candidate that starts with the marker.
enum FrameParse {
    Complete { len: usize, payload: String },
    Incomplete,
    NotAFrame,
    Malformed { len: usize },
}

/// Removes credit frames from decoded text.
#[derive(Debug, Default)]
pub struct CreditFrameExtractor {
    buffer: DecoderBuffer,
    anomalies: Vec<FramingAnomaly>,
    frames: usize,
}

impl CreditFrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly decoded text and return everything that can be classified.
    ///
    /// Adjacent text is coalesced, so at most one `Text` segment sits between
    /// two `Credit` segments.
    pub fn push(&mut self, text: &str) -> Vec<Segment> {
        self.buffer.append(text);
        self.drain(false)
    }

    /// Classify whatever is still held at end of stream.
    pub fn finish(&mut self) -> Vec<Segment> {
        self.drain(true)
    }

    /// Framing problems seen so far, in order.
    pub fn anomalies(&self) -> &[FramingAnomaly] {
        &self.anomalies
    }

    /// Number of well-formed frames extracted so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn drain(&mut self, eof: bool) -> Vec<Segment> {
        let mut out = Vec::new();

        loop {
            let unread = self.buffer.unread();
            if unread.is_empty() {
                break;
            }

            let Some(pos) = unread.find(CREDIT_EVENT_MARKER) else {
                let hold = if eof { 0 } else { marker_prefix_suffix(unread) };
                let emit = unread.len() - hold;
                if emit > 0 {
                    let text = self.buffer.take(emit).to_string();
                    push_text(&mut out, &text);
                }
                break;
            };

            if pos > 0 {
                let text = self.buffer.take(pos).to_string();
                push_text(&mut out, &text);
                continue;
            }

            match parse_frame(unread, eof) {
                FrameParse::Complete { len, payload } => {
                    self.buffer.take(len);
                    match serde_json::from_str::<CreditNotice>(&payload) {
                        Ok(notice) => {
                            self.frames += 1;
                            out.push(Segment::Credit(notice));
                        }
                        Err(e) => {
                            self.record(FramingAnomaly::InvalidCreditPayload {
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                FrameParse::NotAFrame => {
                    let text = self.buffer.take(CREDIT_EVENT_MARKER.len()).to_string();
                    push_text(&mut out, &text);
                }
                FrameParse::Malformed { len } => {
                    self.buffer.take(len);
                    self.record(FramingAnomaly::MalformedCreditFrame { len });
                }
                FrameParse::Incomplete if eof => {
                    let len = unread.len();
                    self.buffer.take(len);
                    self.record(FramingAnomaly::UnterminatedCreditFrame { len });
                }
                FrameParse::Incomplete => break,
            }
        }

        self.buffer.compact();
        out
    }

    fn record(&mut self, anomaly: FramingAnomaly) {
        warn!(%anomaly, "discarding credit frame");
        self.anomalies.push(anomaly);
    }
}

fn push_text(out: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Segment::Text(text.to_string()));
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of the
/// marker.
fn marker_prefix_suffix(text: &str) -> usize {
    (1..CREDIT_EVENT_MARKER.len())
        .rev()
        .find(|&k| text.ends_with(&CREDIT_EVENT_MARKER[..k]))
        .unwrap_or(0)
}

/// Length of the line terminator at the start of `s`: 1 for `\n`, 2 for
/// `\r\n`, `None` when `s` starts with something else. A lone trailing `\r`
/// reports `Some(0)` (undecided until the next byte arrives).
fn eol_len(s: &str) -> Option<usize> {
    if s.starts_with('\n') {
        Some(1)
    } else if s.starts_with("\r\n") {
        Some(2)
    } else if s == "\r" {
        Some(0)
    } else {
        None
    }
}

/// Field lines allowed between the marker and the data line.
const FIELD_PREFIXES: [&str; 2] = ["id:", "retry:"];

/// Whether `line` may still turn into a data or field line once more bytes
/// arrive.
fn could_be_frame_line(line: &str) -> bool {
    std::iter::once(DATA_PREFIX)
        .chain(FIELD_PREFIXES)
        .any(|prefix| line.starts_with(prefix) || prefix.starts_with(line))
}

/// Parse a frame candidate. `s` starts with [`CREDIT_EVENT_MARKER`].
///
/// Between the marker and the data line only `id:` and `retry:` lines are
/// accepted. Any other line means the marker was ordinary text.
fn parse_frame(s: &str, eof: bool) -> FrameParse {
    let mut pos = CREDIT_EVENT_MARKER.len();
    if s.len() == pos {
        return FrameParse::Incomplete;
    }

    match eol_len(&s[pos..]) {
        Some(0) => return FrameParse::Incomplete,
        Some(n) => pos += n,
        None => return FrameParse::NotAFrame,
    }

    let mut fields = 0;
    loop {
        let rest = &s[pos..];
        let Some(nl) = rest.find('\n') else {
            let partial = rest.strip_suffix('\r').unwrap_or(rest);
            return if could_be_frame_line(partial) {
                FrameParse::Incomplete
            } else {
                FrameParse::NotAFrame
            };
        };
        let line = rest[..nl].strip_suffix('\r').unwrap_or(&rest[..nl]);
        let line_end = pos + nl + 1;

        if line.is_empty() {
            return if fields > 0 {
                FrameParse::Malformed { len: line_end }
            } else {
                FrameParse::NotAFrame
            };
        }

        if let Some(data) = line.strip_prefix(DATA_PREFIX) {
            let payload = data.strip_prefix(' ').unwrap_or(data).to_string();
            let tail = &s[line_end..];
            let len = match eol_len(tail) {
                Some(0) if !eof => return FrameParse::Incomplete,
                Some(0) => line_end + 1,
                Some(n) => line_end + n,
                None if tail.is_empty() && !eof => return FrameParse::Incomplete,
                None => line_end,
            };
            return FrameParse::Complete { len, payload };
        }

        if !FIELD_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
            return FrameParse::NotAFrame;
        }
        fields += 1;
        pos = line_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: &str = "event: credits\nid: 1718000000\ndata: {\"consumed_credits\": 0.57}\n\n";

    fn run(chunks: &[&str]) -> (Vec<Segment>, CreditFrameExtractor) {
        let mut extractor = CreditFrameExtractor::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(extractor.push(chunk));
        }
        out.extend(extractor.finish());
        (out, extractor)
    }

    fn text_of(segments: &[Segment]) -> String {
        segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Credit(_) => None,
            })
            .collect()
    }

    fn credits_of(segments: &[Segment]) -> Vec<f64> {
        segments
            .iter()
            .filter_map(|s| match s {
                Segment::Credit(n) => Some(n.consumed_credits),
                Segment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn extracts_frame_between_text() {
        let input = format!("Hello{FRAME} world");
        let (segments, extractor) = run(&[&input]);
        assert_eq!(
            segments,
            vec![
                Segment::Text("Hello".to_string()),
                Segment::Credit(CreditNotice {
                    consumed_credits: 0.57
                }),
                Segment::Text(" world".to_string()),
            ]
        );
        assert!(extractor.anomalies().is_empty());
        assert_eq!(extractor.frames(), 1);
    }

    #[test]
    fn text_without_frames_passes_through_unchanged() {
        let input = "plain answer\nwith event: lines and data: too\r\n";
        let (segments, extractor) = run(&[input]);
        assert_eq!(text_of(&segments), input);
        assert!(credits_of(&segments).is_empty());
        assert!(extractor.anomalies().is_empty());
    }

    #[test]
    fn every_split_point_yields_same_result() {
        let input = format!("Intro text{FRAME}middle\nevent: credits\r\ndata:{{\"consumed_credits\":2}}\r\nend");
        for i in 0..=input.len() {
            let (segments, extractor) = run(&[&input[..i], &input[i..]]);
            assert_eq!(text_of(&segments), "Intro textmiddle\nend", "split at {i}");
            assert_eq!(credits_of(&segments), vec![0.57, 2.0], "split at {i}");
            assert!(extractor.anomalies().is_empty(), "split at {i}");
        }
    }

    #[test]
    fn byte_by_byte_feed_yields_same_result() {
        let input = format!("{FRAME}{FRAME}tail");
        let chunks: Vec<String> = input.chars().map(|c| c.to_string()).collect();
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let (segments, _) = run(&refs);
        assert_eq!(text_of(&segments), "tail");
        assert_eq!(credits_of(&segments), vec![0.57, 0.57]);
    }

    #[test]
    fn partial_marker_is_held_then_released() {
        let mut extractor = CreditFrameExtractor::new();
        assert_eq!(extractor.push("answer event: cr"), vec![Segment::Text("answer ".to_string())]);
        assert_eq!(
            extractor.push("ystal clear"),
            vec![Segment::Text("event: crystal clear".to_string())]
        );
        assert!(extractor.finish().is_empty());
    }

    #[test]
    fn marker_with_suffix_is_not_a_frame() {
        let (segments, extractor) = run(&["event: creditsX\ndata: {}\n"]);
        assert_eq!(text_of(&segments), "event: creditsX\ndata: {}\n");
        assert!(extractor.anomalies().is_empty());
    }

    #[test]
    fn frame_without_blank_line_terminates_at_data_line() {
        let (segments, _) = run(&["a\nevent: credits\ndata: {\"consumed_credits\":1}\nb"]);
        assert_eq!(text_of(&segments), "a\nb");
        assert_eq!(credits_of(&segments), vec![1.0]);
    }

    #[test]
    fn frame_at_end_of_stream_without_blank_line() {
        let (segments, extractor) = run(&["x", "event: credits\ndata: {\"consumed_credits\":3}\n"]);
        assert_eq!(text_of(&segments), "x");
        assert_eq!(credits_of(&segments), vec![3.0]);
        assert!(extractor.anomalies().is_empty());
    }

    #[test]
    fn invalid_payload_drops_frame_and_continues() {
        let (segments, extractor) =
            run(&["before", "event: credits\ndata: {not json}\n\n", "after"]);
        assert_eq!(text_of(&segments), "beforeafter");
        assert!(credits_of(&segments).is_empty());
        assert!(matches!(
            extractor.anomalies(),
            [FramingAnomaly::InvalidCreditPayload { .. }]
        ));
    }

    #[test]
    fn blank_line_before_data_is_malformed() {
        let (segments, extractor) = run(&["event: credits\nid: 1\n\nrest"]);
        assert_eq!(text_of(&segments), "rest");
        assert_eq!(
            extractor.anomalies(),
            &[FramingAnomaly::MalformedCreditFrame { len: 22 }]
        );
    }

    #[test]
    fn unterminated_frame_at_end_is_discarded() {
        let (segments, extractor) = run(&["text", "event: credits\nid: 9\ndata: {\"consu"]);
        assert_eq!(text_of(&segments), "text");
        assert!(credits_of(&segments).is_empty());
        assert!(matches!(
            extractor.anomalies(),
            [FramingAnomaly::UnterminatedCreditFrame { .. }]
        ));
    }

    #[test]
    fn incomplete_frame_is_held_untouched() {
        let mut extractor = CreditFrameExtractor::new();
        assert_eq!(
            extractor.push("hi event: credits\nid: 1\n"),
            vec![Segment::Text("hi ".to_string())]
        );
        assert_eq!(extractor.push("data: {\"consumed_credits\": 4}\n"), vec![]);
        assert_eq!(
            extractor.push("\nnext"),
            vec![
                Segment::Credit(CreditNotice {
                    consumed_credits: 4.0
                }),
                Segment::Text("next".to_string()),
            ]
        );
    }

    #[test]
    fn marker_followed_by_prose_passes_through() {
        let mut extractor = CreditFrameExtractor::new();
        assert_eq!(
            extractor.push("The server logs event: credits\n"),
            vec![Segment::Text("The server logs ".to_string())]
        );
        assert_eq!(
            extractor.push("whenever usage is billed.\n"),
            vec![Segment::Text(
                "event: credits\nwhenever usage is billed.\n".to_string()
            )]
        );
        assert_eq!(
            extractor.push("That is all."),
            vec![Segment::Text("That is all.".to_string())]
        );
        assert!(extractor.finish().is_empty());
        assert!(extractor.anomalies().is_empty());
    }

    #[test]
    fn unknown_line_before_data_is_not_a_frame() {
        let input = "event: credits\nnote: billing\ndata: {\"consumed_credits\": 1}\n";
        let (segments, extractor) = run(&[input]);
        assert_eq!(text_of(&segments), input);
        assert!(credits_of(&segments).is_empty());
        assert!(extractor.anomalies().is_empty());
    }

    #[test]
    fn blank_line_right_after_marker_is_text() {
        let (segments, extractor) = run(&["event: credits\n", "\nrest"]);
        assert_eq!(text_of(&segments), "event: credits\n\nrest");
        assert!(extractor.anomalies().is_empty());
    }

    #[test]
    fn retry_field_is_accepted() {
        let (segments, _) =
            run(&["a", "event: credits\nretry: 3000\nid: 7\ndata: {\"consumed_credits\": 2}\n\nb"]);
        assert_eq!(text_of(&segments), "ab");
        assert_eq!(credits_of(&segments), vec![2.0]);
    }

    #[test]
    fn decoder_buffer_cursor_and_compact() {
        let mut buffer = DecoderBuffer::new();
        buffer.append("abcdef");
        assert_eq!(buffer.take(2), "ab");
        assert_eq!(buffer.unread(), "cdef");
        buffer.compact();
        assert_eq!(buffer.unread(), "cdef");
        buffer.take(4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn marker_prefix_suffix_lengths() {
        assert_eq!(marker_prefix_suffix("abc"), 0);
        assert_eq!(marker_prefix_suffix("abc e"), 1);
        assert_eq!(marker_prefix_suffix("event: credit"), 13);
        assert_eq!(marker_prefix_suffix("event: credits"), 0);
    }
}
