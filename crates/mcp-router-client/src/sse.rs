//! SSE (Server-Sent Events) frame parser
//!
//! Each protocol response is a stream of `event: message\ndata: <json>\n\n`
//! frames. The client only consumes the first frame that carries data; bytes
//! are fed in as they arrive so the client can stop reading as soon as that
//! frame is complete instead of waiting for the stream to close.
//!
//! Progress or notification frames sent after the first data frame are not
//! read.

use bytes::Bytes;
use tracing::trace;

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, if present
    pub event: Option<String>,
    /// Joined `data:` lines
    pub data: String,
}

/// Incremental SSE parser state
#[derive(Debug, Default)]
pub struct SseParser {
    /// Buffer for incomplete lines
    buffer: Vec<u8>,
    /// Current event data being accumulated
    data_buffer: Option<String>,
    /// Current event type (if any)
    event_type: Option<String>,
    /// Set once a line turned out not to be UTF-8
    invalid_utf8: bool,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and return the first complete frame, if
    /// one has been completed by these bytes.
    ///
    /// Bytes after the completed frame stay buffered and are never parsed.
    pub fn feed(&mut self, bytes: &Bytes) -> Option<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<_>>();
            let line = &line[..line.len() - 1];

            // Handle \r\n line endings
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if let Some(frame) = self.process_line(line) {
                return Some(frame);
            }
        }

        None
    }

    /// Flush at end of stream: a trailing frame without the terminating blank
    /// line is still dispatched.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = rest.strip_suffix(b"\r").unwrap_or(&rest).to_vec();
            if let Some(frame) = self.process_line(&rest) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    /// Whether a non-UTF-8 line was skipped
    pub fn saw_invalid_utf8(&self) -> bool {
        self.invalid_utf8
    }

    /// Process a single line of SSE data
    fn process_line(&mut self, line: &[u8]) -> Option<SseFrame> {
        // Empty line signals end of event
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment line (keepalive)
        if line.starts_with(b":") {
            trace!("SSE keepalive/comment");
            return None;
        }

        let Ok(line) = std::str::from_utf8(line) else {
            self.invalid_utf8 = true;
            return None;
        };

        // Split on first colon
        let (field, value) = match line.find(':') {
            Some(colon_pos) => {
                let (f, v) = line.split_at(colon_pos);
                let v = &v[1..];
                (f, v.strip_prefix(' ').unwrap_or(v))
            }
            None => (line, ""),
        };

        match field {
            "data" => {
                let data = self.data_buffer.get_or_insert_with(String::new);
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value);
            }
            "event" => {
                self.event_type = Some(value.to_string());
            }
            _ => {
                // id, retry and unknown fields are irrelevant here
                trace!("SSE field ignored: {}", field);
            }
        }

        None
    }

    /// Dispatch the accumulated event, if it carried data
    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event_type.take();
        let data = self.data_buffer.take()?;
        Some(SseFrame { event, data })
    }
}

/// Extract the first data frame from a complete body
pub fn first_frame(body: &[u8]) -> Option<SseFrame> {
    let mut parser = SseParser::new();
    parser
        .feed(&Bytes::copy_from_slice(body))
        .or_else(|| parser.finish())
}
