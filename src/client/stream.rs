//! # Progress Stream Decoder
//!
//! Incremental decoder for the `text/event-stream` style progress feed
//! served by the guest sync endpoint. Frames are separated by a blank line
//! and carry a JSON body in `data:` lines:
//!
//! ```text
//! data: {"type":"progress","message":"Synced 12 of 40 guests","progress":30}
//!
//! ```
//!
//! The decoder is transport agnostic: raw network chunks go in and complete
//! messages come out, regardless of how the stream was split on the wire.
//! Malformed frames are logged and skipped so a single bad frame never
//! tears down a running sync.

use tracing::{debug, warn};

use crate::shared::progress::SyncProgressMessage;

/// Highest progress value accepted from the wire
const MAX_PROGRESS: u8 = 100;

/// Incremental frame decoder for the progress stream.
///
/// Buffers raw bytes and yields one [`SyncProgressMessage`] per complete
/// frame, in wire order. Frames that cannot be decoded are counted in
/// [`discarded`](Self::discarded) and skipped.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already scanned and known to hold no terminator
    scanned: usize,
    discarded: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes and collect every message it completes.
    ///
    /// Chunk boundaries carry no meaning: a frame may arrive split across
    /// any number of chunks, or several frames may arrive in one chunk.
    /// Splits inside multi-byte UTF-8 sequences are handled because frames
    /// are only decoded once fully buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SyncProgressMessage> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some((end, terminator)) = self.frame_end() {
            let frame: Vec<u8> = self.buf[..end].to_vec();
            self.buf.drain(..end + terminator);
            self.scanned = 0;
            if let Some(msg) = self.decode_frame(&frame) {
                out.push(msg);
            }
        }
        out
    }

    /// Flush any trailing bytes as a final, unterminated frame.
    ///
    /// Called once at end of stream. Servers normally terminate the last
    /// frame, but a connection torn down mid-write can leave a complete
    /// `data:` line in the buffer.
    pub fn finish(&mut self) -> Vec<SyncProgressMessage> {
        if self.buf.is_empty() {
            return Vec::new();
        }
        let frame = std::mem::take(&mut self.buf);
        self.scanned = 0;
        self.decode_frame(&frame).into_iter().collect()
    }

    /// Number of frames discarded as malformed so far
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Bytes currently buffered waiting for a frame terminator
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Find the first frame terminator, returning the frame length and the
    /// terminator length. Handles both `\n\n` and CRLF (`\r\n\r\n`) streams;
    /// the latter shows up here as `\n` followed by `\r\n`. Scanning resumes
    /// where the previous call left off, so a frame spread over many chunks
    /// is examined once rather than once per chunk.
    fn frame_end(&mut self) -> Option<(usize, usize)> {
        for i in self.scanned..self.buf.len() {
            if self.buf[i] != b'\n' {
                continue;
            }
            if self.buf.get(i + 1) == Some(&b'\n') {
                return Some((i, 2));
            }
            if self.buf.get(i + 1) == Some(&b'\r') && self.buf.get(i + 2) == Some(&b'\n') {
                return Some((i, 3));
            }
        }
        // The last two positions stay unscanned; their lookahead bytes have
        // not arrived yet
        self.scanned = self.buf.len().saturating_sub(2);
        None
    }

    fn decode_frame(&mut self, frame: &[u8]) -> Option<SyncProgressMessage> {
        let frame = frame.strip_suffix(b"\r").unwrap_or(frame);
        let text = String::from_utf8_lossy(frame);
        let mut data: Vec<&str> = Vec::new();
        for raw in text.lines() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("data:") {
                data.push(rest.strip_prefix(' ').unwrap_or(rest));
            } else if is_field_line(line) {
                continue;
            } else {
                // Some servers send the bare JSON body without a field name
                data.push(line);
            }
        }
        let saw_data = !data.is_empty();
        let payload = data.join("\n");
        let payload = payload.trim();
        if payload.is_empty() {
            if saw_data {
                warn!("[Decoder] Skipping frame with empty data payload");
            } else {
                // Comment-only or blank frames are keep-alive chatter
                debug!("[Decoder] Skipping frame without data payload");
            }
            return None;
        }
        match serde_json::from_str::<SyncProgressMessage>(payload) {
            Ok(msg) if msg.progress > MAX_PROGRESS => {
                self.discarded += 1;
                warn!(
                    "[Decoder] Discarding frame with out-of-range progress {}: {}",
                    msg.progress, payload
                );
                None
            }
            Ok(msg) => Some(msg),
            Err(e) => {
                self.discarded += 1;
                warn!("[Decoder] Discarding malformed frame: {} ({})", payload, e);
                None
            }
        }
    }
}

/// SSE field lines other than `data:` carry no payload for us
fn is_field_line(line: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
}
