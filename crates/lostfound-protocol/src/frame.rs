//! Line framing for the chunked stream body.
//!
//! Chunks arrive at arbitrary byte boundaries. The decoder keeps two pieces of
//! carry-over between calls: bytes of a UTF-8 sequence that has not been
//! completed yet, and text after the last newline.

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 line decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Undecoded bytes (at most an incomplete UTF-8 sequence after each feed).
    pending: Vec<u8>,
    /// Decoded text that has not been terminated by a newline yet.
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped. Text after the last
    /// terminator is kept for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.pending.extend_from_slice(chunk);
        self.decode_pending(false);
        self.drain_lines()
    }

    /// Flush the decoder at end of stream.
    ///
    /// Returns the trimmed unterminated tail, if any. A dangling partial
    /// UTF-8 sequence decodes to U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        self.decode_pending(true);
        // `feed` drains every terminated line, so the buffer holds one line at most.
        let tail = std::mem::take(&mut self.buffer);
        let trimmed = tail.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Bytes waiting for the rest of a multi-byte character.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    fn decode_pending(&mut self, flush: bool) {
        let mut rest: &[u8] = &self.pending;
        let mut consumed = 0;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.buffer.push_str(valid);
                    consumed += rest.len();
                    break;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    // `valid_up_to` always lands on a char boundary.
                    self.buffer
                        .push_str(std::str::from_utf8(&rest[..valid_len]).unwrap_or_default());
                    match err.error_len() {
                        Some(invalid_len) => {
                            self.buffer.push(REPLACEMENT);
                            consumed += valid_len + invalid_len;
                            rest = &rest[valid_len + invalid_len..];
                        }
                        None if flush => {
                            self.buffer.push(REPLACEMENT);
                            consumed += rest.len();
                            break;
                        }
                        None => {
                            consumed += valid_len;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }
}
