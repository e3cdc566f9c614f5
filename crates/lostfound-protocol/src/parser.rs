//! Per-stream state machine: Streaming -> Done.

use crate::events::{Frame, StreamEvent, classify_line};
use crate::frame::FrameDecoder;

/// Lifecycle of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Streaming,
    Done,
}

/// Decodes one stream body and dispatches its events in arrival order.
///
/// Reaching [`StreamState::Done`] is final: remaining lines of the current
/// chunk and all later input are ignored.
#[derive(Debug, Default)]
pub struct StreamParser {
    decoder: FrameDecoder,
    state: StreamState,
    by_sentinel: bool,
    dispatched: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == StreamState::Done
    }

    /// Whether Done was reached through the `[DONE]` sentinel rather than end of input.
    pub fn completed_by_sentinel(&self) -> bool {
        self.by_sentinel
    }

    /// Number of events dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Feed one chunk of the body.
    pub fn push<F>(&mut self, chunk: &[u8], on_event: &mut F) -> StreamState
    where
        F: FnMut(StreamEvent),
    {
        if self.is_done() {
            return self.state;
        }

        for line in self.decoder.feed(chunk) {
            self.handle_line(&line, on_event);
            if self.is_done() {
                break;
            }
        }
        self.state
    }

    /// Signal end of input. Processes the unterminated tail and always ends in Done.
    pub fn finish<F>(&mut self, on_event: &mut F) -> StreamState
    where
        F: FnMut(StreamEvent),
    {
        if !self.is_done() {
            if let Some(tail) = self.decoder.finish() {
                self.handle_line(&tail, on_event);
            }
            self.state = StreamState::Done;
        }
        self.state
    }

    fn handle_line<F>(&mut self, line: &str, on_event: &mut F)
    where
        F: FnMut(StreamEvent),
    {
        match classify_line(line) {
            Some(Frame::Event(event)) => {
                self.dispatched += 1;
                on_event(event);
            }
            Some(Frame::Done) => {
                self.by_sentinel = true;
                self.state = StreamState::Done;
            }
            None => {}
        }
    }
}
