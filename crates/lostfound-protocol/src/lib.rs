//! Wire-level pieces of the lostfound agent chat stream.
//!
//! The agent endpoint answers with a chunked text body. Meaningful lines start
//! with `data:` and carry either a JSON event or the `[DONE]` sentinel:
//!
//! ```text
//! transport bytes --> FrameDecoder --> lines --> classify_line --> Frame
//!                                                                    |
//!                                       StreamParser (Streaming -> Done)
//! ```
//!
//! Nothing in this crate performs I/O. The client crate drives a
//! [`StreamParser`] from its read loop and owns cancellation.
//!
//! ## Design Principles
//!
//! 1. **Decoding never fails.** Malformed frames are dropped, missing fields default.
//! 2. **Order is preserved.** One event per valid line, dispatched in arrival order.
//! 3. **Done is terminal.** After the sentinel no further input is looked at.

pub mod events;
pub mod frame;
pub mod parser;
pub mod value;

pub use events::{Frame, StreamEvent, ToolCall, ToolResult, classify_line, parse_event};
pub use frame::FrameDecoder;
pub use parser::{StreamParser, StreamState};
