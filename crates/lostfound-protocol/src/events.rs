//! Stream event types and line classification.
//!
//! Wire shapes, one per `data:` line:
//!
//! ```text
//! {"type":"content","content":string}
//! {"type":"tool_call","data":{"id":string,"name":string,"arguments":string}}
//! {"type":"tool_result","data":{"tool_call_id":string,"tool_name":string,"result":string}}
//! [DONE]
//! ```

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::value::{object_or_empty, raw_text, text};

/// Prefix carried by every meaningful line.
pub const DATA_PREFIX: &str = "data:";

/// Termination marker.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A tool invocation announced by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw argument text as sent by the agent (usually JSON).
    pub arguments: String,
}

/// The outcome of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: String,
}

/// One decoded stream event. Serializes back to the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Assistant text delta. Whitespace is preserved.
    Content {
        #[serde(rename = "content")]
        text: String,
    },
    ToolCall { data: ToolCall },
    ToolResult { data: ToolResult },
}

impl StreamEvent {
    /// Wire discriminator for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Content { .. } => "content",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
        }
    }
}

/// Result of classifying a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Event(StreamEvent),
    Done,
}

/// Classify one decoded line.
///
/// Returns `None` for anything that is not a valid frame: lines without the
/// `data:` prefix, empty payloads, malformed JSON, unknown discriminators.
pub fn classify_line(line: &str) -> Option<Frame> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim_start();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(Frame::Done);
    }
    parse_event(payload).map(Frame::Event)
}

/// Parse a frame payload into an event.
pub fn parse_event(payload: &str) -> Option<StreamEvent> {
    let parsed: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Dropping malformed stream frame: {}", e);
            return None;
        }
    };
    let Value::Object(fields) = &parsed else {
        debug!("Dropping non-object stream frame");
        return None;
    };

    match text(fields.get("type")).as_str() {
        "content" => Some(StreamEvent::Content {
            text: raw_text(fields.get("content")),
        }),
        "tool_call" => {
            let data = object_or_empty(fields.get("data"));
            Some(StreamEvent::ToolCall {
                data: ToolCall {
                    id: text(data.get("id")),
                    name: text(data.get("name")),
                    arguments: text(data.get("arguments")),
                },
            })
        }
        "tool_result" => {
            let data = object_or_empty(fields.get("data"));
            Some(StreamEvent::ToolResult {
                data: ToolResult {
                    tool_call_id: text(data.get("tool_call_id")),
                    tool_name: text(data.get("tool_name")),
                    result: text(data.get("result")),
                },
            })
        }
        other => {
            debug!("Dropping stream frame with unknown type {:?}", other);
            None
        }
    }
}
