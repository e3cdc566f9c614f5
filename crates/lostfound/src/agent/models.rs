//! Agent session and history records.

use log::debug;
use serde::Serialize;
use serde_json::Value;

use lostfound_protocol::value::{array_or_empty, id_text, text, text_array};

/// One agent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSession {
    /// Stable, non-empty identity.
    pub session_id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Author of a history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    #[default]
    Assistant,
}

impl HistoryRole {
    /// Only an exact `user` is a user message; everything else is the assistant.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "user" {
            Self::User
        } else {
            Self::Assistant
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One stored message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    /// Never empty.
    pub content: String,
    pub images: Vec<String>,
    pub created_at: String,
}

/// Convert a raw session record. Returns `None` without a usable `session_id`.
pub fn to_agent_session(raw: &Value) -> Option<AgentSession> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let session_id = id_text(fields.get("session_id"));
    if session_id.is_empty() {
        return None;
    }

    Some(AgentSession {
        session_id,
        title: text(fields.get("title")),
        created_at: text(fields.get("created_at")),
        updated_at: text(fields.get("updated_at")),
    })
}

/// Convert a raw history record. Returns `None` when it has no content.
pub fn to_agent_history_message(raw: &Value) -> Option<HistoryMessage> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let content = text(fields.get("content"));
    if content.is_empty() {
        return None;
    }

    Some(HistoryMessage {
        role: HistoryRole::parse(&text(fields.get("role"))),
        content,
        images: text_array(fields.get("images")),
        created_at: text(fields.get("created_at")),
    })
}

/// Sessions from a `{sessions: [...]}` payload, invalid entries dropped.
pub fn sessions_from_response(data: &Value) -> Vec<AgentSession> {
    let raw = array_or_empty(data.get("sessions"));
    let sessions: Vec<AgentSession> = raw.iter().filter_map(to_agent_session).collect();
    if sessions.len() != raw.len() {
        debug!(
            "Dropped {} malformed session record(s)",
            raw.len() - sessions.len()
        );
    }
    sessions
}

/// Messages from a `{messages: [...]}` payload, invalid entries dropped.
pub fn history_from_response(data: &Value) -> Vec<HistoryMessage> {
    let raw = array_or_empty(data.get("messages"));
    let messages: Vec<HistoryMessage> = raw.iter().filter_map(to_agent_history_message).collect();
    if messages.len() != raw.len() {
        debug!(
            "Dropped {} empty or malformed history record(s)",
            raw.len() - messages.len()
        );
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_requires_id() {
        assert_eq!(to_agent_session(&json!({})), None);
        assert_eq!(to_agent_session(&json!({"session_id": "   "})), None);
        assert_eq!(to_agent_session(&json!({"session_id": null})), None);
        assert_eq!(to_agent_session(&json!("s1")), None);
        assert_eq!(to_agent_session(&json!(null)), None);
    }

    #[test]
    fn test_session_defaults_fields() {
        let session = to_agent_session(&json!({"session_id": " 42 ", "title": null})).unwrap();
        assert_eq!(
            session,
            AgentSession {
                session_id: "42".into(),
                title: String::new(),
                created_at: String::new(),
                updated_at: String::new(),
            }
        );
    }

    #[test]
    fn test_session_accepts_numeric_id() {
        let session = to_agent_session(&json!({
            "session_id": 1024,
            "title": " 找钥匙 ",
            "created_at": "2025-03-01T10:00:00Z",
            "updated_at": 5
        }))
        .unwrap();
        assert_eq!(session.session_id, "1024");
        assert_eq!(session.title, "找钥匙");
        assert_eq!(session.created_at, "2025-03-01T10:00:00Z");
        assert_eq!(session.updated_at, "");
    }

    #[test]
    fn test_history_role_and_trim() {
        let message = to_agent_history_message(&json!({"role": "other", "content": " hi "})).unwrap();
        assert_eq!(message.role, HistoryRole::Assistant);
        assert_eq!(message.content, "hi");
        assert!(message.images.is_empty());
        assert_eq!(message.created_at, "");

        let message = to_agent_history_message(&json!({"role": " user ", "content": "x"})).unwrap();
        assert_eq!(message.role, HistoryRole::User);

        let message = to_agent_history_message(&json!({"role": "USER", "content": "x"})).unwrap();
        assert_eq!(message.role, HistoryRole::Assistant);
    }

    #[test]
    fn test_history_drops_empty_content() {
        assert_eq!(to_agent_history_message(&json!({"content": ""})), None);
        assert_eq!(to_agent_history_message(&json!({"content": "  "})), None);
        assert_eq!(to_agent_history_message(&json!({"content": 12})), None);
        assert_eq!(to_agent_history_message(&json!([])), None);
    }

    #[test]
    fn test_history_images_filtered() {
        let message = to_agent_history_message(&json!({
            "role": "user",
            "content": "看看这个",
            "images": ["https://cdn/a.png", 3, "", " https://cdn/b.png "]
        }))
        .unwrap();
        assert_eq!(message.images, vec!["https://cdn/a.png", "https://cdn/b.png"]);

        let message = to_agent_history_message(&json!({"content": "x", "images": "a.png"})).unwrap();
        assert!(message.images.is_empty());
    }

    #[test]
    fn test_list_helpers_keep_progress() {
        let data = json!({
            "sessions": [{"session_id": "a"}, {}, "junk", {"session_id": "b", "title": "t"}]
        });
        let ids: Vec<_> = sessions_from_response(&data)
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(sessions_from_response(&json!({"sessions": {"a": 1}})).is_empty());
        assert!(history_from_response(&json!(null)).is_empty());

        let data = json!({"messages": [{"content": ""}, {"role": "user", "content": "hello"}]});
        let messages = history_from_response(&data);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[test]
    fn test_history_serializes_role_lowercase() {
        let message = to_agent_history_message(&json!({"role": "user", "content": "x"})).unwrap();
        assert_eq!(serde_json::to_value(&message).unwrap()["role"], "user");
    }
}
