//! Agent chat: conversation records and the streaming chat endpoint.

pub mod models;
pub mod service;

pub use models::{
    AgentSession, HistoryMessage, HistoryRole, history_from_response, sessions_from_response,
    to_agent_history_message, to_agent_session,
};
pub use service::{AgentService, StreamRequest};
