//! Agent chat API: sessions, history and streamed replies.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use lostfound_protocol::StreamEvent;
use lostfound_protocol::value::id_text;

use super::models::{AgentSession, HistoryMessage, history_from_response, sessions_from_response};
use crate::error::{ApiError, ApiResult};
use crate::stream::{StreamOutcome, consume_stream};
use crate::transport::{ApiRequest, RequestTransport};

/// One user message to send to the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamRequest {
    pub session_id: String,
    pub message: String,
    pub images: Vec<String>,
}

impl StreamRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Trimmed copy ready for the wire. Fails before any I/O on empty fields.
    fn normalized(&self) -> ApiResult<Self> {
        let session_id = self.session_id.trim();
        if session_id.is_empty() {
            return Err(ApiError::InvalidInput(
                "session id must not be empty".to_string(),
            ));
        }
        let message = self.message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("message must not be empty".to_string()));
        }
        Ok(Self {
            session_id: session_id.to_string(),
            message: message.to_string(),
            images: self
                .images
                .iter()
                .map(|image| image.trim())
                .filter(|image| !image.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// Agent endpoints over a [`RequestTransport`].
#[derive(Clone)]
pub struct AgentService {
    transport: Arc<dyn RequestTransport>,
}

impl AgentService {
    pub fn new(transport: Arc<dyn RequestTransport>) -> Self {
        Self { transport }
    }

    /// Create a conversation and return its id.
    pub async fn create_session(&self, title: Option<&str>) -> ApiResult<String> {
        let body = match title.map(str::trim).filter(|title| !title.is_empty()) {
            Some(title) => json!({ "title": title }),
            None => json!({}),
        };

        let data = self
            .transport
            .request(ApiRequest::post("/agent/session").json(body))
            .await?;

        let session_id = id_text(data.get("session_id"));
        if session_id.is_empty() {
            return Err(ApiError::request("session creation returned no id"));
        }
        info!("Created agent session {}", session_id);
        Ok(session_id)
    }

    /// List the caller's conversations.
    pub async fn list_sessions(&self) -> ApiResult<Vec<AgentSession>> {
        let data = self
            .transport
            .request(ApiRequest::get("/agent/sessions"))
            .await?;
        Ok(sessions_from_response(&data))
    }

    /// Stored messages of one conversation.
    pub async fn history(&self, session_id: &str) -> ApiResult<Vec<HistoryMessage>> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ApiError::InvalidInput(
                "session id must not be empty".to_string(),
            ));
        }

        let data = self
            .transport
            .request(ApiRequest::get("/agent/history").query("session_id", session_id))
            .await?;
        Ok(history_from_response(&data))
    }

    /// Send a message and stream the reply.
    ///
    /// `on_event` receives every event in arrival order. `on_done` runs once
    /// when the reply completes and never after `cancel` fires.
    pub async fn stream_message<E, D>(
        &self,
        request: &StreamRequest,
        cancel: &CancellationToken,
        on_event: E,
        on_done: D,
    ) -> ApiResult<StreamOutcome>
    where
        E: FnMut(StreamEvent),
        D: FnOnce(),
    {
        let payload = request.normalized()?;
        let body = json!({
            "session_id": payload.session_id,
            "message": payload.message,
            "images": payload.images,
        });

        debug!("Streaming message to session {}", payload.session_id);
        let Some(stream) = self
            .transport
            .open_stream(ApiRequest::post("/agent/stream").json(body), cancel)
            .await?
        else {
            debug!("Stream cancelled before the response arrived");
            return Ok(StreamOutcome::Cancelled { events: 0 });
        };

        consume_stream(stream, cancel, on_event, on_done).await
    }
}
