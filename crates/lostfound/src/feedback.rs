//! Reports about problematic posts.

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::{Value, json};

use lostfound_protocol::value::{flag, id_text, text};

use crate::error::ApiResult;
use crate::page::{Page, page_number, page_size};
use crate::transport::{ApiRequest, RequestTransport};

/// Report categories the backend knows by name.
pub const PRESET_FEEDBACK_TYPES: &[&str] = &["信息不全", "不实消息", "恶心血腥", "涉黄信息"];

/// Category used for free-form report types, which travel in `type_other`.
pub const OTHER_FEEDBACK_TYPE: &str = "其它类型";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Pending,
    Processed,
}

impl FeedbackStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "待审核",
            Self::Processed => "已处理",
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A report filed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub post_id: String,
    /// Zero or one entry: the preset type, or the free-form one.
    pub types: Vec<String>,
    pub description: String,
    pub created_at: String,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackQuery {
    pub processed: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Map an entry of `/feedback/my-list`.
pub fn feedback_from_entry(raw: &Value) -> Option<FeedbackRecord> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let kind = text(fields.get("type"));
    let other = text(fields.get("type_other"));
    let merged = if kind == OTHER_FEEDBACK_TYPE && !other.is_empty() {
        other
    } else {
        kind
    };

    Some(FeedbackRecord {
        id: id_text(fields.get("id")),
        post_id: id_text(fields.get("post_id")),
        types: if merged.is_empty() { Vec::new() } else { vec![merged] },
        description: text(fields.get("description")),
        created_at: text(fields.get("created_at")),
        status: if flag(fields.get("processed")) {
            FeedbackStatus::Processed
        } else {
            FeedbackStatus::Pending
        },
    })
}

/// `(type, type_other)` for one report category.
fn submit_type(kind: &str) -> (&str, &str) {
    if PRESET_FEEDBACK_TYPES.contains(&kind) {
        (kind, "")
    } else {
        (OTHER_FEEDBACK_TYPE, kind)
    }
}

#[derive(Clone)]
pub struct FeedbackService {
    transport: Arc<dyn RequestTransport>,
}

impl FeedbackService {
    pub fn new(transport: Arc<dyn RequestTransport>) -> Self {
        Self { transport }
    }

    /// Reports filed by the caller.
    pub async fn feedback_records(&self, query: &FeedbackQuery) -> ApiResult<Vec<FeedbackRecord>> {
        let request = ApiRequest::get("/feedback/my-list")
            .query_opt("processed", query.processed)
            .query("page", page_number(query.page))
            .query("page_size", page_size(query.page_size));
        let data = self.transport.request(request).await?;
        Ok(Page::from_response(&data, feedback_from_entry).list)
    }

    /// Report a post under one or more categories.
    ///
    /// One request is sent per non-empty category, in order; the first
    /// failure aborts the rest. Returns the created feedback ids.
    pub async fn submit_feedback(
        &self,
        post_id: Option<i64>,
        types: &[String],
        description: &str,
    ) -> ApiResult<Vec<String>> {
        let post_id = post_id.filter(|id| *id >= 0).unwrap_or(0);
        let description = description.trim();

        let mut ids = Vec::new();
        for kind in types.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let (kind, other) = submit_type(kind);
            debug!("Submitting feedback {} for post {}", kind, post_id);
            let data = self
                .transport
                .request(ApiRequest::post("/feedback/submit").json(json!({
                    "post_id": post_id,
                    "type": kind,
                    "type_other": other,
                    "description": description,
                })))
                .await?;
            ids.push(id_text(data.get("feedback_id")));
        }
        Ok(ids)
    }
}
