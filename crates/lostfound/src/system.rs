//! Public system configuration and announcements.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use lostfound_protocol::value::{count, id_text, text, text_array};

use crate::error::ApiResult;
use crate::page::{Page, page_number, page_size};
use crate::transport::{ApiRequest, RequestTransport};

/// Keys the item type list has been published under, in order of preference.
const ITEM_TYPE_KEYS: &[&str] = &["item_types", "item_config", "itemConfig", "itemconfig"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicConfig {
    pub item_types: Vec<String>,
    pub feedback_types: Vec<String>,
    pub claim_validity_days: u64,
    pub publish_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
}

/// Map the `/system/config` payload. The first key holding an array wins,
/// even when that array is empty.
pub fn public_config_from_response(data: &Value) -> PublicConfig {
    let item_types = ITEM_TYPE_KEYS
        .iter()
        .find_map(|key| data.get(*key).filter(|value| value.is_array()))
        .map(|value| text_array(Some(value)))
        .unwrap_or_default();

    PublicConfig {
        item_types,
        feedback_types: text_array(data.get("feedback_types")),
        claim_validity_days: count(data.get("claim_validity_days")),
        publish_limit: count(data.get("publish_limit")),
    }
}

pub fn announcement_from_entry(raw: &Value) -> Option<Announcement> {
    let Value::Object(fields) = raw else {
        return None;
    };
    Some(Announcement {
        id: id_text(fields.get("id")),
        title: text(fields.get("title")),
        content: text(fields.get("content")),
        kind: text(fields.get("type")),
        created_at: text(fields.get("created_at")),
    })
}

#[derive(Clone)]
pub struct SystemService {
    transport: Arc<dyn RequestTransport>,
}

impl SystemService {
    pub fn new(transport: Arc<dyn RequestTransport>) -> Self {
        Self { transport }
    }

    pub async fn public_config(&self) -> ApiResult<PublicConfig> {
        let data = self
            .transport
            .request(ApiRequest::get("/system/config"))
            .await?;
        Ok(public_config_from_response(&data))
    }

    pub async fn announcements(
        &self,
        page: Option<i64>,
        size: Option<i64>,
    ) -> ApiResult<Page<Announcement>> {
        let request = ApiRequest::get("/announcement/list")
            .query("page", page_number(page))
            .query("page_size", page_size(size));
        let data = self.transport.request(request).await?;
        Ok(Page::from_response(&data, announcement_from_entry))
    }
}
