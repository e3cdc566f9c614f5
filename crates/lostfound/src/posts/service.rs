//! Post and claim endpoints.
//!
//! Outgoing payloads are normalized before sending: text is trimmed and cut
//! to the backend's column limits, image lists are cleaned and capped.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;
use serde_json::{Value, json};

use lostfound_protocol::value::{flag, id_text};

use super::models::{
    Campus, ClaimRecord, Item, MAX_RECORD_IMAGES, MyPostStatus, PostStatus, PublishRecord,
    PublishType, claim_from_entry, item_from_detail, item_from_list_entry,
    publish_record_from_detail, publish_record_from_my_post,
};
use crate::error::{ApiError, ApiResult};
use crate::page::{Page, clean_list, page_number, page_size, truncate, truncate_opt};
use crate::transport::{ApiRequest, RequestTransport};

const ITEM_NAME_MAX: usize = 50;
const ITEM_TYPE_MAX: usize = 20;
const ITEM_TYPE_OTHER_MAX: usize = 15;
const LOCATION_MAX: usize = 100;
const STORAGE_LOCATION_MAX: usize = 100;
const PUBLISH_FEATURES_MAX: usize = 255;
const UPDATE_FEATURES_MAX: usize = 200;
const CONTACT_NAME_MAX: usize = 30;
const CONTACT_PHONE_MAX: usize = 20;
const REWARD_MAX: usize = 255;
const CLAIM_DESCRIPTION_MAX: usize = 500;
const CLAIM_PROOF_IMAGES_MAX: usize = 255;

// ============================================================================
// Requests
// ============================================================================

/// Filters for the public post list.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub publish_type: Option<PublishType>,
    pub item_type: Option<String>,
    pub campus: Option<Campus>,
    pub location: Option<String>,
    pub status: Option<PostStatus>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PostQuery {
    fn to_request(&self) -> ApiRequest {
        ApiRequest::get("/post/list")
            .query_opt("publish_type", self.publish_type)
            .query_opt(
                "item_type",
                truncate_opt(self.item_type.as_deref(), ITEM_TYPE_MAX),
            )
            .query_opt("campus", self.campus)
            .query_opt(
                "location",
                truncate_opt(self.location.as_deref(), LOCATION_MAX),
            )
            .query_opt("status", self.status)
            .query_opt("start_time", non_empty(self.start_time.as_deref()))
            .query_opt("end_time", non_empty(self.end_time.as_deref()))
            .query("page", page_number(self.page))
            .query("page_size", page_size(self.page_size))
    }
}

/// Filters for the caller's own posts.
#[derive(Debug, Clone, Default)]
pub struct MyPostQuery {
    pub publish_type: Option<PublishType>,
    pub status: Option<MyPostStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl MyPostQuery {
    fn to_request(&self) -> ApiRequest {
        ApiRequest::get("/post/my-list")
            .query_opt("publish_type", self.publish_type)
            .query_opt("status", self.status)
            .query("page", page_number(self.page))
            .query("page_size", page_size(self.page_size))
    }
}

/// A new post.
#[derive(Debug, Clone, Serialize)]
pub struct PublishPost {
    pub publish_type: PublishType,
    pub item_name: String,
    pub item_type: String,
    pub campus: Campus,
    pub location: String,
    pub storage_location: String,
    pub event_time: String,
    pub features: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub has_reward: bool,
    pub reward_description: String,
    pub images: Vec<String>,
}

impl PublishPost {
    fn normalized(&self) -> Self {
        Self {
            publish_type: self.publish_type,
            item_name: truncate(&self.item_name, ITEM_NAME_MAX),
            item_type: truncate(&self.item_type, ITEM_TYPE_MAX),
            campus: self.campus,
            location: truncate(&self.location, LOCATION_MAX),
            storage_location: truncate(&self.storage_location, STORAGE_LOCATION_MAX),
            event_time: self.event_time.clone(),
            features: truncate(&self.features, PUBLISH_FEATURES_MAX),
            contact_name: truncate(&self.contact_name, CONTACT_NAME_MAX),
            contact_phone: truncate(&self.contact_phone, CONTACT_PHONE_MAX),
            has_reward: self.has_reward,
            reward_description: reward(self.has_reward, &self.reward_description),
            images: clean_list(&self.images, MAX_RECORD_IMAGES),
        }
    }
}

/// Edits to an existing post.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatePost {
    pub post_id: u64,
    pub item_name: String,
    pub item_type: String,
    pub item_type_other: String,
    pub campus: Campus,
    pub location: String,
    pub storage_location: String,
    pub event_time: String,
    pub features: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub has_reward: bool,
    pub reward_description: String,
    pub images: Vec<String>,
}

impl UpdatePost {
    fn normalized(&self) -> Self {
        Self {
            post_id: self.post_id,
            item_name: truncate(&self.item_name, ITEM_NAME_MAX),
            item_type: truncate(&self.item_type, ITEM_TYPE_MAX),
            item_type_other: truncate(&self.item_type_other, ITEM_TYPE_OTHER_MAX),
            campus: self.campus,
            location: truncate(&self.location, LOCATION_MAX),
            storage_location: truncate(&self.storage_location, STORAGE_LOCATION_MAX),
            event_time: self.event_time.clone(),
            features: truncate(&self.features, UPDATE_FEATURES_MAX),
            contact_name: truncate(&self.contact_name, CONTACT_NAME_MAX),
            contact_phone: truncate(&self.contact_phone, CONTACT_PHONE_MAX),
            has_reward: self.has_reward,
            reward_description: reward(self.has_reward, &self.reward_description),
            images: clean_list(&self.images, MAX_RECORD_IMAGES),
        }
    }
}

/// A claim on a found item.
#[derive(Debug, Clone, Default)]
pub struct ClaimApplication {
    /// Post id as entered; anything that is not a whole number is sent as 0.
    pub post_id: String,
    pub description: String,
    pub proof_images: Vec<String>,
}

/// Decision on a pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Approve,
    Reject,
}

impl ClaimAction {
    pub fn code(self) -> u8 {
        match self {
            Self::Approve => 1,
            Self::Reject => 2,
        }
    }
}

fn reward(has_reward: bool, description: &str) -> String {
    if has_reward {
        truncate(description, REWARD_MAX)
    } else {
        String::new()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn numeric_post_id(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

// ============================================================================
// Service
// ============================================================================

/// Post and claim endpoints over a [`RequestTransport`].
#[derive(Clone)]
pub struct PostService {
    transport: Arc<dyn RequestTransport>,
}

impl PostService {
    pub fn new(transport: Arc<dyn RequestTransport>) -> Self {
        Self { transport }
    }

    /// Public listing.
    pub async fn list_posts(&self, query: &PostQuery) -> ApiResult<Page<Item>> {
        let data = self.transport.request(query.to_request()).await?;
        Ok(Page::from_response(&data, item_from_list_entry))
    }

    async fn detail(&self, id: &str) -> ApiResult<Value> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidInput("post id must not be empty".to_string()));
        }
        self.transport
            .request(ApiRequest::get("/post/detail").query("id", id))
            .await
    }

    /// Full listing of one post.
    pub async fn post_detail(&self, id: &str) -> ApiResult<Item> {
        let data = self.detail(id).await?;
        item_from_detail(&data).ok_or_else(|| ApiError::Decode(format!("post {id}: not an object")))
    }

    /// One post from its author's point of view.
    pub async fn post_detail_record(&self, id: &str) -> ApiResult<PublishRecord> {
        let data = self.detail(id).await?;
        publish_record_from_detail(&data)
            .ok_or_else(|| ApiError::Decode(format!("post {id}: not an object")))
    }

    /// The caller's own posts.
    pub async fn my_posts(&self, query: &MyPostQuery) -> ApiResult<Page<PublishRecord>> {
        let data = self.transport.request(query.to_request()).await?;
        Ok(Page::from_response(&data, publish_record_from_my_post))
    }

    /// Publish a post and return its id.
    pub async fn publish_post(&self, post: &PublishPost) -> ApiResult<String> {
        let payload = post.normalized();
        let data = self
            .transport
            .request(ApiRequest::post("/post/publish").json(to_body(&payload)?))
            .await?;
        let id = id_text(data.get("id"));
        info!("Published post {}", id);
        Ok(id)
    }

    pub async fn update_post(&self, post: &UpdatePost) -> ApiResult<bool> {
        let payload = post.normalized();
        let data = self
            .transport
            .request(ApiRequest::put("/post/update").json(to_body(&payload)?))
            .await?;
        Ok(flag(data.get("success")))
    }

    pub async fn cancel_post(&self, post_id: u64, reason: &str) -> ApiResult<bool> {
        let data = self
            .transport
            .request(
                ApiRequest::post("/post/cancel")
                    .json(json!({ "post_id": post_id, "reason": reason.trim() })),
            )
            .await?;
        Ok(flag(data.get("success")))
    }

    pub async fn delete_post(&self, post_id: u64) -> ApiResult<bool> {
        let data = self
            .transport
            .request(ApiRequest::delete("/post/delete").json(json!({ "post_id": post_id })))
            .await?;
        Ok(flag(data.get("success")))
    }

    /// File a claim and return the claim id.
    pub async fn apply_claim(&self, claim: &ClaimApplication) -> ApiResult<String> {
        let post_id = numeric_post_id(&claim.post_id);
        if post_id == 0 {
            debug!("Claim post id {:?} is not numeric, sending 0", claim.post_id);
        }
        let body = json!({
            "post_id": post_id,
            "description": truncate(&claim.description, CLAIM_DESCRIPTION_MAX),
            "proof_images": clean_list(&claim.proof_images, CLAIM_PROOF_IMAGES_MAX),
        });
        let data = self
            .transport
            .request(ApiRequest::post("/claim/apply").json(body))
            .await?;
        Ok(id_text(data.get("claim_id")))
    }

    /// Claims filed against one post.
    pub async fn list_claims(&self, post_id: &str) -> ApiResult<Vec<ClaimRecord>> {
        let data = self
            .transport
            .request(ApiRequest::get("/claim/list").query("post_id", post_id.trim()))
            .await?;
        Ok(Page::from_response(&data, claim_from_entry).list)
    }

    pub async fn review_claim(&self, claim_id: u64, action: ClaimAction) -> ApiResult<bool> {
        let data = self
            .transport
            .request(
                ApiRequest::post("/claim/review")
                    .json(json!({ "claim_id": claim_id, "action": action.code() })),
            )
            .await?;
        Ok(flag(data.get("success")))
    }
}

fn to_body<T: Serialize>(payload: &T) -> ApiResult<Value> {
    serde_json::to_value(payload).map_err(|e| ApiError::InvalidInput(e.to_string()))
}
