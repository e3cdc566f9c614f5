//! Post records and their mapping from backend payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lostfound_protocol::value::{count, flag, id_text, optional_text, text, text_array};

use crate::status::{
    self, ItemStatus, PostType, ReviewStatus, my_post_item_status, review_status,
};

/// Images kept on a publish record.
pub const MAX_RECORD_IMAGES: usize = 3;

// ============================================================================
// Wire enums
// ============================================================================

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().replace('-', "_");
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str().eq_ignore_ascii_case(&wanted))
                    .ok_or_else(|| {
                        let known: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown value '{}', expected one of {}", s, known.join(", "))
                    })
            }
        }
    };
}

wire_enum! {
    /// `publish_type` sent when publishing or filtering posts.
    pub enum PublishType {
        Lost => "LOST",
        Found => "FOUND",
    }
}

wire_enum! {
    /// Campus a post belongs to.
    pub enum Campus {
        ZhaoHui => "ZHAO_HUI",
        PingFeng => "PING_FENG",
        MoGanShan => "MO_GAN_SHAN",
    }
}

wire_enum! {
    /// Status filter of the public post list.
    pub enum PostStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Solved => "SOLVED",
        Cancelled => "CANCELLED",
        Rejected => "REJECTED",
        Archived => "ARCHIVED",
    }
}

wire_enum! {
    /// Status filter of the caller's own posts.
    pub enum MyPostStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Solved => "SOLVED",
        Cancelled => "CANCELLED",
        Rejected => "REJECTED",
    }
}

// ============================================================================
// Records
// ============================================================================

/// A lost or found listing as shown to any user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: String,
    pub campus: String,
    pub event_time: String,
    pub features: String,
    pub has_reward: bool,
    pub images: Vec<String>,
    pub item_name: String,
    /// Free-form `item_type_other` when present, else `item_type`.
    pub item_type: String,
    pub location: String,
    pub storage_location: String,
    /// Raw `publish_type` as sent by the backend.
    pub publish_type: String,
    pub reward_description: Option<String>,
    /// Raw `status` as sent by the backend.
    pub status: String,
    pub claim_count: u64,
    pub contact: String,
    pub post_type: PostType,
    pub item_status: ItemStatus,
}

/// One of the caller's own posts, as seen by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRecord {
    pub id: String,
    pub post_type: PostType,
    pub item_type: String,
    pub location: String,
    pub item_name: String,
    pub event_time: String,
    pub features: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub has_reward: bool,
    pub reward_description: Option<String>,
    pub images: Vec<String>,
    pub created_at: String,
    pub review_status: ReviewStatus,
    pub item_status: ItemStatus,
    pub reject_reason: Option<String>,
    pub updated_at: Option<String>,
}

/// A claim filed against a found item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimRecord {
    pub id: String,
    pub post_id: String,
    pub description: String,
    pub proof_images: Vec<String>,
    pub status: String,
    pub created_at: String,
}

// ============================================================================
// Mapping
// ============================================================================

fn item_type(fields: &serde_json::Map<String, Value>) -> String {
    optional_text(fields.get("item_type_other")).unwrap_or_else(|| text(fields.get("item_type")))
}

/// Map an entry of `/post/list`.
///
/// List entries carry no contact or storage details; storage falls back to
/// the location and the claim count is zero.
pub fn item_from_list_entry(raw: &Value) -> Option<Item> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let publish_type = text(fields.get("publish_type"));
    let raw_status = text(fields.get("status"));
    let location = text(fields.get("location"));

    Some(Item {
        id: id_text(fields.get("id")),
        campus: text(fields.get("campus")),
        event_time: text(fields.get("event_time")),
        features: text(fields.get("features")),
        has_reward: flag(fields.get("has_reward")),
        images: text_array(fields.get("images")),
        item_name: text(fields.get("item_name")),
        item_type: item_type(fields),
        storage_location: location.clone(),
        location,
        reward_description: optional_text(fields.get("reward_description")),
        claim_count: 0,
        contact: String::new(),
        post_type: status::post_type(&publish_type),
        item_status: status::item_status(&raw_status, &publish_type),
        publish_type,
        status: raw_status,
    })
}

/// Map the `/post/detail` payload to a listing.
pub fn item_from_detail(raw: &Value) -> Option<Item> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let mut item = item_from_list_entry(raw)?;
    if let Some(storage) = optional_text(fields.get("storage_location")) {
        item.storage_location = storage;
    }
    item.claim_count = count(fields.get("claim_count"));
    item.contact = [
        text(fields.get("contact_name")),
        text(fields.get("contact_phone")),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ");
    Some(item)
}

/// Map the `/post/detail` payload to an author-side record.
///
/// Only the coded `status` is considered; the detail payload has no label.
pub fn publish_record_from_detail(raw: &Value) -> Option<PublishRecord> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let post_type = status::post_type(&text(fields.get("publish_type")));
    let review = review_status(&text(fields.get("status")), None);
    let mut images = text_array(fields.get("images"));
    images.truncate(MAX_RECORD_IMAGES);

    Some(PublishRecord {
        id: id_text(fields.get("id")),
        post_type,
        item_type: item_type(fields),
        location: text(fields.get("location")),
        item_name: text(fields.get("item_name")),
        event_time: text(fields.get("event_time")),
        features: text(fields.get("features")),
        contact_name: text(fields.get("contact_name")),
        contact_phone: text(fields.get("contact_phone")),
        has_reward: flag(fields.get("has_reward")),
        reward_description: optional_text(fields.get("reward_description")),
        images,
        created_at: text(fields.get("created_at")),
        review_status: review,
        item_status: my_post_item_status(post_type, review),
        reject_reason: optional_text(fields.get("reject_reason")),
        updated_at: optional_text(fields.get("processed_at")),
    })
}

/// Map an entry of `/post/my-list`.
///
/// The list view carries no contact, feature or image data.
pub fn publish_record_from_my_post(raw: &Value) -> Option<PublishRecord> {
    let Value::Object(fields) = raw else {
        return None;
    };

    let post_type = status::post_type(&text(fields.get("publish_type")));
    let status_text = text(fields.get("status_text"));
    let review = review_status(&text(fields.get("status")), Some(&status_text));

    Some(PublishRecord {
        id: id_text(fields.get("id")),
        post_type,
        item_type: item_type(fields),
        location: text(fields.get("location")),
        item_name: text(fields.get("item_name")),
        event_time: text(fields.get("event_time")),
        features: String::new(),
        contact_name: String::new(),
        contact_phone: String::new(),
        has_reward: false,
        reward_description: None,
        images: Vec::new(),
        created_at: text(fields.get("created_at")),
        review_status: review,
        item_status: my_post_item_status(post_type, review),
        reject_reason: optional_text(fields.get("reject_reason")),
        updated_at: None,
    })
}

/// Map an entry of `/claim/list`.
pub fn claim_from_entry(raw: &Value) -> Option<ClaimRecord> {
    let Value::Object(fields) = raw else {
        return None;
    };

    Some(ClaimRecord {
        id: id_text(fields.get("id")),
        post_id: id_text(fields.get("post_id")),
        description: text(fields.get("description")),
        proof_images: text_array(fields.get("proof_images")),
        status: text(fields.get("status")),
        created_at: text(fields.get("created_at")),
    })
}
