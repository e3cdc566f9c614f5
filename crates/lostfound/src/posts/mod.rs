//! Lost-and-found posts and claims.

pub mod models;
pub mod service;

pub use models::{
    Campus, ClaimRecord, Item, MyPostStatus, PostStatus, PublishRecord, PublishType,
    claim_from_entry, item_from_detail, item_from_list_entry, publish_record_from_detail,
    publish_record_from_my_post,
};
pub use service::{
    ClaimAction, ClaimApplication, MyPostQuery, PostQuery, PostService, PublishPost, UpdatePost,
};
