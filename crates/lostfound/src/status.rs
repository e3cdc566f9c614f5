//! Canonical post statuses.
//!
//! The backend speaks two generations of status vocabulary: symbolic values
//! (`APPROVED`, `SOLVED`, ...) and legacy numeric codes (`0`..`5`), sometimes
//! accompanied by a human-readable label. Everything here is pure and total:
//! unknown input falls through to a default.
//!
//! Cancelled and rejected posts resolve to the same terminal
//! [`ItemStatus::Returned`] as genuinely claimed items. Listings rely on this
//! to hide inactive posts.

use std::fmt;

use serde::Serialize;

/// Whether a post reports a lost item or a found one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    #[default]
    Lost,
    Found,
}

/// Availability of the item behind a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Searching,
    AwaitingClaim,
    Returned,
}

/// Moderation/workflow state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Matched,
    Claimed,
    Rejected,
    Cancelled,
}

impl PostType {
    /// Display label used by the backend and the web client.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lost => "失物",
            Self::Found => "招领",
        }
    }
}

impl ItemStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Searching => "寻找中",
            Self::AwaitingClaim => "待认领",
            Self::Returned => "已归还",
        }
    }
}

impl ReviewStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "待审核",
            Self::Approved => "已通过",
            Self::Matched => "已匹配",
            Self::Claimed => "已认领",
            Self::Rejected => "已驳回",
            Self::Cancelled => "已取消",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Rules
// ============================================================================

/// How a rule inspects its input.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Exact match on the trimmed human-readable label.
    Label(&'static str),
    /// Match on the trimmed, upper-cased status code.
    Code(&'static [&'static str]),
}

/// Trimmed raw inputs shared by all rules.
struct Subject<'a> {
    label: &'a str,
    code: String,
}

impl<'a> Subject<'a> {
    fn new(code: &str, label: &'a str) -> Self {
        Self {
            label: label.trim(),
            code: code.trim().to_uppercase(),
        }
    }

    fn matches(&self, matcher: Matcher) -> bool {
        match matcher {
            Matcher::Label(label) => self.label == label,
            Matcher::Code(codes) => codes.contains(&self.code.as_str()),
        }
    }
}

/// Review status rules, evaluated top to bottom. Labels come first so an
/// explicit label always overrides the coded value.
const REVIEW_RULES: &[(Matcher, ReviewStatus)] = &[
    (Matcher::Label("待审核"), ReviewStatus::Pending),
    (Matcher::Label("已通过"), ReviewStatus::Approved),
    (Matcher::Label("已匹配"), ReviewStatus::Matched),
    (Matcher::Label("已认领"), ReviewStatus::Claimed),
    (Matcher::Label("已解决"), ReviewStatus::Claimed),
    (Matcher::Label("已驳回"), ReviewStatus::Rejected),
    (Matcher::Label("已取消"), ReviewStatus::Cancelled),
    (Matcher::Label("已归档"), ReviewStatus::Claimed),
    (Matcher::Code(&["0", "PENDING"]), ReviewStatus::Pending),
    (Matcher::Code(&["1", "APPROVED"]), ReviewStatus::Approved),
    (Matcher::Code(&["2", "MATCHED"]), ReviewStatus::Matched),
    (
        Matcher::Code(&["3", "CLAIMED", "SOLVED", "ARCHIVED"]),
        ReviewStatus::Claimed,
    ),
    (
        Matcher::Code(&["4", "CANCELED", "CANCELLED"]),
        ReviewStatus::Cancelled,
    ),
    (Matcher::Code(&["5", "REJECTED"]), ReviewStatus::Rejected),
];

/// Raw statuses that take an item off the board.
const TERMINAL_ITEM_RULES: &[Matcher] = &[
    Matcher::Label("已认领"),
    Matcher::Label("已归还"),
    Matcher::Label("已解决"),
    Matcher::Code(&["CLAIMED", "SOLVED", "ARCHIVED"]),
    Matcher::Code(&["CANCELLED", "CANCELED", "REJECTED"]),
];

// ============================================================================
// Resolvers
// ============================================================================

/// Resolve the post type from a raw `publish_type`.
///
/// `2`, `FOUND` (any case) and the found label mean Found; anything else is Lost.
pub fn post_type(publish_type: &str) -> PostType {
    let normalized = publish_type.trim();
    if normalized == "2"
        || normalized.eq_ignore_ascii_case("FOUND")
        || normalized == PostType::Found.label()
    {
        PostType::Found
    } else {
        PostType::Lost
    }
}

/// Resolve the availability of a listed item from its raw status.
pub fn item_status(status: &str, publish_type: &str) -> ItemStatus {
    // The raw status is both the label and the code here.
    let subject = Subject::new(status, status);
    if TERMINAL_ITEM_RULES
        .iter()
        .any(|matcher| subject.matches(*matcher))
    {
        return ItemStatus::Returned;
    }
    open_status(post_type(publish_type))
}

/// Resolve the review status from a raw code and an optional label.
pub fn review_status(status: &str, status_text: Option<&str>) -> ReviewStatus {
    let subject = Subject::new(status, status_text.unwrap_or_default());
    REVIEW_RULES
        .iter()
        .find(|(matcher, _)| subject.matches(*matcher))
        .map(|(_, outcome)| *outcome)
        .unwrap_or_default()
}

/// Item status of one of the caller's own posts, derived from its review status.
pub fn my_post_item_status(post_type: PostType, review_status: ReviewStatus) -> ItemStatus {
    if review_status == ReviewStatus::Claimed {
        ItemStatus::Returned
    } else {
        open_status(post_type)
    }
}

fn open_status(post_type: PostType) -> ItemStatus {
    match post_type {
        PostType::Found => ItemStatus::AwaitingClaim,
        PostType::Lost => ItemStatus::Searching,
    }
}
