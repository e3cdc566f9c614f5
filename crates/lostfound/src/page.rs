//! Paginated listings.

use serde::Serialize;
use serde_json::Value;

use lostfound_protocol::value::{array_or_empty, count};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    /// Map a `{list, page, page_size, total}` payload. Entries the mapper
    /// rejects are skipped.
    pub fn from_response<F>(data: &Value, mut map: F) -> Self
    where
        F: FnMut(&Value) -> Option<T>,
    {
        Self {
            list: array_or_empty(data.get("list"))
                .iter()
                .filter_map(&mut map)
                .collect(),
            page: count(data.get("page")),
            page_size: count(data.get("page_size")),
            total: count(data.get("total")),
        }
    }
}

/// Requested page number, at least 1.
pub fn page_number(page: Option<i64>) -> u32 {
    match page {
        Some(page) if page >= 1 => u32::try_from(page).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Requested page size within `1..=50`, 10 when absent or below 1.
pub fn page_size(page_size: Option<i64>) -> u32 {
    match page_size {
        Some(size) if size >= 1 => u32::try_from(size)
            .unwrap_or(MAX_PAGE_SIZE)
            .min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// Trim and cut to at most `max` characters.
pub(crate) fn truncate(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}

/// Like [`truncate`], `None` when nothing is left.
pub(crate) fn truncate_opt(value: Option<&str>, max: usize) -> Option<String> {
    value
        .map(|value| truncate(value, max))
        .filter(|value| !value.is_empty())
}

/// Trimmed, non-empty entries, at most `max` of them.
pub(crate) fn clean_list(values: &[String], max: usize) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}
