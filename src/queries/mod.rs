// src/queries/mod.rs
//! Read-only views over the repository for listings and dashboards.
pub mod auctions;
pub mod comments;
pub mod contact;
pub mod dashboard;
pub mod offers;

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Page numbers start at 1; the limit is clamped to `max_limit`.
    pub fn new(page: Option<usize>, limit: Option<usize>, default_limit: usize, max_limit: usize) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit.max(1)),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest { page: 1, limit: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total: self.total,
        }
    }

    /// `{currentPage, totalPages, total<Entity>s}`
    pub fn pagination(&self, total_key: &str) -> Value {
        let mut value = json!({
            "currentPage": self.current_page,
            "totalPages": self.total_pages,
        });
        value[total_key] = json!(self.total);
        value
    }
}

pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let limit = request.limit.max(1);
    let total_pages = total.div_ceil(limit);
    let items = items
        .into_iter()
        .skip(request.page.saturating_sub(1).saturating_mul(limit))
        .take(limit)
        .collect();
    Page {
        items,
        current_page: request.page,
        total_pages,
        total,
    }
}

/// Parses an optional filter value; empty, "all" and unparseable values
/// mean "no filter".
pub fn filter_value<T: FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .and_then(|v| T::from_str(&v.to_lowercase()).ok())
}

pub fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

pub fn search_term(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Counts per key, with every key in `keys` present even when zero.
pub fn histogram<K, I>(keys: &[K], values: I) -> BTreeMap<String, usize>
where
    K: Serialize + PartialEq,
    I: IntoIterator<Item = K>,
{
    let name = |key: &K| {
        serde_json::to_value(key)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    };
    let mut counts: BTreeMap<String, usize> = keys.iter().map(|k| (name(k), 0)).collect();
    for value in values {
        *counts.entry(name(&value)).or_insert(0) += 1;
    }
    counts
}

/// Percentage with one decimal, 0 when there is nothing to divide.
pub fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 * 1000.0 / whole as f64).round() / 10.0
    }
}
