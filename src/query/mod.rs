//! Query state and controller
//!
//! - `Query`: what the browser is currently showing (mode, text, group, page)
//! - `Debouncer`: restartable timer that coalesces keystrokes
//! - `QueryController`: owns the `Query`, issues sequenced fetch requests and
//!   discards responses that have been superseded

pub mod controller;
pub mod debounce;

pub use controller::{FetchOutcome, FetchRequest, QueryController};
pub use debounce::Debouncer;

use crate::record::GroupKey;
use thiserror::Error;

/// Where results come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `list()` filtered by group
    #[default]
    Browse,
    /// `search()` with a non-empty query
    Search,
}

impl Mode {
    /// Mode implied by a debounced query text
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        if text.trim().is_empty() {
            Self::Browse
        } else {
            Self::Search
        }
    }
}

/// Current browse/search state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub mode: Mode,
    /// Text as typed, echoed immediately
    pub raw_text: String,
    /// Text the current results were requested with
    pub debounced_text: String,
    pub group_filter: Option<GroupKey>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl Query {
    /// Browse mode, first page, no filter
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            mode: Mode::Browse,
            raw_text: String::new(),
            debounced_text: String::new(),
            group_filter: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }
}

/// Invalid query controller arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Page size must be at least 1")]
    InvalidPageSize,
}
