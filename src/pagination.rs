//! Pagination coordinator
//!
//! Translates query state into fetch parameters and derives display
//! metadata (item range, page window, next/previous) from the latest
//! `PageResult`. The coordinator is the only owner of the current page;
//! everything else reads it through `current()`.

use crate::query::{Mode, Query};
use crate::record::{GroupKey, Record};
use serde::{Deserialize, Serialize};

/// Default number of page buttons shown around the current page
pub const DEFAULT_PAGE_WINDOW: usize = 5;

/// Number of pages needed to show `total_records`, never less than one
#[must_use]
pub const fn total_pages(total_records: usize, page_size: usize) -> usize {
    let page_size = if page_size == 0 { 1 } else { page_size };
    let pages = total_records.div_ceil(page_size);
    if pages == 0 { 1 } else { pages }
}

/// Clamp a 1-based page number into `[1, max(total_pages, 1)]`
#[must_use]
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// One page of records as returned by the record store
///
/// Replaced wholesale on every successful fetch, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub records: Vec<Record>,
    pub page: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub total_pages: usize,
}

impl PageResult {
    /// Build a page, deriving `total_pages` and clamping `page` into range
    #[must_use]
    pub fn new(records: Vec<Record>, page: usize, page_size: usize, total_records: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_records, page_size);
        Self {
            records,
            page: clamp_page(page, total_pages),
            page_size,
            total_records,
            total_pages,
        }
    }

    /// An empty first page
    #[must_use]
    pub fn empty(page_size: usize) -> Self {
        Self::new(Vec::new(), 1, page_size, 0)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Parameters for a single record store fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchParams {
    /// `list(group, page, page_size)`
    Browse {
        group: Option<GroupKey>,
        page: usize,
        page_size: usize,
    },
    /// `search(text, page, page_size)`
    Search {
        text: String,
        page: usize,
        page_size: usize,
    },
}

impl FetchParams {
    #[must_use]
    pub const fn page(&self) -> usize {
        match self {
            Self::Browse { page, .. } | Self::Search { page, .. } => *page,
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        match self {
            Self::Browse { page_size, .. } | Self::Search { page_size, .. } => *page_size,
        }
    }
}

impl From<&Query> for FetchParams {
    fn from(query: &Query) -> Self {
        match query.mode {
            Mode::Browse => Self::Browse {
                group: query.group_filter.clone(),
                page: query.page,
                page_size: query.page_size,
            },
            Mode::Search => Self::Search {
                text: query.debounced_text.trim().to_string(),
                page: query.page,
                page_size: query.page_size,
            },
        }
    }
}

/// Display metadata derived from a `PageResult`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// 1-based inclusive item range shown, `(0, 0)` when there are no records
    pub display_range: (usize, usize),
    pub has_next: bool,
    pub has_previous: bool,
    /// Sliding window of page numbers around the current page
    pub page_numbers: Vec<usize>,
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

impl PageView {
    /// Whether the view should render the "no records" state
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Derive display metadata with the default five-page window
#[must_use]
pub fn derive(result: &PageResult) -> PageView {
    derive_with_window(result, DEFAULT_PAGE_WINDOW)
}

/// Derive display metadata with a custom page window
#[must_use]
pub fn derive_with_window(result: &PageResult, window: usize) -> PageView {
    let page_size = result.page_size.max(1);
    let total_pages = total_pages(result.total_records, page_size);
    let page = clamp_page(result.page, total_pages);

    let display_range = if result.total_records == 0 {
        (0, 0)
    } else {
        let from = (page - 1) * page_size + 1;
        let to = (page * page_size).min(result.total_records);
        (from.min(to), to)
    };

    PageView {
        display_range,
        has_next: page < total_pages,
        has_previous: page > 1,
        page_numbers: page_window(page, total_pages, window),
        page,
        total_pages,
        total_records: result.total_records,
    }
}

/// Up to `window` consecutive pages centred on `page`, clamped to `[1, total_pages]`
#[must_use]
pub fn page_window(page: usize, total_pages: usize, window: usize) -> Vec<usize> {
    let total_pages = total_pages.max(1);
    let window = window.clamp(1, total_pages);
    let page = clamp_page(page, total_pages);

    let start = page
        .saturating_sub(window / 2)
        .clamp(1, total_pages - window + 1);
    (start..start + window).collect()
}

/// Owner of the latest `PageResult`
#[derive(Debug, Clone)]
pub struct PaginationCoordinator {
    window: usize,
    current: Option<PageResult>,
}

impl PaginationCoordinator {
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            current: None,
        }
    }

    /// Fetch parameters for the given query state
    #[must_use]
    pub fn fetch_params(&self, query: &Query) -> FetchParams {
        FetchParams::from(query)
    }

    /// Replace the current page
    pub fn apply(&mut self, result: PageResult) {
        self.current = Some(result);
    }

    /// Latest page, if any fetch has succeeded
    #[must_use]
    pub const fn current(&self) -> Option<&PageResult> {
        self.current.as_ref()
    }

    /// Records on the latest page
    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.current.as_ref().map_or(&[], |page| page.records.as_slice())
    }

    /// Display metadata for the latest page
    #[must_use]
    pub fn view(&self) -> Option<PageView> {
        self.current
            .as_ref()
            .map(|page| derive_with_window(page, self.window))
    }

    /// Clamp a requested page against what the latest result says exists
    ///
    /// With no result yet, only the lower bound applies.
    #[must_use]
    pub fn clamp(&self, page: usize) -> usize {
        match &self.current {
            Some(current) => clamp_page(page, current.total_pages),
            None => page.max(1),
        }
    }
}

impl Default for PaginationCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_WINDOW)
    }
}
