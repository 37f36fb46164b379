//! Query controller
//!
//! Owns the `Query` and turns user intent into sequenced fetch requests.
//!
//! # Staleness
//!
//! Every request carries a `seq` taken from a counter that only goes up.
//! A response is applied only if its `seq` is the latest issued; anything
//! older was superseded and is dropped silently. After `teardown` no
//! response is ever applied again.
//!
//! ```text
//! set_raw_text ──(debounce)──> poll ──┐
//! set_group_filter / set_page ────────┼──> FetchRequest { seq } ──> store
//! set_page_size / clear_search ───────┘                               │
//!                       complete(seq, result) <───────────────────────┘
//! ```

use super::debounce::Debouncer;
use super::{Mode, Query, QueryError};
use crate::pagination::{FetchParams, PageResult};
use crate::record::GroupKey;
use crate::store::StoreError;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A fetch the host must run against the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub params: FetchParams,
}

/// What happened to a completed fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Latest request succeeded; the page should replace the current one
    Applied(PageResult),
    /// Superseded (or torn down); nothing to do
    Stale,
    /// Latest request failed; keep the current page and notify
    Failed(StoreError),
}

/// Browse/search state machine with debounced text input
#[derive(Debug, Clone)]
pub struct QueryController {
    query: Query,
    debounce: Debouncer,
    latest_seq: u64,
    in_flight: bool,
    torn_down: bool,
}

impl QueryController {
    #[must_use]
    pub fn new(page_size: usize, debounce: Duration) -> Self {
        Self {
            query: Query::new(page_size),
            debounce: Debouncer::new(debounce),
            latest_seq: 0,
            in_flight: false,
            torn_down: false,
        }
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Sequence number of the newest request issued
    #[must_use]
    pub const fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Whether the newest request is still outstanding
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Whether typed text is waiting for the debounce timer
    #[must_use]
    pub const fn has_pending_input(&self) -> bool {
        self.debounce.is_armed()
    }

    /// Deadline of the debounce timer, for hosts that sleep until it
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    fn issue(&mut self) -> FetchRequest {
        self.latest_seq += 1;
        self.in_flight = true;
        let params = FetchParams::from(&self.query);
        debug!(seq = self.latest_seq, ?params, "fetch issued");
        FetchRequest {
            seq: self.latest_seq,
            params,
        }
    }

    fn set_debounced(&mut self, text: String) {
        self.query.mode = Mode::for_text(&text);
        self.query.debounced_text = text;
        self.query.page = 1;
    }

    /// Record a keystroke and restart the debounce timer
    pub fn set_raw_text(&mut self, text: impl Into<String>, now: Instant) {
        self.query.raw_text = text.into();
        self.debounce.restart(now);
    }

    /// Fire the debounce timer if due
    ///
    /// On firing, the typed text becomes the query, the mode follows it and
    /// the page resets to 1.
    pub fn poll(&mut self, now: Instant) -> Option<FetchRequest> {
        if !self.debounce.poll(now) {
            return None;
        }
        self.set_debounced(self.query.raw_text.clone());
        Some(self.issue())
    }

    /// Use `text` as the query right away, skipping the debounce window
    pub fn submit_text(&mut self, text: impl Into<String>) -> FetchRequest {
        let text = text.into();
        self.debounce.cancel();
        self.query.raw_text.clone_from(&text);
        self.set_debounced(text);
        self.issue()
    }

    /// Change the group filter; resets to page 1
    pub fn set_group_filter(&mut self, group: Option<GroupKey>) -> FetchRequest {
        self.query.group_filter = group;
        self.query.page = 1;
        self.issue()
    }

    /// Go to a page; pages below 1 become 1
    ///
    /// Upper-bound clamping needs the latest result and is the caller's job
    /// (see `PaginationCoordinator::clamp`).
    pub fn set_page(&mut self, page: usize) -> FetchRequest {
        self.query.page = page.max(1);
        self.issue()
    }

    /// Change the page size; resets to page 1
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidPageSize` for a page size of 0; the query
    /// is left unchanged and nothing is issued.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<FetchRequest, QueryError> {
        if page_size == 0 {
            return Err(QueryError::InvalidPageSize);
        }
        self.query.page_size = page_size;
        self.query.page = 1;
        Ok(self.issue())
    }

    /// Drop the search text and return to browsing
    pub fn clear_search(&mut self) -> FetchRequest {
        self.debounce.cancel();
        self.query.raw_text.clear();
        self.set_debounced(String::new());
        self.issue()
    }

    /// Re-run the current query
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue()
    }

    /// Whether a response to `seq` would be applied
    #[must_use]
    pub const fn is_current(&self, seq: u64) -> bool {
        !self.torn_down && seq == self.latest_seq
    }

    /// Accept the record store's answer to request `seq`
    pub fn complete(&mut self, seq: u64, result: Result<PageResult, StoreError>) -> FetchOutcome {
        if !self.is_current(seq) {
            debug!(seq, latest = self.latest_seq, "stale response discarded");
            return FetchOutcome::Stale;
        }
        self.in_flight = false;

        match result {
            Ok(page) => {
                // keep the query's page in step with any clamping the store did
                self.query.page = page.page;
                FetchOutcome::Applied(page)
            }
            Err(error) => {
                warn!(seq, %error, "fetch failed");
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Permanently stop applying responses
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.in_flight = false;
        self.debounce.cancel();
    }

    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
