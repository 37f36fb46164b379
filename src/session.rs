//! Record browser session
//!
//! Wires the query controller, pagination coordinator, suggestion panel and
//! reorder engine to one record store and one notifier. Every operation
//! catches its own failures: the outcome is always an updated view, an
//! unchanged view with an error notification, or an explicit empty state.
//!
//! # Control flow
//!
//! ```text
//! type_text ─> QueryController (debounce) ─tick─> RecordStore::fetch
//!                                                      │
//!            SuggestionPanel <── PaginationCoordinator <┘
//!
//! begin_drag / drop_at ─> ReorderEngine (optimistic) ─> RecordStore::reorder
//!                                     ^                        │
//!                                     └── commit / rollback <──┘
//! ```
//!
//! The store is called synchronously; hosts that run fetches elsewhere can
//! use `controller_mut()` to issue requests and `complete()` to hand back
//! the answers in any order.

use crate::config::BrowserConfig;
use crate::notify::Notifier;
use crate::pagination::{PageResult, PageView, PaginationCoordinator};
use crate::query::{FetchOutcome, FetchRequest, Query, QueryController, QueryError};
use crate::record::{GroupKey, Record, RecordId, RecordKind};
use crate::reorder::{ReorderEngine, ReorderError, ReorderOutcome, ReorderState};
use crate::store::{RecordStore, StoreError};
use crate::suggest::{PanelAction, PanelKey, SuggestionItem, SuggestionPanel};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// What the record list should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing loaded yet
    Loading,
    /// Records to show
    Loaded,
    /// The query matched nothing; not an error
    Empty,
    /// Nothing loaded and the last fetch failed
    Failed,
}

/// Interactive browser over one record collection
pub struct BrowseSession<S, N> {
    kind: RecordKind,
    store: S,
    notifier: N,
    config: BrowserConfig,
    controller: QueryController,
    pagination: PaginationCoordinator,
    panel: SuggestionPanel,
    reorder: ReorderEngine,
    last_fetch_failed: bool,
}

impl<S: RecordStore, N: Notifier> BrowseSession<S, N> {
    #[must_use]
    pub fn new(store: S, notifier: N, config: BrowserConfig) -> Self {
        let kind = store.kind();
        Self {
            kind,
            controller: QueryController::new(config.page_size, config.debounce()),
            pagination: PaginationCoordinator::new(config.page_window),
            panel: SuggestionPanel::new(kind.searchable_fields(), config.max_suggestions),
            reorder: ReorderEngine::new(config.refetch_on_rollback),
            store,
            notifier,
            config,
            last_fetch_failed: false,
        }
    }

    fn collection(&self) -> &'static str {
        self.kind.descriptor().collection
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.kind
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        self.controller.query()
    }

    /// For hosts that run fetches themselves; pair with `complete`
    pub const fn controller_mut(&mut self) -> &mut QueryController {
        &mut self.controller
    }

    #[must_use]
    pub const fn page(&self) -> Option<&PageResult> {
        self.pagination.current()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.pagination.records()
    }

    #[must_use]
    pub fn page_view(&self) -> Option<PageView> {
        self.pagination.view()
    }

    #[must_use]
    pub fn suggestions(&self) -> &[SuggestionItem] {
        self.panel.items()
    }

    #[must_use]
    pub const fn panel(&self) -> &SuggestionPanel {
        &self.panel
    }

    #[must_use]
    pub fn ordering(&self, group: &GroupKey) -> Option<&[Record]> {
        self.reorder.ordering(group)
    }

    #[must_use]
    pub fn reorder_state(&self, group: &GroupKey) -> Option<&ReorderState> {
        self.reorder.state(group)
    }

    #[must_use]
    pub fn can_drag(&self, group: &GroupKey) -> bool {
        self.kind.descriptor().reorderable && self.reorder.can_drag(group)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        match self.pagination.current() {
            Some(page) if page.is_empty() => ViewState::Empty,
            Some(_) => ViewState::Loaded,
            None if self.last_fetch_failed => ViewState::Failed,
            None => ViewState::Loading,
        }
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    /// Load the first page
    pub fn open(&mut self) -> bool {
        let request = self.controller.refresh();
        self.execute(request)
    }

    /// Run a request against the store and apply the answer
    ///
    /// Returns whether the view changed.
    pub fn execute(&mut self, request: FetchRequest) -> bool {
        if self.controller.is_torn_down() {
            return false;
        }
        let result = self.store.fetch(&request.params);
        self.complete(request.seq, result)
    }

    /// Apply the store's answer to request `seq`
    ///
    /// Returns whether the view changed; stale answers are dropped silently.
    pub fn complete(&mut self, seq: u64, result: Result<PageResult, StoreError>) -> bool {
        match self.controller.complete(seq, result) {
            FetchOutcome::Applied(page) => {
                self.last_fetch_failed = false;
                self.pagination.apply(page);
                self.panel.refresh(self.pagination.records());
                true
            }
            FetchOutcome::Stale => false,
            FetchOutcome::Failed(error) => {
                self.last_fetch_failed = true;
                self.notifier
                    .error(&format!("Could not load {}: {error}", self.collection()));
                false
            }
        }
    }

    /// Record a keystroke; suggestions follow immediately, the fetch after
    /// the debounce delay
    pub fn type_text(&mut self, text: &str, now: Instant) {
        if self.controller.is_torn_down() {
            return;
        }
        self.controller.set_raw_text(text, now);
        self.panel.update(self.pagination.records(), text);
    }

    /// Drive the debounce timer; returns whether a fetch changed the view
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.controller.poll(now) {
            Some(request) => self.execute(request),
            None => false,
        }
    }

    pub fn set_group_filter(&mut self, group: Option<GroupKey>) -> bool {
        let request = self.controller.set_group_filter(group);
        self.execute(request)
    }

    /// Go to `page`, clamped to the pages the latest result says exist
    pub fn set_page(&mut self, page: usize) -> bool {
        let page = self.pagination.clamp(page);
        let request = self.controller.set_page(page);
        self.execute(request)
    }

    pub fn next_page(&mut self) -> bool {
        match self.page_view() {
            Some(view) if view.has_next => self.set_page(view.page + 1),
            _ => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.page_view() {
            Some(view) if view.has_previous => self.set_page(view.page - 1),
            _ => false,
        }
    }

    /// Change the page size; the next fetch is for page 1
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidPageSize` for 0.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<bool, QueryError> {
        let request = self.controller.set_page_size(page_size)?;
        Ok(self.execute(request))
    }

    /// Drop the search and go back to browsing
    pub fn clear_search(&mut self) -> bool {
        self.panel.update(&[], "");
        let request = self.controller.clear_search();
        self.execute(request)
    }

    /// Re-run the current query
    pub fn refresh(&mut self) -> bool {
        let request = self.controller.refresh();
        self.execute(request)
    }

    // ------------------------------------------------------------------
    // Suggestion panel
    // ------------------------------------------------------------------

    /// Feed a key to the suggestion panel; Enter runs the resulting query
    pub fn key(&mut self, key: PanelKey) -> PanelAction {
        let action = self.panel.handle_key(key);
        if let PanelAction::Commit(text) | PanelAction::Submit(text) = &action {
            let request = self.controller.submit_text(text.clone());
            self.execute(request);
        }
        action
    }

    pub fn click_outside(&mut self) -> PanelAction {
        self.panel.click_outside()
    }

    // ------------------------------------------------------------------
    // Reordering
    // ------------------------------------------------------------------

    /// Fetch a whole group from the store into the reorder engine
    ///
    /// Pages through the group `group_fetch_limit` records at a time; the
    /// engine only sees the group once every page has arrived.
    pub fn load_group(&mut self, group: &GroupKey) -> bool {
        if self.reorder.is_torn_down() {
            return false;
        }
        let records = match self.fetch_group(group) {
            Ok(records) => records,
            Err(error) => {
                self.notifier
                    .error(&format!("Could not load {group}: {error}"));
                return false;
            }
        };

        match self.reorder.load_group(group.clone(), records) {
            Ok(()) => true,
            Err(error) => {
                self.notifier.warning(&error.to_string());
                false
            }
        }
    }

    fn fetch_group(&self, group: &GroupKey) -> Result<Vec<Record>, StoreError> {
        let limit = self.config.group_fetch_limit;
        let first = self.store.list(Some(group), 1, limit)?;
        let total_pages = first.total_pages;
        let mut records = first.records;
        for page in 2..=total_pages {
            records.extend(self.store.list(Some(group), page, limit)?.records);
        }
        debug!(%group, pages = total_pages, len = records.len(), "group fetched");
        Ok(records)
    }

    /// Pick up a record in `group`
    ///
    /// # Errors
    ///
    /// Returns `ReorderError::NotReorderable` for collections without
    /// positions, `DragDisabled` while the group is saving, or any other
    /// refusal from the engine.
    pub fn begin_drag(&mut self, group: &GroupKey, id: &RecordId) -> Result<(), ReorderError> {
        if !self.kind.descriptor().reorderable {
            return Err(ReorderError::NotReorderable(self.collection()));
        }
        self.reorder.begin_drag(group, id)
    }

    pub fn cancel_drag(&mut self, group: &GroupKey) {
        self.reorder.cancel_drag(group);
    }

    /// Drop the dragged record at `to`, persist, and commit or roll back
    ///
    /// Returns `Ok(None)` when the record was dropped where it started.
    ///
    /// # Errors
    ///
    /// Returns `ReorderError` if no drag is active or `to` is out of range.
    /// Store failures are not errors here: they come back as
    /// `ReorderOutcome::RolledBack`.
    pub fn drop_at(
        &mut self,
        group: &GroupKey,
        to: usize,
    ) -> Result<Option<ReorderOutcome>, ReorderError> {
        if !self.reorder.drop_at(group, to)? {
            return Ok(None);
        }
        let submitted = self.reorder.submit(group)?;
        let result = self.store.reorder(&submitted.batch);
        Ok(Some(self.resolve_reorder(group, submitted.ticket, result)))
    }

    /// `begin_drag` followed by `drop_at`
    ///
    /// # Errors
    ///
    /// See `begin_drag` and `drop_at`; a failed drop cancels the drag.
    pub fn move_record(
        &mut self,
        group: &GroupKey,
        id: &RecordId,
        to: usize,
    ) -> Result<Option<ReorderOutcome>, ReorderError> {
        self.begin_drag(group, id)?;
        let result = self.drop_at(group, to);
        if result.is_err() {
            self.reorder.cancel_drag(group);
        }
        result
    }

    /// Settle a submitted batch and follow up on the outcome
    fn resolve_reorder(
        &mut self,
        group: &GroupKey,
        ticket: u64,
        result: Result<(), StoreError>,
    ) -> ReorderOutcome {
        let outcome = self.reorder.resolve(group, ticket, result);
        match &outcome {
            ReorderOutcome::Committed => {
                self.notifier.success(&format!("Order of {group} saved"));
                self.refresh();
            }
            ReorderOutcome::RolledBack { error, refetch } => {
                self.notifier
                    .error(&format!("Could not save order of {group}: {error}"));
                if *refetch {
                    self.load_group(group);
                }
            }
            ReorderOutcome::Ignored => {}
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    fn reload_group_if_loaded(&mut self, group: Option<&GroupKey>) {
        if let Some(group) = group {
            if self.reorder.state(group).is_some_and(ReorderState::is_idle) {
                self.load_group(group);
            }
        }
    }

    fn group_of(&self, id: &RecordId) -> Option<GroupKey> {
        self.records()
            .iter()
            .find(|r| &r.id == id)
            .and_then(|r| r.group_key.clone())
    }

    /// Create a record; the current page is refreshed on success
    pub fn create(&mut self, payload: &Value) -> Option<Record> {
        match self.store.create(payload) {
            Ok(record) => {
                debug!(id = %record.id, "record created");
                self.notifier
                    .success(&format!("Added to {}", self.collection()));
                self.refresh();
                self.reload_group_if_loaded(record.group_key.as_ref());
                Some(record)
            }
            Err(error) => {
                self.notifier.error(&format!("Could not create record: {error}"));
                None
            }
        }
    }

    /// Update a record; the current page is refreshed on success
    pub fn update(&mut self, id: &RecordId, payload: &Value) -> Option<Record> {
        let previous_group = self.group_of(id);
        match self.store.update(id, payload) {
            Ok(record) => {
                debug!(%id, "record updated");
                self.notifier.success(&format!("Updated {id}"));
                self.refresh();
                self.reload_group_if_loaded(previous_group.as_ref());
                if record.group_key != previous_group {
                    self.reload_group_if_loaded(record.group_key.as_ref());
                }
                Some(record)
            }
            Err(error) => {
                self.notifier.error(&format!("Could not update {id}: {error}"));
                None
            }
        }
    }

    /// Delete a record; the current page is refreshed on success
    pub fn delete(&mut self, id: &RecordId) -> bool {
        let group = self.group_of(id);
        match self.store.delete(id) {
            Ok(()) => {
                debug!(%id, "record deleted");
                self.notifier.success(&format!("Deleted {id}"));
                self.refresh();
                self.reload_group_if_loaded(group.as_ref());
                true
            }
            Err(error) => {
                self.notifier.error(&format!("Could not delete {id}: {error}"));
                false
            }
        }
    }

    /// Stop accepting responses and gestures for good
    pub fn teardown(&mut self) {
        self.controller.teardown();
        self.reorder.teardown();
        self.panel.close();
    }
}
