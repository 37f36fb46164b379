//! Optimistic drag-and-drop reordering
//!
//! # Workflow
//!
//! ```text
//! Stable ──begin_drag──> Dragging ──drop_at──> OptimisticallyApplied
//!    ^                      │                          │
//!    │                 cancel_drag /                 submit
//!    │                 same position                   │
//!    │                      v                          v
//!    └──────────────────  Stable          Pending ──resolve──> Committed
//!                                                      └──────> RolledBack
//! ```
//!
//! Every batch renumbers the whole group, and only one batch per group may
//! be pending; drags on that group are refused until it resolves.

use super::error::ReorderError;
use super::state::{ReorderBatch, ReorderOutcome, ReorderState, SubmittedBatch};
use crate::record::{GroupKey, Record, RecordId};
use crate::store::StoreError;
use std::collections::HashMap;
use std::mem;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct GroupOrdering {
    records: Vec<Record>,
    state: ReorderState,
}

/// Per-group ordering with optimistic moves and rollback
#[derive(Debug, Clone)]
pub struct ReorderEngine {
    groups: HashMap<GroupKey, GroupOrdering>,
    next_ticket: u64,
    refetch_on_rollback: bool,
    torn_down: bool,
}

impl ReorderEngine {
    /// Create an engine; `refetch_on_rollback` requests a group refetch after
    /// every failed batch, not only after conflicts
    #[must_use]
    pub fn new(refetch_on_rollback: bool) -> Self {
        Self {
            groups: HashMap::new(),
            next_ticket: 0,
            refetch_on_rollback,
            torn_down: false,
        }
    }

    /// Replace a group's ordering with the record store's
    ///
    /// Records outside `group` are ignored. Records are ordered by
    /// `order_index`; records without one keep their relative order at the end.
    ///
    /// # Errors
    ///
    /// Returns `ReorderError::DragDisabled` while a move on the group is
    /// applied or pending, `TornDown` after `teardown`.
    pub fn load_group(&mut self, group: GroupKey, records: Vec<Record>) -> Result<(), ReorderError> {
        if self.torn_down {
            return Err(ReorderError::TornDown);
        }
        if let Some(existing) = self.groups.get(&group) {
            if matches!(
                existing.state,
                ReorderState::OptimisticallyApplied { .. } | ReorderState::Pending { .. }
            ) {
                return Err(ReorderError::DragDisabled(group));
            }
        }

        let mut members: Vec<Record> = records.into_iter().filter(|r| r.belongs_to(&group)).collect();
        members.sort_by_key(|r| r.order_index.unwrap_or(u32::MAX));
        debug!(%group, len = members.len(), "group ordering loaded");

        self.groups.insert(
            group,
            GroupOrdering {
                records: members,
                state: ReorderState::Stable,
            },
        );
        Ok(())
    }

    /// Current ordering of a group, optimistic moves included
    #[must_use]
    pub fn ordering(&self, group: &GroupKey) -> Option<&[Record]> {
        self.groups.get(group).map(|g| g.records.as_slice())
    }

    #[must_use]
    pub fn state(&self, group: &GroupKey) -> Option<&ReorderState> {
        self.groups.get(group).map(|g| &g.state)
    }

    /// Whether a drag may start on `group` right now
    #[must_use]
    pub fn can_drag(&self, group: &GroupKey) -> bool {
        !self.torn_down
            && self.groups.get(group).is_some_and(|g| {
                g.state.is_idle() || matches!(g.state, ReorderState::Dragging { .. })
            })
    }

    fn group_mut(&mut self, group: &GroupKey) -> Result<&mut GroupOrdering, ReorderError> {
        if self.torn_down {
            return Err(ReorderError::TornDown);
        }
        self.groups
            .get_mut(group)
            .ok_or_else(|| ReorderError::UnknownGroup(group.clone()))
    }

    /// Pick up a record
    ///
    /// # Errors
    ///
    /// Returns `DragDisabled` while a batch for the group is pending, or
    /// `UnknownGroup`/`UnknownRecord`/`TornDown`.
    pub fn begin_drag(&mut self, group: &GroupKey, id: &RecordId) -> Result<(), ReorderError> {
        let ordering = self.group_mut(group)?;
        if !ordering.state.is_idle() && !matches!(ordering.state, ReorderState::Dragging { .. }) {
            return Err(ReorderError::DragDisabled(group.clone()));
        }

        let from = ordering
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| ReorderError::UnknownRecord {
                group: group.clone(),
                record: id.clone(),
            })?;
        ordering.state = ReorderState::Dragging {
            id: id.clone(),
            from,
        };
        Ok(())
    }

    /// Abandon a drag without changing anything
    pub fn cancel_drag(&mut self, group: &GroupKey) {
        if let Some(ordering) = self.groups.get_mut(group) {
            if matches!(ordering.state, ReorderState::Dragging { .. }) {
                ordering.state = ReorderState::Stable;
            }
        }
    }

    /// Drop the dragged record at `to` and apply the move locally
    ///
    /// Returns `false` when the record is dropped where it started; the
    /// group goes back to `Stable` and nothing needs saving.
    ///
    /// # Errors
    ///
    /// Returns `NoDragInProgress` or `IndexOutOfRange`; the drag stays active
    /// after an out-of-range drop.
    pub fn drop_at(&mut self, group: &GroupKey, to: usize) -> Result<bool, ReorderError> {
        let ordering = self.group_mut(group)?;
        let ReorderState::Dragging { from, .. } = ordering.state else {
            return Err(ReorderError::NoDragInProgress(group.clone()));
        };

        let len = ordering.records.len();
        if to >= len {
            return Err(ReorderError::IndexOutOfRange { index: to, len });
        }
        if to == from {
            ordering.state = ReorderState::Stable;
            return Ok(false);
        }

        let shadow = ordering.records.clone();
        let moved = ordering.records.remove(from);
        ordering.records.insert(to, moved);
        for (record, index) in ordering.records.iter_mut().zip(0u32..) {
            record.order_index = Some(index);
        }
        ordering.state = ReorderState::OptimisticallyApplied { shadow };
        Ok(true)
    }

    /// Turn the applied move into a batch for the record store
    ///
    /// # Errors
    ///
    /// Returns `NothingToSubmit` unless a move has just been applied.
    pub fn submit(&mut self, group: &GroupKey) -> Result<SubmittedBatch, ReorderError> {
        let ticket = self.next_ticket + 1;
        let ordering = self.group_mut(group)?;

        let shadow = match mem::take(&mut ordering.state) {
            ReorderState::OptimisticallyApplied { shadow } => shadow,
            other => {
                ordering.state = other;
                return Err(ReorderError::NothingToSubmit(group.clone()));
            }
        };

        let batch = ReorderBatch::from_ordering(group.clone(), &ordering.records);
        ordering.state = ReorderState::Pending { shadow, ticket };
        self.next_ticket = ticket;
        debug!(%group, ticket, moves = batch.moves.len(), "reorder batch submitted");
        Ok(SubmittedBatch { ticket, batch })
    }

    /// Pick up `id`, drop it at `to` and submit, in one step
    ///
    /// Returns `None` when the record is already at `to`.
    ///
    /// # Errors
    ///
    /// Any error from `begin_drag`, `drop_at` or `submit`; a failed drop
    /// cancels the drag.
    pub fn move_record(
        &mut self,
        group: &GroupKey,
        id: &RecordId,
        to: usize,
    ) -> Result<Option<SubmittedBatch>, ReorderError> {
        self.begin_drag(group, id)?;
        match self.drop_at(group, to) {
            Ok(true) => self.submit(group).map(Some),
            Ok(false) => Ok(None),
            Err(e) => {
                self.cancel_drag(group);
                Err(e)
            }
        }
    }

    /// Settle a pending batch with the record store's answer
    pub fn resolve(
        &mut self,
        group: &GroupKey,
        ticket: u64,
        result: Result<(), StoreError>,
    ) -> ReorderOutcome {
        if self.torn_down {
            return ReorderOutcome::Ignored;
        }
        let refetch_on_rollback = self.refetch_on_rollback;
        let Some(ordering) = self.groups.get_mut(group) else {
            return ReorderOutcome::Ignored;
        };

        let shadow = match mem::take(&mut ordering.state) {
            ReorderState::Pending { shadow, ticket: t } if t == ticket => shadow,
            other => {
                ordering.state = other;
                debug!(%group, ticket, "resolution for unknown batch ignored");
                return ReorderOutcome::Ignored;
            }
        };

        match result {
            Ok(()) => {
                ordering.state = ReorderState::Committed;
                info!(%group, ticket, "reorder committed");
                ReorderOutcome::Committed
            }
            Err(error) => {
                ordering.records = shadow;
                ordering.state = ReorderState::RolledBack;
                let refetch = error.is_conflict() || refetch_on_rollback;
                warn!(%group, ticket, %error, refetch, "reorder rolled back");
                ReorderOutcome::RolledBack { error, refetch }
            }
        }
    }

    /// Stop accepting gestures and resolutions for good
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Default for ReorderEngine {
    fn default() -> Self {
        Self::new(true)
    }
}
