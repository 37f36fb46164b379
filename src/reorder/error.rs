//! Reorder error types
//!
//! These describe gestures the engine refuses. They never involve the record
//! store: store failures surface as `ReorderOutcome::RolledBack`.

use crate::record::{GroupKey, RecordId};
use thiserror::Error;

/// Reasons a reorder gesture is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    /// Group has never been loaded into the engine
    #[error("Group not loaded: {0}")]
    UnknownGroup(GroupKey),

    /// Record is not part of the group
    #[error("Record {record} is not in group {group}")]
    UnknownRecord { group: GroupKey, record: RecordId },

    /// A batch for this group is still awaiting the record store
    #[error("Reordering is disabled while a change to {0} is being saved")]
    DragDisabled(GroupKey),

    /// The operation needs a drag that is not in progress
    #[error("No drag in progress for group {0}")]
    NoDragInProgress(GroupKey),

    /// No optimistic change is waiting to be submitted
    #[error("Nothing to submit for group {0}")]
    NothingToSubmit(GroupKey),

    /// Destination outside the group
    #[error("Index {index} out of range for group of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Records of this collection have no position to change
    #[error("Records in {0} cannot be reordered")]
    NotReorderable(&'static str),

    /// The engine was torn down
    #[error("Reorder engine has been shut down")]
    TornDown,
}
