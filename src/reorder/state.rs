//! Reorder gesture states and the batch sent to the record store

use crate::record::{GroupKey, Record, RecordId};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};

/// New position for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub id: RecordId,
    pub new_index: u32,
}

/// Full renumbering of one group, sent once and never retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBatch {
    pub group_key: GroupKey,
    pub moves: Vec<Move>,
}

impl ReorderBatch {
    /// Batch assigning every record its position in `ordering`
    #[must_use]
    pub fn from_ordering(group_key: GroupKey, ordering: &[Record]) -> Self {
        let moves = ordering
            .iter()
            .zip(0u32..)
            .map(|(record, new_index)| Move {
                id: record.id.clone(),
                new_index,
            })
            .collect();
        Self { group_key, moves }
    }
}

/// A batch handed out for submission, tagged so late resolutions can be told apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedBatch {
    pub ticket: u64,
    pub batch: ReorderBatch,
}

/// Where a group is in the drag/persist cycle
///
/// `Committed` and `RolledBack` are terminal for a gesture and behave like
/// `Stable` for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReorderState {
    /// Ordering reflects the record store's last known order
    #[default]
    Stable,
    /// A record has been picked up; nothing has changed yet
    Dragging { id: RecordId, from: usize },
    /// The move is applied locally; `shadow` is the pre-move ordering
    OptimisticallyApplied { shadow: Vec<Record> },
    /// The batch is with the record store
    Pending { shadow: Vec<Record>, ticket: u64 },
    /// The record store accepted the last batch
    Committed,
    /// The last batch failed and the shadow ordering was restored
    RolledBack,
}

impl ReorderState {
    /// Whether a new drag may start
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Stable | Self::Committed | Self::RolledBack)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// How a submitted batch ended
#[derive(Debug)]
pub enum ReorderOutcome {
    /// Accepted; the optimistic ordering stands
    Committed,
    /// Refused or failed; the pre-move ordering is back
    RolledBack {
        error: StoreError,
        /// The group should be fetched again from the record store
        refetch: bool,
    },
    /// The resolution belonged to a batch the engine no longer tracks
    Ignored,
}
