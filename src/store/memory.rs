//! In-process record store
//!
//! Holds a collection in memory and answers like the collection service:
//! paginated listing ordered by position, case-insensitive substring search,
//! atomic reorder that refuses batches not covering the whole group.
//! Failures can be scheduled per operation to exercise recovery paths.

use super::RecordStore;
use super::error::StoreError;
use crate::pagination::{PageResult, clamp_page, total_pages};
use crate::record::{GroupKey, Record, RecordId, RecordKind};
use crate::reorder::ReorderBatch;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};

/// Store operation, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Search,
    Create,
    Update,
    Delete,
    Reorder,
}

/// Failure to return from the next call of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Transport,
    Server(u16),
    Rejected,
    Conflict,
}

impl Failure {
    fn into_error(self, op: StoreOp) -> StoreError {
        match self {
            Self::Transport => StoreError::Transport(format!("{op:?}: connection reset")),
            Self::Server(code) => StoreError::Status {
                code,
                message: format!("{op:?} failed"),
            },
            Self::Rejected => StoreError::Rejected(format!("{op:?} rejected")),
            Self::Conflict => StoreError::Conflict(format!("{op:?} conflicts with current data")),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<Record>,
    next_id: u64,
    failures: HashMap<StoreOp, VecDeque<Failure>>,
    calls: HashMap<StoreOp, usize>,
}

impl MemoryState {
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(failure) => Err(failure.into_error(op)),
            None => Ok(()),
        }
    }

    fn group_len(&self, group: &GroupKey) -> usize {
        self.records.iter().filter(|r| r.belongs_to(group)).count()
    }

    /// Close the gaps a removal leaves in a group's positions
    fn renumber(&mut self, group: &GroupKey) {
        let mut members: Vec<&mut Record> = self
            .records
            .iter_mut()
            .filter(|r| r.belongs_to(group) && r.order_index.is_some())
            .collect();
        members.sort_by_key(|r| r.order_index);
        for (index, record) in members.into_iter().enumerate() {
            record.order_index = u32::try_from(index).ok();
        }
    }
}

/// `RecordStore` over an in-memory collection
#[derive(Debug)]
pub struct MemoryStore {
    kind: RecordKind,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(kind: RecordKind) -> Self {
        Self::with_records(kind, Vec::new())
    }

    #[must_use]
    pub fn with_records(kind: RecordKind, records: Vec<Record>) -> Self {
        Self {
            kind,
            state: Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            }),
        }
    }

    /// Make the next call of `op` fail; repeated calls queue up
    pub fn fail_next(&self, op: StoreOp, failure: Failure) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(failure);
    }

    /// Number of times `op` has been called, failed calls included
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Copy of every stored record, in storage order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Record> {
        self.state.lock().records.clone()
    }

    /// Records of a group, ordered by position
    #[must_use]
    pub fn group(&self, group: &GroupKey) -> Vec<Record> {
        let mut members: Vec<Record> = self
            .state
            .lock()
            .records
            .iter()
            .filter(|r| r.belongs_to(group))
            .cloned()
            .collect();
        members.sort_by_key(|r| r.order_index.unwrap_or(u32::MAX));
        members
    }

    /// Replace a record directly, bypassing failure injection
    pub fn put(&self, record: Record) {
        let mut state = self.state.lock();
        match state.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => state.records.push(record),
        }
    }

    fn paginate(matches: Vec<Record>, page: usize, page_size: usize) -> PageResult {
        let page_size = page_size.max(1);
        let total = matches.len();
        let page = clamp_page(page, total_pages(total, page_size));
        let records = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        PageResult::new(records, page, page_size, total)
    }
}

impl RecordStore for MemoryStore {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    fn list(
        &self,
        group: Option<&GroupKey>,
        page: usize,
        page_size: usize,
    ) -> Result<PageResult, StoreError> {
        let mut state = self.state.lock();
        state.enter(StoreOp::List)?;

        let mut matches: Vec<Record> = state
            .records
            .iter()
            .filter(|r| group.is_none_or(|g| r.belongs_to(g)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.group_key
                .cmp(&b.group_key)
                .then(a.order_index.unwrap_or(u32::MAX).cmp(&b.order_index.unwrap_or(u32::MAX)))
        });
        Ok(Self::paginate(matches, page, page_size))
    }

    fn search(
        &self,
        text: &str,
        page: usize,
        page_size: usize,
    ) -> Result<PageResult, StoreError> {
        let mut state = self.state.lock();
        state.enter(StoreOp::Search)?;

        let needle = text.trim().to_lowercase();
        let fields = self.kind.searchable_fields();
        let matches: Vec<Record> = state
            .records
            .iter()
            .filter(|r| {
                fields.iter().any(|f| {
                    r.field(f)
                        .is_some_and(|value| value.to_lowercase().contains(&needle))
                })
            })
            .cloned()
            .collect();
        Ok(Self::paginate(matches, page, page_size))
    }

    fn create(&self, payload: &Value) -> Result<Record, StoreError> {
        let mut state = self.state.lock();
        state.enter(StoreOp::Create)?;

        let mut object = payload
            .as_object()
            .cloned()
            .ok_or_else(|| StoreError::Rejected("payload must be an object".to_string()))?;
        if !object.contains_key("_id") && !object.contains_key("id") {
            state.next_id += 1;
            object.insert("_id".to_string(), Value::String(format!("mem-{}", state.next_id)));
        }

        let mut record = self.kind.decode(&Value::Object(object))?;
        if state.records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Conflict(format!("record {} already exists", record.id)));
        }
        if self.kind.descriptor().reorderable && record.order_index.is_none() {
            if let Some(group) = &record.group_key {
                record.order_index = u32::try_from(state.group_len(group)).ok();
            }
        }

        state.records.push(record.clone());
        Ok(record)
    }

    fn update(&self, id: &RecordId, payload: &Value) -> Result<Record, StoreError> {
        let mut state = self.state.lock();
        state.enter(StoreOp::Update)?;

        let patch = payload
            .as_object()
            .ok_or_else(|| StoreError::Rejected("payload must be an object".to_string()))?;
        let position = state
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut merged = self.kind.encode(&state.records[position]);
        if let Value::Object(target) = &mut merged {
            for (key, value) in patch {
                if key != "_id" && key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        let mut updated = self.kind.decode(&merged)?;

        let old_group = state.records[position].group_key.clone();
        let moved = updated.group_key != old_group;
        if moved && self.kind.descriptor().reorderable {
            // joins the new group at the end
            updated.order_index = match &updated.group_key {
                Some(group) => u32::try_from(state.group_len(group)).ok(),
                None => None,
            };
        }
        state.records[position] = updated.clone();
        if let Some(group) = old_group.filter(|_| moved) {
            state.renumber(&group);
        }
        Ok(updated)
    }

    fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.enter(StoreOp::Delete)?;

        let position = state
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = state.records.remove(position);
        if let Some(group) = removed.group_key {
            state.renumber(&group);
        }
        Ok(())
    }

    fn reorder(&self, batch: &ReorderBatch) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.enter(StoreOp::Reorder)?;

        let members: HashSet<&RecordId> = state
            .records
            .iter()
            .filter(|r| r.belongs_to(&batch.group_key))
            .map(|r| &r.id)
            .collect();
        let moved: HashSet<&RecordId> = batch.moves.iter().map(|m| &m.id).collect();
        if moved != members || moved.len() != batch.moves.len() {
            return Err(StoreError::Conflict(format!(
                "batch for {} does not cover the group",
                batch.group_key
            )));
        }

        let mut indices: Vec<u32> = batch.moves.iter().map(|m| m.new_index).collect();
        indices.sort_unstable();
        if indices
            .iter()
            .enumerate()
            .any(|(i, index)| u32::try_from(i).ok() != Some(*index))
        {
            return Err(StoreError::Conflict(format!(
                "batch for {} is not a contiguous ordering",
                batch.group_key
            )));
        }

        let new_indices: HashMap<RecordId, u32> = batch
            .moves
            .iter()
            .map(|m| (m.id.clone(), m.new_index))
            .collect();
        for record in &mut state.records {
            if let Some(index) = new_indices.get(&record.id) {
                record.order_index = Some(*index);
            }
        }
        Ok(())
    }
}
