//! Record model shared by every browser component
//!
//! A `Record` is the subset of a domain item (partner, team member, startup,
//! tender, stock entry, project) that the browser cares about: a stable id,
//! the group it is ordered within, its position in that group and the text
//! fields that search and suggestions run against.
//!
//! # Types
//!
//! - **`RecordId`**: Opaque identifier assigned by the collection service
//! - **`GroupKey`**: Category/team/tab scope for ordering and filtering
//! - **`FieldKind`**: Name of a searchable text field
//! - **`Record`**: The item itself
//! - **`RecordKind`**: Which admin collection a record belongs to

pub mod kind;

pub use kind::{KindDescriptor, RecordKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, stable record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Scope within which records are ordered and filtered
///
/// Records in different groups never share order-index space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Name of a searchable text field ("title", "name", "designation", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKind(pub String);

impl FieldKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKind {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A domain item as seen by the browser
///
/// Fields are public for direct access. `order_index` is `None` for records
/// that are never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub group_key: Option<GroupKey>,
    pub order_index: Option<u32>,
    #[serde(default)]
    pub fields: BTreeMap<FieldKind, String>,
}

impl Record {
    /// Create a record with no group, no position and no text fields
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(id),
            group_key: None,
            order_index: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group_key = Some(GroupKey::new(group));
        self
    }

    #[must_use]
    pub const fn at_index(mut self, index: u32) -> Self {
        self.order_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_field(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(FieldKind::new(kind), value.into());
        self
    }

    /// Text of a searchable field, if the record carries it
    #[must_use]
    pub fn field(&self, kind: &FieldKind) -> Option<&str> {
        self.fields.get(kind).map(String::as_str)
    }

    /// Whether this record belongs to `group`
    #[must_use]
    pub fn belongs_to(&self, group: &GroupKey) -> bool {
        self.group_key.as_ref() == Some(group)
    }
}
