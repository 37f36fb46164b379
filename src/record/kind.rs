//! Admin collections and their wire schema
//!
//! Each collection names its group field differently (partners are grouped
//! by category, team members by team, ...). A `KindDescriptor` captures
//! those differences so the rest of the browser only sees `Record`.

use super::{FieldKind, GroupKey, Record, RecordId};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire name of the identifier field
const ID_FIELD: &str = "_id";

/// Wire name of the position field
const ORDER_FIELD: &str = "order";

/// The admin collections served by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Partner,
    TeamMember,
    Startup,
    Tender,
    Stock,
    Project,
}

/// Static description of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Collection path segment on the record store
    pub collection: &'static str,
    /// Wire field holding the group key
    pub group_field: &'static str,
    /// Whether records of this kind carry an order index
    pub reorderable: bool,
    /// Searchable text fields, in suggestion order
    pub searchable: &'static [&'static str],
}

impl RecordKind {
    /// All kinds, in menu order
    pub const ALL: [Self; 6] = [
        Self::Partner,
        Self::TeamMember,
        Self::Startup,
        Self::Tender,
        Self::Stock,
        Self::Project,
    ];

    #[must_use]
    pub const fn descriptor(self) -> KindDescriptor {
        match self {
            Self::Partner => KindDescriptor {
                collection: "partners",
                group_field: "category",
                reorderable: true,
                searchable: &["name", "category", "description"],
            },
            Self::TeamMember => KindDescriptor {
                collection: "team",
                group_field: "team",
                reorderable: true,
                searchable: &["name", "designation", "team"],
            },
            Self::Startup => KindDescriptor {
                collection: "startups",
                group_field: "category",
                reorderable: false,
                searchable: &["name", "founder", "sector"],
            },
            Self::Tender => KindDescriptor {
                collection: "tenders",
                group_field: "status",
                reorderable: false,
                searchable: &["title", "reference", "department"],
            },
            Self::Stock => KindDescriptor {
                collection: "stock",
                group_field: "category",
                reorderable: false,
                searchable: &["title", "category", "vendor"],
            },
            Self::Project => KindDescriptor {
                collection: "projects",
                group_field: "domain",
                reorderable: false,
                searchable: &["title", "applicant", "institution"],
            },
        }
    }

    /// Searchable fields as `FieldKind`s, in declaration order
    #[must_use]
    pub fn searchable_fields(self) -> Vec<FieldKind> {
        self.descriptor()
            .searchable
            .iter()
            .map(|name| FieldKind::new(*name))
            .collect()
    }

    /// Decode a raw JSON object returned by the record store
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` if the value is not an object, has no
    /// usable identifier, or carries a negative/non-numeric order.
    pub fn decode(self, value: &Value) -> Result<Record, StoreError> {
        let desc = self.descriptor();
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::Malformed(format!("expected object, got {value}")))?;

        let id = match object.get(ID_FIELD).or_else(|| object.get("id")) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(StoreError::Malformed(format!(
                    "{} record without an identifier",
                    desc.collection
                )));
            }
        };

        let group_key = object
            .get(desc.group_field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(GroupKey::new);

        let order_index = match object.get(ORDER_FIELD) {
            None | Some(Value::Null) => None,
            Some(v) => {
                let n = v.as_u64().ok_or_else(|| {
                    StoreError::Malformed(format!("record {id}: invalid order {v}"))
                })?;
                Some(u32::try_from(n).map_err(|_| {
                    StoreError::Malformed(format!("record {id}: order {n} out of range"))
                })?)
            }
        };

        let mut record = Record {
            id: RecordId(id),
            group_key,
            order_index,
            fields: std::collections::BTreeMap::new(),
        };
        for name in desc.searchable {
            if let Some(text) = object.get(*name).and_then(Value::as_str) {
                record.fields.insert(FieldKind::new(*name), text.to_string());
            }
        }

        Ok(record)
    }

    /// Encode a record back into the wire shape `decode` accepts
    #[must_use]
    pub fn encode(self, record: &Record) -> Value {
        let desc = self.descriptor();
        let mut object = serde_json::Map::new();
        object.insert(ID_FIELD.to_string(), Value::String(record.id.0.clone()));
        for (kind, text) in &record.fields {
            object.insert(kind.0.clone(), Value::String(text.clone()));
        }
        // group field may double as a searchable field; the key wins
        if let Some(group) = &record.group_key {
            object.insert(desc.group_field.to_string(), Value::String(group.0.clone()));
        }
        if let Some(index) = record.order_index {
            object.insert(ORDER_FIELD.to_string(), Value::from(index));
        }
        Value::Object(object)
    }
}
