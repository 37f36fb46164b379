//! Collection service response envelope
//!
//! Every endpoint answers with the same shape:
//!
//! ```json
//! {
//!   "success": true,
//!   "data": [ ... ],
//!   "pagination": {
//!     "currentPage": 1, "totalPages": 3, "totalRecords": 25,
//!     "pageSize": 10, "hasNextPage": true, "hasPreviousPage": false
//!   }
//! }
//! ```
//!
//! `data` is an array for list/search and a single object for
//! create/update. `pagination` is only present on list/search.

use super::error::StoreError;
use crate::pagination::PageResult;
use crate::record::{Record, RecordKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Pagination block of a list/search response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub page_size: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Raw response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    /// Parse a response body
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decode` if the body is not an envelope.
    pub fn parse(body: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Build a successful list/search envelope for a page
    #[must_use]
    pub fn from_page(kind: RecordKind, page: &PageResult) -> Self {
        Self {
            success: true,
            data: Value::Array(page.records.iter().map(|r| kind.encode(r)).collect()),
            pagination: Some(PaginationMeta {
                current_page: page.page,
                total_pages: page.total_pages,
                total_records: page.total_records,
                page_size: page.page_size,
                has_next_page: page.page < page.total_pages,
                has_previous_page: page.page > 1,
            }),
            message: None,
        }
    }

    /// Fail with `Rejected` unless `success` is set
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` carrying the server message, if any.
    pub fn ensure_success(self) -> Result<Self, StoreError> {
        if self.success {
            Ok(self)
        } else {
            Err(StoreError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }

    /// Interpret a list/search response as a page
    ///
    /// `total_pages` is recomputed from `total_records` and `page_size`
    /// rather than trusted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the envelope is unsuccessful, has no
    /// pagination block, or contains undecodable records.
    pub fn into_page(self, kind: RecordKind) -> Result<PageResult, StoreError> {
        let envelope = self.ensure_success()?;
        let meta = envelope.pagination.ok_or_else(|| {
            StoreError::Malformed("list response without pagination".to_string())
        })?;

        let records = match envelope.data {
            Value::Array(items) => items
                .iter()
                .map(|item| kind.decode(item))
                .collect::<Result<Vec<_>, _>>()?,
            Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Malformed(format!(
                    "list response data is not an array: {other}"
                )));
            }
        };

        let page = PageResult::new(
            records,
            meta.current_page,
            meta.page_size,
            meta.total_records,
        );
        if page.total_pages != meta.total_pages || page.page != meta.current_page {
            warn!(
                collection = kind.descriptor().collection,
                reported_pages = meta.total_pages,
                derived_pages = page.total_pages,
                reported_page = meta.current_page,
                "pagination metadata disagrees with record counts"
            );
        }
        Ok(page)
    }

    /// Interpret a create/update response as a single record
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the envelope is unsuccessful or carries no record.
    pub fn into_record(self, kind: RecordKind) -> Result<Record, StoreError> {
        let envelope = self.ensure_success()?;
        match envelope.data {
            Value::Array(items) => items.first().map_or_else(
                || Err(StoreError::Malformed("empty record response".to_string())),
                |item| kind.decode(item),
            ),
            Value::Null => Err(StoreError::Malformed("empty record response".to_string())),
            item => kind.decode(&item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldKind;

    const LIST_BODY: &str = r#"{
        "success": true,
        "data": [
            { "_id": "s1", "title": "Drone Kit", "category": "Robotics" },
            { "_id": "s2", "title": "Drone Sensor", "category": "Robotics" }
        ],
        "pagination": {
            "currentPage": 2, "totalPages": 2, "totalRecords": 12,
            "pageSize": 10, "hasNextPage": false, "hasPreviousPage": true
        }
    }"#;

    #[test]
    fn test_list_envelope_into_page() {
        let page = Envelope::parse(LIST_BODY)
            .unwrap()
            .into_page(RecordKind::Stock)
            .unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_records, 12);
        assert_eq!(page.records.len(), 2);
        assert_eq!(
            page.records[0].field(&FieldKind::from("title")),
            Some("Drone Kit")
        );
    }

    #[test]
    fn test_unsuccessful_envelope_is_rejected() {
        let body = r#"{ "success": false, "message": "database offline" }"#;
        let result = Envelope::parse(body).unwrap().into_page(RecordKind::Stock);
        match result {
            Err(StoreError::Rejected(msg)) => assert_eq!(msg, "database offline"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_list_without_pagination_is_malformed() {
        let body = r#"{ "success": true, "data": [] }"#;
        let result = Envelope::parse(body).unwrap().into_page(RecordKind::Stock);
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_inconsistent_total_pages_is_recomputed() {
        let body = r#"{
            "success": true, "data": [],
            "pagination": {
                "currentPage": 9, "totalPages": 0, "totalRecords": 0,
                "pageSize": 10, "hasNextPage": false, "hasPreviousPage": false
            }
        }"#;
        let page = Envelope::parse(body)
            .unwrap()
            .into_page(RecordKind::Tender)
            .unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_record_envelope_object_and_array() {
        let object = r#"{ "success": true, "data": { "_id": "t1", "title": "Lab fitout" } }"#;
        let record = Envelope::parse(object)
            .unwrap()
            .into_record(RecordKind::Tender)
            .unwrap();
        assert_eq!(record.id.as_str(), "t1");

        let array = r#"{ "success": true, "data": [{ "_id": "t2" }] }"#;
        let record = Envelope::parse(array)
            .unwrap()
            .into_record(RecordKind::Tender)
            .unwrap();
        assert_eq!(record.id.as_str(), "t2");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Envelope::parse("<html>"),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_from_page_shape() {
        let page = PageResult::new(vec![Record::new("a")], 1, 10, 11);
        let envelope = Envelope::from_page(RecordKind::Partner, &page);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0]["_id"], "a");
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["pagination"]["hasNextPage"], true);
        assert_eq!(json["pagination"]["hasPreviousPage"], false);
        assert!(json.get("message").is_none());
    }
}
