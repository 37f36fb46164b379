//! Collection service client
//!
//! `RemoteStore` turns `RecordStore` calls into `StoreRequest`s, hands them
//! to a `Transport`, and decodes the response envelope. Authentication is
//! supplied by an injected `CredentialProvider` rather than read from
//! ambient state, so stores can be built and tested in isolation.
//!
//! # Endpoints
//!
//! ```text
//! GET    {base}/{collection}?page&limit[&{groupField}]   list
//! GET    {base}/{collection}/search?q&page&limit         search
//! POST   {base}/{collection}                             create
//! PUT    {base}/{collection}/{id}                        update
//! DELETE {base}/{collection}/{id}                        delete
//! PUT    {base}/{collection}/reorder                     reorder
//! ```

use super::RecordStore;
use super::envelope::Envelope;
use super::error::StoreError;
use crate::pagination::PageResult;
use crate::record::{GroupKey, Record, RecordId, RecordKind};
use crate::reorder::ReorderBatch;
use serde_json::Value;
use std::fmt::Write;
use tracing::{debug, warn};

/// HTTP method of a store request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A request ready to be sent by a `Transport`
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl StoreRequest {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a header (case-insensitive name)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from a `Transport`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends store requests over the wire
pub trait Transport {
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if no response was received.
    fn send(&self, request: StoreRequest) -> Result<TransportResponse, StoreError>;
}

/// Supplies the `Authorization` header value
pub trait CredentialProvider {
    /// `Ok(None)` sends the request unauthenticated
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Credentials` if credentials exist but cannot be read.
    fn authorization(&self) -> Result<Option<String>, StoreError>;
}

/// No credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn authorization(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}

/// Fixed bearer token
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl CredentialProvider for BearerToken {
    fn authorization(&self) -> Result<Option<String>, StoreError> {
        if self.0.is_empty() {
            return Err(StoreError::Credentials("empty bearer token".to_string()));
        }
        Ok(Some(format!("Bearer {}", self.0)))
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

/// `RecordStore` backed by the collection service
pub struct RemoteStore<T, C> {
    kind: RecordKind,
    base_path: String,
    transport: T,
    credentials: C,
}

impl<T: Transport, C: CredentialProvider> RemoteStore<T, C> {
    /// Create a client for `kind` rooted at `base_path` (e.g. `/api`)
    pub fn new(kind: RecordKind, base_path: impl Into<String>, transport: T, credentials: C) -> Self {
        Self {
            kind,
            base_path: base_path.into().trim_end_matches('/').to_string(),
            transport,
            credentials,
        }
    }

    /// Injected transport
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn collection_path(&self) -> String {
        format!("{}/{}", self.base_path, self.kind.descriptor().collection)
    }

    fn record_path(&self, id: &RecordId) -> String {
        format!("{}/{}", self.collection_path(), encode_segment(id.as_str()))
    }

    /// Attach credentials, send, and unwrap the envelope
    fn exchange(&self, mut request: StoreRequest) -> Result<Envelope, StoreError> {
        if let Some(auth) = self.credentials.authorization()? {
            request.headers.push(("Authorization".to_string(), auth));
        }
        if request.body.is_some() {
            request
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
        }

        debug!(method = ?request.method, path = %request.path, "record store request");
        let response = self.transport.send(request)?;

        if !response.is_success() {
            let message = Envelope::parse(&response.body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| response.body.clone());
            warn!(status = response.status, %message, "record store request failed");
            return Err(match response.status {
                404 => StoreError::NotFound(message),
                409 => StoreError::Conflict(message),
                code => StoreError::Status { code, message },
            });
        }

        Envelope::parse(&response.body)?.ensure_success()
    }
}

impl<T: Transport, C: CredentialProvider> RecordStore for RemoteStore<T, C> {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    fn list(
        &self,
        group: Option<&GroupKey>,
        page: usize,
        page_size: usize,
    ) -> Result<PageResult, StoreError> {
        let mut request = StoreRequest::new(Method::Get, self.collection_path())
            .param("page", page)
            .param("limit", page_size);
        if let Some(group) = group {
            request = request.param(self.kind.descriptor().group_field, group);
        }
        self.exchange(request)?.into_page(self.kind)
    }

    fn search(
        &self,
        text: &str,
        page: usize,
        page_size: usize,
    ) -> Result<PageResult, StoreError> {
        let request = StoreRequest::new(Method::Get, format!("{}/search", self.collection_path()))
            .param("q", text)
            .param("page", page)
            .param("limit", page_size);
        self.exchange(request)?.into_page(self.kind)
    }

    fn create(&self, payload: &Value) -> Result<Record, StoreError> {
        let request = StoreRequest::new(Method::Post, self.collection_path()).body(payload.clone());
        self.exchange(request)?.into_record(self.kind)
    }

    fn update(&self, id: &RecordId, payload: &Value) -> Result<Record, StoreError> {
        let request = StoreRequest::new(Method::Put, self.record_path(id)).body(payload.clone());
        self.exchange(request)?.into_record(self.kind)
    }

    fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let request = StoreRequest::new(Method::Delete, self.record_path(id));
        self.exchange(request).map(|_| ())
    }

    fn reorder(&self, batch: &ReorderBatch) -> Result<(), StoreError> {
        let body = serde_json::to_value(batch)?;
        let request =
            StoreRequest::new(Method::Put, format!("{}/reorder", self.collection_path())).body(body);
        // a refused batch means the service's ordering moved under us
        match self.exchange(request) {
            Ok(_) => Ok(()),
            Err(StoreError::Rejected(message)) => Err(StoreError::Conflict(message)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::Move;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Records every request and answers from a queue
    #[derive(Default)]
    struct ScriptedTransport {
        sent: Mutex<Vec<StoreRequest>>,
        replies: Mutex<VecDeque<Result<TransportResponse, StoreError>>>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Result<TransportResponse, StoreError>>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            }
        }

        fn last(&self) -> StoreRequest {
            self.sent.lock().last().cloned().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: StoreRequest) -> Result<TransportResponse, StoreError> {
            self.sent.lock().push(request);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(StoreError::Transport("no scripted reply".to_string())))
        }
    }

    fn ok(body: &str) -> Result<TransportResponse, StoreError> {
        Ok(TransportResponse::new(200, body))
    }

    const EMPTY_PAGE: &str = r#"{
        "success": true, "data": [],
        "pagination": { "currentPage": 1, "totalPages": 1, "totalRecords": 0,
                        "pageSize": 10, "hasNextPage": false, "hasPreviousPage": false }
    }"#;

    #[test]
    fn test_list_request_shape() {
        let store = RemoteStore::new(
            RecordKind::Partner,
            "/api/",
            ScriptedTransport::replying(vec![ok(EMPTY_PAGE)]),
            BearerToken("secret".to_string()),
        );

        let page = store
            .list(Some(&GroupKey::from("Academic")), 2, 10)
            .unwrap();
        assert!(page.is_empty());

        let request = store.transport().last();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/api/partners");
        assert_eq!(request.query_param("page"), Some("2"));
        assert_eq!(request.query_param("limit"), Some("10"));
        assert_eq!(request.query_param("category"), Some("Academic"));
        assert_eq!(request.header("authorization"), Some("Bearer secret"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_search_request_shape() {
        let store = RemoteStore::new(
            RecordKind::Stock,
            "/api",
            ScriptedTransport::replying(vec![ok(EMPTY_PAGE)]),
            Anonymous,
        );

        store.search("drone", 1, 10).unwrap();
        let request = store.transport().last();
        assert_eq!(request.path, "/api/stock/search");
        assert_eq!(request.query_param("q"), Some("drone"));
        assert!(request.header("Authorization").is_none());
    }

    #[test]
    fn test_reorder_request_body() {
        let store = RemoteStore::new(
            RecordKind::TeamMember,
            "/api",
            ScriptedTransport::replying(vec![ok(r#"{ "success": true }"#)]),
            Anonymous,
        );
        let batch = ReorderBatch {
            group_key: GroupKey::from("Mentors"),
            moves: vec![
                Move {
                    id: RecordId::from("c"),
                    new_index: 0,
                },
                Move {
                    id: RecordId::from("a"),
                    new_index: 1,
                },
            ],
        };

        store.reorder(&batch).unwrap();
        let request = store.transport().last();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/api/team/reorder");
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body = request.body.unwrap();
        assert_eq!(body["groupKey"], "Mentors");
        assert_eq!(body["moves"][0]["id"], "c");
        assert_eq!(body["moves"][0]["newIndex"], 0);
    }

    #[test]
    fn test_reorder_rejection_is_conflict() {
        let store = RemoteStore::new(
            RecordKind::Partner,
            "/api",
            ScriptedTransport::replying(vec![
                ok(r#"{ "success": false, "message": "stale order" }"#),
                Ok(TransportResponse::new(409, r#"{ "success": false }"#)),
            ]),
            Anonymous,
        );
        let batch = ReorderBatch {
            group_key: GroupKey::from("Academic"),
            moves: Vec::new(),
        };

        assert!(store.reorder(&batch).unwrap_err().is_conflict());
        assert!(store.reorder(&batch).unwrap_err().is_conflict());
    }

    #[test]
    fn test_status_errors_are_classified() {
        let store = RemoteStore::new(
            RecordKind::Tender,
            "/api",
            ScriptedTransport::replying(vec![
                Ok(TransportResponse::new(404, "")),
                Ok(TransportResponse::new(
                    500,
                    r#"{ "success": false, "message": "boom" }"#,
                )),
            ]),
            Anonymous,
        );

        assert!(matches!(
            store.delete(&RecordId::from("t1")),
            Err(StoreError::NotFound(_))
        ));
        match store.list(None, 1, 10) {
            Err(StoreError::Status { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_failure_propagates() {
        let store = RemoteStore::new(
            RecordKind::Tender,
            "/api",
            ScriptedTransport::default(),
            Anonymous,
        );
        let err = store.search("x", 1, 10).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_record_id_is_escaped_in_path() {
        let store = RemoteStore::new(
            RecordKind::Project,
            "/api",
            ScriptedTransport::replying(vec![ok(r#"{ "success": true }"#)]),
            Anonymous,
        );

        store.delete(&RecordId::from("a/b?c#d e")).unwrap();
        let request = store.transport().last();
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.path, "/api/projects/a%2Fb%3Fc%23d%20e");
    }

    #[test]
    fn test_create_and_update_decode_record() {
        let store = RemoteStore::new(
            RecordKind::Project,
            "/api",
            ScriptedTransport::replying(vec![
                ok(r#"{ "success": true, "data": { "_id": "pr1", "title": "Solar" } }"#),
                ok(r#"{ "success": true, "data": { "_id": "pr1", "title": "Solar v2" } }"#),
            ]),
            Anonymous,
        );

        let created = store
            .create(&serde_json::json!({ "title": "Solar" }))
            .unwrap();
        assert_eq!(created.id.as_str(), "pr1");
        assert_eq!(store.transport().last().method, Method::Post);

        store
            .update(&created.id, &serde_json::json!({ "title": "Solar v2" }))
            .unwrap();
        let request = store.transport().last();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/api/projects/pr1");
    }

    #[test]
    fn test_empty_bearer_token_fails_before_sending() {
        let store = RemoteStore::new(
            RecordKind::Tender,
            "/api",
            ScriptedTransport::replying(vec![ok(EMPTY_PAGE)]),
            BearerToken(String::new()),
        );
        assert!(matches!(
            store.list(None, 1, 10),
            Err(StoreError::Credentials(_))
        ));
        assert!(store.transport().sent.lock().is_empty());
    }
}
