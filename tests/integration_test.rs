//! Integration tests for roster
//!
//! These tests drive a `BrowseSession` end to end: once against the
//! in-memory store, and once through `RemoteStore` with a loopback transport
//! that answers with real response envelopes.

use parking_lot::Mutex;
use roster::notify::{Level, NotificationCenter};
use roster::reorder::{ReorderBatch, ReorderOutcome, ReorderState};
use roster::store::{
    BearerToken, Envelope, Failure, MemoryStore, Method, RecordStore, RemoteStore, StoreError,
    StoreOp, StoreRequest, Transport, TransportResponse,
};
use roster::suggest::compute_suggestions;
use roster::{
    BrowseSession, BrowserConfig, FetchParams, FieldKind, GroupKey, Mode, PageResult, Record,
    RecordId, RecordKind, ViewState,
};
use std::time::{Duration, Instant};

/// Helper function to build a session over an in-memory collection
fn memory_session(
    kind: RecordKind,
    records: Vec<Record>,
) -> BrowseSession<MemoryStore, NotificationCenter> {
    let config = BrowserConfig::default();
    BrowseSession::new(
        MemoryStore::with_records(kind, records),
        NotificationCenter::from_config(&config),
        config,
    )
}

/// Helper function to create the "Mentors" group ordered A, B, C
fn mentors() -> Vec<Record> {
    ["A", "B", "C"]
        .into_iter()
        .zip(0u32..)
        .map(|(id, index)| {
            Record::new(id)
                .in_group("Mentors")
                .at_index(index)
                .with_field("name", format!("Mentor {id}"))
        })
        .collect()
}

/// Helper function to create `count` partners in `category`
fn partners(category: &str, count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new(format!("{category}-{i}"))
                .in_group(category)
                .at_index(u32::try_from(i).unwrap())
                .with_field("name", format!("{category} partner {i}"))
                .with_field("category", category)
        })
        .collect()
}

fn order_of(records: &[Record]) -> Vec<(String, u32)> {
    records
        .iter()
        .map(|r| (r.id.to_string(), r.order_index.unwrap()))
        .collect()
}

fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
    expected.iter().map(|(id, i)| ((*id).to_string(), *i)).collect()
}

#[test]
fn test_drag_to_front_commits() {
    let group = GroupKey::from("Mentors");
    let mut session = memory_session(RecordKind::TeamMember, mentors());
    assert!(session.load_group(&group));

    session.begin_drag(&group, &RecordId::from("C")).unwrap();
    let outcome = session.drop_at(&group, 0).unwrap().unwrap();

    assert!(matches!(outcome, ReorderOutcome::Committed));
    assert_eq!(session.reorder_state(&group), Some(&ReorderState::Committed));
    assert_eq!(
        order_of(session.ordering(&group).unwrap()),
        pairs(&[("C", 0), ("A", 1), ("B", 2)])
    );
    assert_eq!(
        order_of(&session.store().group(&group)),
        pairs(&[("C", 0), ("A", 1), ("B", 2)])
    );
    assert_eq!(session.notifier().count(Level::Error), 0);
}

#[test]
fn test_drag_to_front_rolls_back_on_failure() {
    let group = GroupKey::from("Mentors");
    let mut session = memory_session(RecordKind::TeamMember, mentors());
    session.load_group(&group);
    session.store().fail_next(StoreOp::Reorder, Failure::Server(503));

    session.begin_drag(&group, &RecordId::from("C")).unwrap();
    let outcome = session.drop_at(&group, 0).unwrap().unwrap();

    assert!(matches!(outcome, ReorderOutcome::RolledBack { .. }));
    assert_eq!(
        order_of(session.ordering(&group).unwrap()),
        pairs(&[("A", 0), ("B", 1), ("C", 2)])
    );
    let errors: Vec<_> = session
        .notifier()
        .active()
        .into_iter()
        .filter(|n| n.level == Level::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].text.contains("Mentors"));
}

#[test]
fn test_typing_replaces_filtered_browse() {
    let start = Instant::now();
    let mut records = partners("Academic", 15);
    records.extend(partners("Industry", 5));
    records.push(
        Record::new("zoho")
            .in_group("Industry")
            .at_index(5)
            .with_field("name", "Zoho")
            .with_field("category", "Industry"),
    );
    let mut session = memory_session(RecordKind::Partner, records);
    session.open();
    session.set_group_filter(Some(GroupKey::from("Academic")));
    session.set_page(2);
    assert_eq!(session.query().page, 2);

    // a browse fetch that is still out when the user starts typing
    let late_browse = session.controller_mut().refresh();
    let late_result = session.store().fetch(&late_browse.params);

    for (i, text) in ["z", "zo", "zoh", "zoho"].into_iter().enumerate() {
        session.type_text(text, start + Duration::from_millis(100 * i as u64));
        assert!(!session.tick(start + Duration::from_millis(100 * i as u64)));
    }
    assert!(session.tick(start + Duration::from_millis(300) + session.config().debounce()));

    assert_eq!(session.store().calls(StoreOp::Search), 1);
    assert_eq!(session.query().mode, Mode::Search);
    assert_eq!(session.query().page, 1);
    assert_eq!(session.records()[0].id.as_str(), "zoho");

    assert!(!session.complete(late_browse.seq, late_result));
    assert_eq!(session.records()[0].id.as_str(), "zoho");
    assert_eq!(session.page_view().unwrap().total_records, 1);
}

#[test]
fn test_drone_suggestions() {
    let records = vec![
        Record::new("s1").with_field("title", "Drone Kit"),
        Record::new("s2").with_field("title", "Drone Sensor"),
    ];
    let suggestions = compute_suggestions(&records, &[FieldKind::from("title")], "drone", 8);
    let found: Vec<(&str, &str)> = suggestions
        .iter()
        .map(|s| (s.field_kind.as_str(), s.matched_text.as_str()))
        .collect();
    assert_eq!(found, vec![("title", "Drone Kit"), ("title", "Drone Sensor")]);

    let mut session = memory_session(
        RecordKind::Stock,
        records
            .into_iter()
            .map(|r| r.in_group("Robotics"))
            .collect(),
    );
    session.open();
    session.type_text("drone", Instant::now());
    assert_eq!(session.suggestions().len(), 2);
    assert_eq!(session.panel().selected_index(), -1);
}

#[test]
fn test_no_records_is_empty_state() {
    let mut session = memory_session(RecordKind::Tender, Vec::new());
    session.open();

    let view = session.page_view().unwrap();
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.page, 1);
    assert_eq!(view.display_range, (0, 0));
    assert!(view.is_empty());
    assert_eq!(session.view_state(), ViewState::Empty);
    assert!(session.notifier().active().is_empty());

    session.set_page(7);
    assert_eq!(session.query().page, 1);
}

#[test]
fn test_transient_failures_keep_view_and_notify() {
    let mut session = memory_session(RecordKind::Partner, partners("Academic", 30));
    session.open();
    let shown = session.page().cloned();

    session.store().fail_next(StoreOp::List, Failure::Transport);
    session.next_page();
    assert_eq!(session.page().cloned(), shown);

    session.store().fail_next(StoreOp::Delete, Failure::Server(500));
    assert!(!session.delete(&RecordId::from("Academic-0")));

    session.store().fail_next(StoreOp::Create, Failure::Rejected);
    assert!(session.create(&serde_json::json!({ "name": "New" })).is_none());

    assert_eq!(session.notifier().count(Level::Error), 3);
    assert_eq!(session.view_state(), ViewState::Loaded);
}

#[test]
fn test_conflict_refetches_group_even_without_refetch_setting() {
    let group = GroupKey::from("Mentors");
    let config = BrowserConfig {
        refetch_on_rollback: false,
        ..BrowserConfig::default()
    };
    let mut session = BrowseSession::new(
        MemoryStore::with_records(RecordKind::TeamMember, mentors()),
        NotificationCenter::new(),
        config,
    );
    session.load_group(&group);
    // someone else reordered in the meantime
    session
        .store()
        .put(Record::new("A").in_group("Mentors").at_index(2).with_field("name", "Mentor A"));
    session
        .store()
        .put(Record::new("C").in_group("Mentors").at_index(0).with_field("name", "Mentor C"));
    session.store().fail_next(StoreOp::Reorder, Failure::Conflict);

    let outcome = session
        .move_record(&group, &RecordId::from("B"), 0)
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, ReorderOutcome::RolledBack { refetch: true, .. }));
    assert_eq!(
        order_of(session.ordering(&group).unwrap()),
        pairs(&[("C", 0), ("B", 1), ("A", 2)])
    );
}

#[test]
fn test_transient_failure_without_refetch_setting() {
    let group = GroupKey::from("Mentors");
    let config = BrowserConfig {
        refetch_on_rollback: false,
        ..BrowserConfig::default()
    };
    let mut session = BrowseSession::new(
        MemoryStore::with_records(RecordKind::TeamMember, mentors()),
        NotificationCenter::new(),
        config,
    );
    session.load_group(&group);
    session.store().fail_next(StoreOp::Reorder, Failure::Transport);

    let outcome = session
        .move_record(&group, &RecordId::from("B"), 0)
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, ReorderOutcome::RolledBack { refetch: false, .. }));
    assert_eq!(session.store().calls(StoreOp::List), 1);
    assert!(session.can_drag(&group));
}

/// Answers `RemoteStore` requests from a `MemoryStore`, like the
/// collection service would
struct Loopback {
    backend: MemoryStore,
    sent: Mutex<Vec<StoreRequest>>,
}

impl Loopback {
    fn new(kind: RecordKind, records: Vec<Record>) -> Self {
        Self {
            backend: MemoryStore::with_records(kind, records),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn number(request: &StoreRequest, key: &str) -> usize {
        request
            .query_param(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1)
    }

    fn answer(&self, request: &StoreRequest) -> Result<Envelope, StoreError> {
        let kind = self.backend.kind();
        let page = Self::number(request, "page");
        let limit = Self::number(request, "limit");
        let page_envelope = |result: Result<PageResult, StoreError>| {
            result.map(|p| Envelope::from_page(kind, &p))
        };

        match (request.method, request.path.rsplit('/').next()) {
            (Method::Get, Some("search")) => page_envelope(self.backend.search(
                request.query_param("q").unwrap_or_default(),
                page,
                limit,
            )),
            (Method::Get, _) => {
                let group = request
                    .query_param(kind.descriptor().group_field)
                    .map(GroupKey::from);
                page_envelope(self.backend.list(group.as_ref(), page, limit))
            }
            (Method::Put, Some("reorder")) => {
                let body = request.body.clone().unwrap_or_default();
                let batch: ReorderBatch = serde_json::from_value(body)?;
                self.backend.reorder(&batch).map(|()| Envelope {
                    success: true,
                    data: serde_json::Value::Null,
                    pagination: None,
                    message: Some("Order updated".to_string()),
                })
            }
            (method, _) => Err(StoreError::Status {
                code: 405,
                message: format!("{method:?} not supported"),
            }),
        }
    }
}

impl Transport for Loopback {
    fn send(&self, request: StoreRequest) -> Result<TransportResponse, StoreError> {
        self.sent.lock().push(request.clone());
        let response = match self.answer(&request) {
            Ok(envelope) => TransportResponse::new(200, serde_json::to_string(&envelope)?),
            Err(StoreError::Conflict(message)) => TransportResponse::new(
                200,
                serde_json::json!({ "success": false, "message": message }).to_string(),
            ),
            Err(StoreError::Transport(message)) => return Err(StoreError::Transport(message)),
            Err(error) => TransportResponse::new(
                500,
                serde_json::json!({ "success": false, "message": error.to_string() }).to_string(),
            ),
        };
        Ok(response)
    }
}

#[test]
fn test_remote_session_end_to_end() {
    let group = GroupKey::from("Academic");
    let store = RemoteStore::new(
        RecordKind::Partner,
        "/api/",
        Loopback::new(RecordKind::Partner, partners("Academic", 12)),
        BearerToken("secret".to_string()),
    );
    let mut session = BrowseSession::new(store, NotificationCenter::new(), BrowserConfig::default());

    assert!(session.open());
    let view = session.page_view().unwrap();
    assert_eq!(view.total_pages, 2);
    assert_eq!(view.display_range, (1, 10));

    assert!(session.next_page());
    assert_eq!(session.page_view().unwrap().display_range, (11, 12));

    assert!(session.load_group(&group));
    let outcome = session
        .move_record(&group, &RecordId::from("Academic-11"), 0)
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, ReorderOutcome::Committed));

    let transport = session.store().transport();
    let first = transport.backend.group(&group);
    assert_eq!(first[0].id.as_str(), "Academic-11");
    assert_eq!(first[0].order_index, Some(0));

    let sent = transport.sent.lock();
    assert!(sent.iter().all(|r| r.header("authorization") == Some("Bearer secret")));
    let reorder = sent
        .iter()
        .find(|r| r.path == "/api/partners/reorder")
        .unwrap();
    assert_eq!(reorder.method, Method::Put);
    assert_eq!(reorder.body.as_ref().unwrap()["moves"].as_array().unwrap().len(), 12);
}

#[test]
fn test_remote_search_params() {
    let store = RemoteStore::new(
        RecordKind::Partner,
        "/api",
        Loopback::new(RecordKind::Partner, partners("Academic", 3)),
        BearerToken("secret".to_string()),
    );
    let page = store
        .fetch(&FetchParams::Search {
            text: "partner 2".to_string(),
            page: 1,
            page_size: 10,
        })
        .unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].id.as_str(), "Academic-2");

    let sent = store.transport().sent.lock();
    assert_eq!(sent[0].path, "/api/partners/search");
    assert_eq!(sent[0].query_param("q"), Some("partner 2"));
}

#[test]
fn test_remote_reorder_conflict_rolls_back() {
    let group = GroupKey::from("Academic");
    let store = RemoteStore::new(
        RecordKind::Partner,
        "/api",
        Loopback::new(RecordKind::Partner, partners("Academic", 3)),
        BearerToken("secret".to_string()),
    );
    let mut session = BrowseSession::new(store, NotificationCenter::new(), BrowserConfig::default());
    session.load_group(&group);
    session
        .store()
        .transport()
        .backend
        .fail_next(StoreOp::Reorder, Failure::Conflict);

    let outcome = session
        .move_record(&group, &RecordId::from("Academic-2"), 0)
        .unwrap()
        .unwrap();
    match outcome {
        ReorderOutcome::RolledBack { error, refetch } => {
            assert!(error.is_conflict());
            assert!(refetch);
        }
        other => panic!("expected rollback, got {other:?}"),
    }
    assert_eq!(session.notifier().count(Level::Error), 1);
    assert_eq!(
        order_of(session.ordering(&group).unwrap()),
        pairs(&[("Academic-0", 0), ("Academic-1", 1), ("Academic-2", 2)])
    );
}
