//! Roster - Interactive record browser for admin collections
//!
//! This library provides the state behind a paginated, searchable and
//! reorderable list of records (partners, team members, startups, tenders,
//! stock, projects) backed by a remote collection service.
//!
//! # Components
//!
//! - **`query`**: debounced search text, browse/search mode and stale
//!   response suppression
//! - **`suggest`**: field-level autosuggestions and the keyboard-driven panel
//! - **`pagination`**: page arithmetic and the view derived from a page result
//! - **`reorder`**: optimistic drag-and-drop ordering with rollback
//! - **`store`**: the `RecordStore` boundary, a remote client and an
//!   in-memory store
//! - **`session`**: `BrowseSession`, which wires all of the above together
//!
//! # Examples
//!
//! ```
//! use roster::config::BrowserConfig;
//! use roster::notify::NotificationCenter;
//! use roster::record::{Record, RecordKind};
//! use roster::session::{BrowseSession, ViewState};
//! use roster::store::MemoryStore;
//!
//! let store = MemoryStore::with_records(
//!     RecordKind::Stock,
//!     vec![Record::new("s1").in_group("Robotics").with_field("title", "Drone Kit")],
//! );
//! let config = BrowserConfig::default();
//! let notifier = NotificationCenter::from_config(&config);
//! let mut session = BrowseSession::new(store, notifier, config);
//!
//! session.open();
//! assert_eq!(session.view_state(), ViewState::Loaded);
//! assert_eq!(session.records()[0].id.as_str(), "s1");
//! ```

use thiserror::Error;

pub mod config;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod record;
pub mod reorder;
pub mod session;
pub mod store;
pub mod suggest;

#[cfg(test)]
pub mod testing;

pub use config::BrowserConfig;
pub use notify::{Level, NotificationCenter, Notifier, StderrNotifier};
pub use pagination::{FetchParams, PageResult, PageView, PaginationCoordinator};
pub use query::{FetchOutcome, FetchRequest, Mode, Query, QueryController, QueryError};
pub use record::{FieldKind, GroupKey, Record, RecordId, RecordKind};
pub use reorder::{ReorderBatch, ReorderEngine, ReorderError, ReorderOutcome, ReorderState};
pub use session::{BrowseSession, ViewState};
pub use store::{MemoryStore, RecordStore, RemoteStore, StoreError};
pub use suggest::{SuggestionItem, SuggestionPanel, compute_suggestions};

/// Error enum, contains all failure states of the library
#[derive(Debug, Error)]
pub enum RosterError {
    /// Record store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// Invalid query change
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    /// Refused reorder gesture
    #[error("Reorder error: {0}")]
    Reorder(#[from] ReorderError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}
