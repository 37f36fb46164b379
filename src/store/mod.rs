//! Record store client
//!
//! The record store is the only boundary to the collection service. The
//! browser talks to it exclusively through the `RecordStore` trait; a store
//! instance is bound to one `RecordKind`.
//!
//! # Implementations
//!
//! - **`RemoteStore`**: builds requests for the collection service and decodes
//!   its response envelope; the actual HTTP exchange is delegated to an
//!   injected `Transport`
//! - **`MemoryStore`**: in-process collection with the same semantics, for
//!   tests and hosts without a backend

pub mod envelope;
pub mod error;
pub mod memory;
pub mod remote;

pub use envelope::{Envelope, PaginationMeta};
pub use error::StoreError;
pub use memory::{Failure, MemoryStore, StoreOp};
pub use remote::{
    Anonymous, BearerToken, CredentialProvider, Method, RemoteStore, StoreRequest, Transport,
    TransportResponse,
};

use crate::pagination::{FetchParams, PageResult};
use crate::record::{GroupKey, Record, RecordId, RecordKind};
use crate::reorder::ReorderBatch;
use serde_json::Value;

/// Typed access to one collection on the record store
///
/// Implementations are stateless from the caller's point of view and safe to
/// call for different groups while another call is outstanding.
pub trait RecordStore {
    /// Collection this store serves
    fn kind(&self) -> RecordKind;

    /// Server-side paginated listing, optionally filtered by group
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the request fails or the response is unusable.
    fn list(
        &self,
        group: Option<&GroupKey>,
        page: usize,
        page_size: usize,
    ) -> Result<PageResult, StoreError>;

    /// Server-side substring search
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the request fails or the response is unusable.
    fn search(&self, text: &str, page: usize, page_size: usize)
    -> Result<PageResult, StoreError>;

    /// Create a record from a form payload
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the service refuses the payload.
    fn create(&self, payload: &Value) -> Result<Record, StoreError>;

    /// Update a record from a form payload
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for unknown ids, or any other failure.
    fn update(&self, id: &RecordId, payload: &Value) -> Result<Record, StoreError>;

    /// Delete a record
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for unknown ids, or any other failure.
    fn delete(&self, id: &RecordId) -> Result<(), StoreError>;

    /// Apply a reorder batch atomically: all moves or none
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the batch does not match the
    /// service's view of the group, or any other failure.
    fn reorder(&self, batch: &ReorderBatch) -> Result<(), StoreError>;

    /// Run `list` or `search` depending on the parameters
    ///
    /// # Errors
    ///
    /// Propagates the underlying `list`/`search` error.
    fn fetch(&self, params: &FetchParams) -> Result<PageResult, StoreError> {
        match params {
            FetchParams::Browse {
                group,
                page,
                page_size,
            } => self.list(group.as_ref(), *page, *page_size),
            FetchParams::Search {
                text,
                page,
                page_size,
            } => self.search(text, *page, *page_size),
        }
    }
}
