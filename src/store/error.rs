//! Record store error types
//!
//! Errors raised while talking to the collection service. They are grouped
//! by how the browser recovers from them:
//!
//! - **`Transport`** / **`Status`**: transient; previous state is kept and a
//!   notification is shown, nothing is retried
//! - **`Rejected`**: the service answered with `success: false`
//! - **`Conflict`**: the service refused a mutation because its view of the
//!   data differs (e.g. a reorder batch against a group that changed)
//! - **`NotFound`**, **`Malformed`**, **`Decode`**, **`Credentials`**:
//!   request or payload problems

use thiserror::Error;

/// Errors returned by a `RecordStore`
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("Server responded with status {code}: {message}")]
    Status { code: u16, message: String },

    /// Response envelope carried `success: false`
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The service refused a mutation against changed data
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// Target record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record in the response could not be interpreted
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// Response body was not a valid envelope
    #[error("Error while decoding response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The credential provider could not supply credentials
    #[error("Credentials unavailable: {0}")]
    Credentials(String),
}

impl StoreError {
    /// Whether the service rejected the request because of concurrent change
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether the failure is a network/server hiccup rather than a bad request
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
