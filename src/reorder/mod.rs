//! Reorder engine
//!
//! Drag-and-drop reordering of records within a group. Moves are applied
//! locally first, persisted as a single `ReorderBatch` covering the whole
//! group, and rolled back to a shadow snapshot if the record store refuses
//! or fails.

pub mod engine;
pub mod error;
pub mod state;

pub use engine::ReorderEngine;
pub use error::ReorderError;
pub use state::{Move, ReorderBatch, ReorderOutcome, ReorderState, SubmittedBatch};
