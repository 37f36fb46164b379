//! Autosuggestion
//!
//! Field-level suggestions for the search box, computed from the records
//! already loaded (normally the current page). This under-reports matches
//! that live on other pages; callers holding a full local cache can pass
//! that instead.

pub mod panel;

pub use panel::{PanelAction, PanelKey, SuggestionPanel};

use crate::record::{FieldKind, Record, RecordId};
use std::collections::HashSet;

/// Default cap on the number of suggestions
pub const DEFAULT_MAX_SUGGESTIONS: usize = 8;

/// One row of the suggestion panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
    pub field_kind: FieldKind,
    /// Full value of the matching field
    pub matched_text: String,
    pub source_record_id: RecordId,
}

/// Case-insensitive substring matches of `query` across `fields`
///
/// Records are visited in order and fields in declaration order. Results are
/// unique by `(field_kind, matched_text)` (first occurrence wins) and capped
/// at `max_results`. A blank query yields nothing; any other query is matched
/// as typed, surrounding spaces included.
#[must_use]
pub fn compute_suggestions(
    records: &[Record],
    fields: &[FieldKind],
    query: &str,
    max_results: usize,
) -> Vec<SuggestionItem> {
    if query.trim().is_empty() || max_results == 0 {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let mut seen: HashSet<(&FieldKind, &str)> = HashSet::new();
    let mut suggestions = Vec::new();

    for record in records {
        for field in fields {
            let Some(text) = record.field(field) else {
                continue;
            };
            if !text.to_lowercase().contains(&needle) || !seen.insert((field, text)) {
                continue;
            }

            suggestions.push(SuggestionItem {
                field_kind: field.clone(),
                matched_text: text.to_string(),
                source_record_id: record.id.clone(),
            });
            if suggestions.len() == max_results {
                return suggestions;
            }
        }
    }

    suggestions
}
