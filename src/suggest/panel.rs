//! Suggestion panel state and keyboard handling
//!
//! `selected` is `None` when no row is highlighted (the default). Arrow
//! keys move within `[None, len-1]` and stop at both ends.

use super::{SuggestionItem, compute_suggestions};
use crate::record::{FieldKind, Record};

/// Keys the panel reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// What the host should do after a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    /// Nothing beyond redrawing
    None,
    /// Use the highlighted suggestion's text as the query
    Commit(String),
    /// Submit the typed text as-is
    Submit(String),
    /// Panel closed, query untouched
    Closed,
}

/// Suggestion list bound to a search box
#[derive(Debug, Clone)]
pub struct SuggestionPanel {
    fields: Vec<FieldKind>,
    max_results: usize,
    input: String,
    items: Vec<SuggestionItem>,
    selected: Option<usize>,
    open: bool,
}

impl SuggestionPanel {
    #[must_use]
    pub fn new(fields: Vec<FieldKind>, max_results: usize) -> Self {
        Self {
            fields,
            max_results,
            input: String::new(),
            items: Vec::new(),
            selected: None,
            open: false,
        }
    }

    /// Recompute suggestions for new input; opens the panel when there are any
    pub fn update(&mut self, records: &[Record], input: &str) {
        input.clone_into(&mut self.input);
        self.items = compute_suggestions(records, &self.fields, input, self.max_results);
        self.selected = None;
        self.open = !self.items.is_empty();
    }

    /// Recompute against new records without touching the input
    pub fn refresh(&mut self, records: &[Record]) {
        let input = std::mem::take(&mut self.input);
        let was_open = self.open;
        self.update(records, &input);
        self.open &= was_open;
    }

    #[must_use]
    pub fn items(&self) -> &[SuggestionItem] {
        &self.items
    }

    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selected row as a signed index, -1 when nothing is highlighted
    #[must_use]
    pub fn selected_index(&self) -> isize {
        self.selected
            .and_then(|i| isize::try_from(i).ok())
            .unwrap_or(-1)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
        self.selected = None;
    }

    /// Click outside the search box and panel
    pub fn click_outside(&mut self) -> PanelAction {
        if self.open {
            self.close();
            PanelAction::Closed
        } else {
            PanelAction::None
        }
    }

    pub fn handle_key(&mut self, key: PanelKey) -> PanelAction {
        match key {
            PanelKey::Down if self.open => {
                let last = self.items.len().saturating_sub(1);
                self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
                PanelAction::None
            }
            PanelKey::Up if self.open => {
                self.selected = self.selected.and_then(|i| i.checked_sub(1));
                PanelAction::None
            }
            PanelKey::Up | PanelKey::Down => PanelAction::None,
            PanelKey::Enter => {
                let chosen = if self.open {
                    self.selected.and_then(|i| self.items.get(i))
                } else {
                    None
                };
                let action = match chosen {
                    Some(item) => PanelAction::Commit(item.matched_text.clone()),
                    None => PanelAction::Submit(self.input.clone()),
                };
                self.close();
                action
            }
            PanelKey::Escape => {
                if self.open {
                    self.close();
                    PanelAction::Closed
                } else {
                    PanelAction::None
                }
            }
        }
    }
}
