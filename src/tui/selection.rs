//! Current-entity tracking and pane focus.

use crate::model::MetricRecord;

/// Pane that receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Items,
    Detail,
}

/// Keeps the selection stable across refreshes.
///
/// Returns `previous` if it is still among `records`, otherwise the first
/// record's key, or an empty string when there are no records.
pub fn resolve_after_refresh(records: &[MetricRecord], previous: &str) -> String {
    if !previous.is_empty() && records.iter().any(|r| r.key() == previous) {
        return previous.to_string();
    }
    records.first().map(MetricRecord::key).unwrap_or_default()
}

/// Which entity drives the graph pane and which pane owns the keyboard.
#[derive(Debug, Default)]
pub struct SelectionController {
    current: String,
    focus: Focus,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the current entity (see [`MetricRecord::key`]); empty before
    /// the first data arrives.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Re-resolves the selection against a fresh snapshot. Returns true when
    /// the current entity changed.
    pub fn refresh(&mut self, records: &[MetricRecord]) -> bool {
        let next = resolve_after_refresh(records, &self.current);
        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// Follows the list cursor after it moved.
    pub fn cursor_moved(&mut self, row_key: Option<&str>) -> bool {
        let next = row_key.unwrap_or_default();
        if next == self.current {
            return false;
        }
        self.current = next.to_string();
        true
    }

    /// Moves focus to the detail pane. Only valid with a current entity and a
    /// successfully fetched manifest; returns whether focus moved.
    pub fn enter_detail(&mut self, manifest_loaded: bool) -> bool {
        if self.current.is_empty() || !manifest_loaded {
            return false;
        }
        self.focus = Focus::Detail;
        true
    }

    /// Returns focus to the list. Always valid.
    pub fn exit_detail(&mut self) {
        self.focus = Focus::Items;
    }
}
