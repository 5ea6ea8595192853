//! Client-side view over the backend's history list.
//!
//! The list is fetched once when the History page is bound; filtering is a
//! linear scan over that in-memory copy on every keystroke.

use crate::api::HistoryEntry;

/// Type-filter value that matches every entry.
pub const ALL_TYPES: &str = "all";

/// Known entry types, in the order the filter dropdown lists them.
pub const ENTRY_TYPES: [(&str, &str); 3] = [
    ("code_analysis", "Code Analysis"),
    ("screenshot", "Screenshot"),
    ("audio", "Audio"),
];

/// Search text plus optional exact type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub search: String,
    /// `None` matches every type.
    pub kind: Option<String>,
}

impl HistoryFilter {
    /// Build from raw form values; an empty or `all` type disables the type
    /// filter.
    pub fn new(search: &str, kind: &str) -> Self {
        let kind = kind.trim();
        Self {
            search: search.to_string(),
            kind: (!kind.is_empty() && kind != ALL_TYPES).then(|| kind.to_string()),
        }
    }

    /// Case-insensitive substring match on the query and exact match on type.
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        let needle = self.search.trim().to_lowercase();
        let query_ok = needle.is_empty() || entry.query.to_lowercase().contains(&needle);
        let kind_ok = self.kind.as_deref().is_none_or(|k| entry.kind == k);
        query_ok && kind_ok
    }

    /// Value for the type dropdown.
    pub fn kind_value(&self) -> &str {
        self.kind.as_deref().unwrap_or(ALL_TYPES)
    }
}

/// Apply `filter` to `entries`, preserving order.
pub fn filter_entries<'a>(entries: &'a [HistoryEntry], filter: &HistoryFilter) -> Vec<&'a HistoryEntry> {
    entries.iter().filter(|e| filter.matches(e)).collect()
}

/// Fetched history plus the active filter.
#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntry>,
    pub filter: HistoryFilter,
    /// Set when the last fetch failed.
    pub load_error: Option<String>,
}

impl HistoryView {
    pub fn loaded(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries;
        self.load_error = None;
    }

    pub fn failed(&mut self, message: String) {
        self.entries.clear();
        self.load_error = Some(message);
    }

    pub fn visible(&self) -> Vec<&HistoryEntry> {
        filter_entries(&self.entries, &self.filter)
    }

    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, kind: &str, query: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            kind: kind.to_string(),
            query: query.to_string(),
            timestamp: None,
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let entries = vec![entry("1", "code_analysis", "Fix Bug in parser")];
        let hits = filter_entries(&entries, &HistoryFilter::new("bug", ALL_TYPES));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn all_and_empty_type_disable_type_filter() {
        assert!(HistoryFilter::new("", "all").kind.is_none());
        assert!(HistoryFilter::new("", "  ").kind.is_none());
        assert_eq!(HistoryFilter::new("", "audio").kind_value(), "audio");
    }

    #[test]
    fn view_tracks_load_errors() {
        let mut view = HistoryView::default();
        view.loaded(vec![entry("1", "audio", "standup")]);
        assert_eq!(view.find("1").map(|e| e.query.as_str()), Some("standup"));

        view.failed("HTTP Error 500".to_string());
        assert!(view.entries.is_empty());
        assert_eq!(view.load_error.as_deref(), Some("HTTP Error 500"));
    }
}
