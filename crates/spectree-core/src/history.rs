//! Asset history: a DAG of every transformation an asset's content has gone
//! through (spec.md Section 3 invariant: "Emitted Assets preserve history:
//! every transformation appends a new history entry whose parents include
//! the pre-transformation entry.")

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One node in an asset's history DAG.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub parents: Vec<Arc<HistoryEntry>>,
}

impl HistoryEntry {
    /// A root entry with no parents — the asset's point of origin.
    pub fn origin(url: impl Into<String>, timestamp: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            timestamp,
            parents: Vec::new(),
        })
    }

    /// Appends a new entry whose sole parent is `self`.
    pub fn child(self: &Arc<Self>, url: impl Into<String>, timestamp: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            timestamp,
            parents: vec![Arc::clone(self)],
        })
    }

    /// Appends a new entry with multiple parents (e.g. a task that merges
    /// several inputs into one output).
    pub fn merge(
        url: impl Into<String>,
        timestamp: DateTime<Utc>,
        parents: Vec<Arc<HistoryEntry>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            timestamp,
            parents,
        })
    }

    /// Depth-first count of all ancestor entries (including self), for
    /// tests and diagnostics; a DAG may revisit shared ancestors so this is
    /// an upper bound, not a distinct-node count.
    pub fn ancestor_count(&self) -> usize {
        1 + self
            .parents
            .iter()
            .map(|p| p.ancestor_count())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_has_no_parents() {
        let origin = HistoryEntry::origin("ib://leaf/a", Utc::now());
        assert!(origin.parents.is_empty());
        assert_eq!(origin.ancestor_count(), 1);
    }

    #[test]
    fn child_links_back_to_parent() {
        let origin = HistoryEntry::origin("ib://leaf/a", Utc::now());
        let next = origin.child("ib://leaf/@emit/a", Utc::now());
        assert_eq!(next.parents.len(), 1);
        assert_eq!(next.parents[0].url, origin.url);
        assert_eq!(next.ancestor_count(), 2);
    }

    #[test]
    fn merge_keeps_all_parents() {
        let a = HistoryEntry::origin("ib://s/a", Utc::now());
        let b = HistoryEntry::origin("ib://s/b", Utc::now());
        let merged = HistoryEntry::merge("ib://s/ab", Utc::now(), vec![a, b]);
        assert_eq!(merged.parents.len(), 2);
    }
}
