//! Node diffing between two rebuilds.
//!
//! Classifies ids only; positions are somebody else's business. Output keeps
//! input order (added/unchanged in the new order, removed in the previous
//! order) so the animation order is stable.

use docmap_types::GraphNode;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl DiffResult {
    /// Nothing entered and nothing left
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn is_added(&self, id: &str) -> bool {
        self.added.iter().any(|a| a == id)
    }

    pub fn is_removed(&self, id: &str) -> bool {
        self.removed.iter().any(|r| r == id)
    }
}

/// Diff two id sequences. Duplicate ids count once.
pub fn diff<'a, 'b>(
    previous: impl IntoIterator<Item = &'a str>,
    new: impl IntoIterator<Item = &'b str>,
) -> DiffResult {
    let previous: Vec<&str> = previous.into_iter().collect();
    let new: Vec<&str> = new.into_iter().collect();
    let previous_set: HashSet<&str> = previous.iter().copied().collect();
    let new_set: HashSet<&str> = new.iter().copied().collect();

    let mut result = DiffResult::default();
    let mut seen = HashSet::with_capacity(new.len());
    for id in new {
        if !seen.insert(id) {
            continue;
        }
        if previous_set.contains(id) {
            result.unchanged.push(id.to_string());
        } else {
            result.added.push(id.to_string());
        }
    }

    let mut seen = HashSet::with_capacity(previous.len());
    for id in previous {
        if seen.insert(id) && !new_set.contains(id) {
            result.removed.push(id.to_string());
        }
    }

    tracing::debug!(
        added = result.added.len(),
        removed = result.removed.len(),
        unchanged = result.unchanged.len(),
        "node diff"
    );
    result
}

/// Diff two node lists by id.
pub fn diff_nodes<P, Q>(previous: &[GraphNode<P>], new: &[GraphNode<Q>]) -> DiffResult {
    diff(
        previous.iter().map(|n| n.id.as_str()),
        new.iter().map(|n| n.id.as_str()),
    )
}
