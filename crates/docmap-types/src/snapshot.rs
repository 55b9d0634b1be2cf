//! Graph snapshots - one immutable scan result.

use crate::edge::GraphEdge;
use crate::node::GraphNode;
use std::collections::{HashMap, HashSet};

/// Node set + edge set produced by one scan.
///
/// Construction enforces the snapshot invariants:
/// - node ids are unique (first occurrence wins, later duplicates are dropped)
/// - every edge references two nodes of this snapshot (others are dropped)
///
/// Neither is an error: a bad edge never fails a rebuild.
#[derive(Debug, Clone)]
pub struct GraphSnapshot<P> {
    nodes: Vec<GraphNode<P>>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
}

impl<P> Default for GraphSnapshot<P> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<P> GraphSnapshot<P> {
    pub fn new(nodes: Vec<GraphNode<P>>, edges: Vec<GraphEdge>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut kept = Vec::with_capacity(nodes.len());

        for node in nodes {
            if index.contains_key(&node.id) {
                tracing::warn!(node = %node.id, "duplicate node id in snapshot, keeping first");
                continue;
            }
            index.insert(node.id.clone(), kept.len());
            kept.push(node);
        }

        let mut seen = HashSet::with_capacity(edges.len());
        let mut valid_edges = Vec::with_capacity(edges.len());
        for edge in edges {
            if !index.contains_key(&edge.source) || !index.contains_key(&edge.target) {
                tracing::debug!(
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge with missing endpoint"
                );
                continue;
            }
            if seen.insert((edge.source.clone(), edge.target.clone(), edge.kind)) {
                valid_edges.push(edge);
            }
        }

        Self {
            nodes: kept,
            edges: valid_edges,
            index,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode<P>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode<P>> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Position of `id` in [`Self::nodes`]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of nodes connected to `id` by an edge in either direction.
    pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(|edge| !edge.is_self_loop())
            .filter_map(move |edge| edge.other_end(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str) -> GraphNode<()> {
        GraphNode::document(id, ())
    }

    #[test]
    fn drops_edges_with_missing_endpoints() {
        let snapshot = GraphSnapshot::new(
            vec![node("a"), node("b")],
            vec![
                GraphEdge::internal("a", "b"),
                GraphEdge::internal("a", "ghost"),
                GraphEdge::internal("ghost", "b"),
            ],
        );
        assert_eq!(snapshot.edges(), &[GraphEdge::internal("a", "b")]);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let snapshot = GraphSnapshot::new(
            vec![node("a"), node("a").with_position((9.0, 9.0)), node("b")],
            vec![],
        );
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.node("a").unwrap().position.x, 0.0);
        assert_eq!(snapshot.index_of("b"), Some(1));
    }

    #[test]
    fn parallel_duplicate_edges_collapse() {
        let snapshot = GraphSnapshot::new(
            vec![node("a"), node("b")],
            vec![GraphEdge::internal("a", "b"), GraphEdge::internal("a", "b")],
        );
        assert_eq!(snapshot.edges().len(), 1);
    }

    #[test]
    fn neighbors_skip_self_loops() {
        let snapshot = GraphSnapshot::new(
            vec![node("a"), node("b"), node("c")],
            vec![
                GraphEdge::internal("a", "a"),
                GraphEdge::internal("a", "b"),
                GraphEdge::internal("c", "a"),
            ],
        );
        let neighbors: Vec<_> = snapshot.neighbors("a").collect();
        assert_eq!(neighbors, vec!["b", "c"]);
    }

    #[test]
    fn empty_snapshot() {
        let snapshot: GraphSnapshot<()> = GraphSnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.edges().is_empty());
    }
}
