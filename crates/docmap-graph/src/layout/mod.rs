//! Layout engine - positions for a whole snapshot from scratch.
//!
//! Two algorithms sit behind the [`Layouter`] trait:
//! - [`ForceLayout`]: Barnes-Hut force simulation plus a collision pass
//! - [`HierarchicalLayout`]: layered (Sugiyama-style) layout
//!
//! The engine splits the snapshot into connected components, lays each one
//! out on its own, tiles the results so components never overlap and finally
//! centres everything on the viewport. Both algorithms are pure functions of
//! the node and edge lists; nothing here reads or writes the position store.

pub mod force;
pub mod geometry;
pub mod hierarchical;
pub mod quadtree;

pub use force::ForceLayout;
pub use hierarchical::HierarchicalLayout;

use crate::config::{GraphSettings, LayoutSettings, ViewportSettings};
use docmap_types::{GraphSnapshot, NodeKind};
use egui::Pos2;
use geometry::{center_on, tile_components, ComponentLayout};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Resolved positions keyed by node id.
pub type Positions = HashMap<String, Pos2>;

/// Which algorithm computes fresh layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    #[default]
    Force,
    Hierarchical,
}

impl LayoutAlgorithm {
    /// The other algorithm (for a UI toggle)
    pub fn toggled(self) -> Self {
        match self {
            LayoutAlgorithm::Force => LayoutAlgorithm::Hierarchical,
            LayoutAlgorithm::Hierarchical => LayoutAlgorithm::Force,
        }
    }
}

/// Axis carrying the rank in layered layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    /// Ranks grow downwards (y), order runs along x
    #[default]
    TopDown,
    /// Ranks grow rightwards (x), order runs along y
    LeftRight,
}

// =============================================================================
// LAYOUT GRAPH
// =============================================================================

/// Index-based view of one snapshot (or one component of it).
///
/// Edges are directed, de-duplicated and free of self-loops; edge kind does
/// not matter to layout.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    pub ids: Vec<String>,
    pub kinds: Vec<NodeKind>,
    pub edges: Vec<(usize, usize)>,
}

impl LayoutGraph {
    pub fn from_snapshot<P>(snapshot: &GraphSnapshot<P>) -> Self {
        let ids: Vec<String> = snapshot.nodes().iter().map(|n| n.id.clone()).collect();
        let kinds = snapshot.nodes().iter().map(|n| n.kind).collect();

        let mut seen = HashSet::new();
        let edges = snapshot
            .edges()
            .iter()
            .filter(|e| !e.is_self_loop())
            .filter_map(|e| Some((snapshot.index_of(&e.source)?, snapshot.index_of(&e.target)?)))
            .filter(|pair| seen.insert(*pair))
            .collect();

        Self { ids, kinds, edges }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Undirected adjacency lists, neighbours in edge order.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.len()];
        for &(a, b) in &self.edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        adjacency
    }

    /// Split into connected components.
    ///
    /// Components are ordered by their lowest node index and keep the
    /// relative node order of the parent graph.
    pub fn components(&self) -> Vec<LayoutGraph> {
        let adjacency = self.adjacency();
        let mut component_of = vec![usize::MAX; self.len()];
        let mut members: Vec<Vec<usize>> = Vec::new();

        for start in 0..self.len() {
            if component_of[start] != usize::MAX {
                continue;
            }
            let component = members.len();
            let mut nodes = Vec::new();
            let mut queue = VecDeque::from([start]);
            component_of[start] = component;
            while let Some(node) = queue.pop_front() {
                nodes.push(node);
                for &next in &adjacency[node] {
                    if component_of[next] == usize::MAX {
                        component_of[next] = component;
                        queue.push_back(next);
                    }
                }
            }
            nodes.sort_unstable();
            members.push(nodes);
        }

        let mut local = vec![0usize; self.len()];
        let mut graphs: Vec<LayoutGraph> = members
            .iter()
            .map(|nodes| {
                for (i, &node) in nodes.iter().enumerate() {
                    local[node] = i;
                }
                LayoutGraph {
                    ids: nodes.iter().map(|&n| self.ids[n].clone()).collect(),
                    kinds: nodes.iter().map(|&n| self.kinds[n]).collect(),
                    edges: Vec::new(),
                }
            })
            .collect();

        for &(a, b) in &self.edges {
            let component = component_of[a];
            graphs[component].edges.push((local[a], local[b]));
        }
        graphs
    }
}

/// One layout algorithm applied to a single connected component.
pub trait Layouter {
    /// Compute positions in component-local coordinates, one per node, in
    /// `graph.ids` order. `seeds` carries optional starting positions.
    fn layout_component(&self, graph: &LayoutGraph, seeds: &[Option<Pos2>]) -> Vec<Pos2>;
}

// =============================================================================
// ENGINE
// =============================================================================

/// Dispatches to the configured algorithm and assembles the final map.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    settings: LayoutSettings,
    center: Pos2,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::from_settings(&GraphSettings::default())
    }
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings, viewport: &ViewportSettings) -> Self {
        Self {
            settings,
            center: viewport.center(),
        }
    }

    pub fn from_settings(settings: &GraphSettings) -> Self {
        Self::new(settings.layout.clone(), &settings.viewport)
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Fresh layout of the whole snapshot.
    pub fn layout<P>(&self, snapshot: &GraphSnapshot<P>, algorithm: LayoutAlgorithm) -> Positions {
        self.layout_from(snapshot, algorithm, &HashMap::new())
    }

    /// Fresh layout, with the force simulation starting from `seeds` where a
    /// node has one. The layered algorithm ignores seeds.
    pub fn layout_from<P>(
        &self,
        snapshot: &GraphSnapshot<P>,
        algorithm: LayoutAlgorithm,
        seeds: &Positions,
    ) -> Positions {
        let _span = tracing::info_span!("layout", ?algorithm, nodes = snapshot.len()).entered();

        if snapshot.is_empty() {
            return Positions::new();
        }

        let graph = LayoutGraph::from_snapshot(snapshot);
        let components = graph.components();
        tracing::debug!(components = components.len(), edges = graph.edges.len(), "laying out");

        let layouter: Box<dyn Layouter> = match algorithm {
            LayoutAlgorithm::Force => Box::new(ForceLayout::new(self.settings.clone())),
            LayoutAlgorithm::Hierarchical => Box::new(HierarchicalLayout::new(self.settings.clone())),
        };

        let laid_out: Vec<ComponentLayout> = components
            .into_iter()
            .map(|component| {
                let component_seeds: Vec<Option<Pos2>> =
                    component.ids.iter().map(|id| seeds.get(id).copied()).collect();
                let positions = layouter.layout_component(&component, &component_seeds);
                ComponentLayout {
                    ids: component.ids,
                    kinds: component.kinds,
                    positions,
                }
            })
            .collect();

        let mut positions = tile_components(laid_out, self.settings.component_gap);
        let kinds: HashMap<&str, NodeKind> = snapshot
            .nodes()
            .iter()
            .map(|n| (n.id.as_str(), n.kind))
            .collect();
        center_on(&mut positions, &kinds, self.center);
        positions
    }

    /// Rank of every node under the layered algorithm's cycle breaking.
    pub fn hierarchical_ranks<P>(&self, snapshot: &GraphSnapshot<P>) -> HashMap<String, usize> {
        let graph = LayoutGraph::from_snapshot(snapshot);
        let ranks = hierarchical::assign_ranks(&graph);
        graph.ids.into_iter().zip(ranks).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_types::{GraphEdge, GraphNode};

    fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot<()> {
        GraphSnapshot::new(
            ids.iter().map(|id| GraphNode::document(*id, ())).collect(),
            edges
                .iter()
                .map(|(a, b)| GraphEdge::internal(*a, *b))
                .collect(),
        )
    }

    #[test]
    fn empty_snapshot_gives_empty_layout() {
        let engine = LayoutEngine::default();
        let empty = GraphSnapshot::<()>::empty();
        assert!(engine.layout(&empty, LayoutAlgorithm::Force).is_empty());
        assert!(engine.layout(&empty, LayoutAlgorithm::Hierarchical).is_empty());
    }

    #[test]
    fn lone_node_sits_at_viewport_center() {
        let engine = LayoutEngine::default();
        let snap = snapshot(&["a"], &[]);
        for algorithm in [LayoutAlgorithm::Force, LayoutAlgorithm::Hierarchical] {
            let positions = engine.layout(&snap, algorithm);
            let p = positions["a"];
            assert!((p.x - 600.0).abs() < 0.01 && (p.y - 400.0).abs() < 0.01, "{p:?}");
        }
    }

    #[test]
    fn components_split_and_keep_order() {
        let snap = snapshot(&["a", "b", "c", "d", "e"], &[("a", "c"), ("b", "d"), ("d", "b")]);
        let graph = LayoutGraph::from_snapshot(&snap);
        let components = graph.components();
        let ids: Vec<Vec<&str>> = components
            .iter()
            .map(|c| c.ids.iter().map(String::as_str).collect())
            .collect();
        assert_eq!(ids, vec![vec!["a", "c"], vec!["b", "d"], vec!["e"]]);
        assert_eq!(components[1].edges, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn self_loops_ignored_by_layout_graph() {
        let snap = snapshot(&["a", "b"], &[("a", "a"), ("a", "b")]);
        let graph = LayoutGraph::from_snapshot(&snap);
        assert_eq!(graph.edges, vec![(0, 1)]);
    }

    #[test]
    fn every_node_gets_a_position() {
        let engine = LayoutEngine::default();
        let snap = snapshot(
            &["a", "b", "c", "x", "y"],
            &[("a", "b"), ("b", "c"), ("x", "y")],
        );
        for algorithm in [LayoutAlgorithm::Force, LayoutAlgorithm::Hierarchical] {
            let positions = engine.layout(&snap, algorithm);
            assert_eq!(positions.len(), 5);
            assert!(positions.values().all(|p| p.x.is_finite() && p.y.is_finite()));
        }
    }

    #[test]
    fn seeded_layout_is_deterministic() {
        let engine = LayoutEngine::default();
        let snap = snapshot(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let seeds: Positions = [
            ("a".to_string(), Pos2::new(-200.0, 0.0)),
            ("c".to_string(), Pos2::new(150.0, 90.0)),
        ]
        .into_iter()
        .collect();

        let first = engine.layout_from(&snap, LayoutAlgorithm::Force, &seeds);
        let second = engine.layout_from(&snap, LayoutAlgorithm::Force, &seeds);
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);

        // layered layout does not look at seeds
        assert_eq!(
            engine.layout_from(&snap, LayoutAlgorithm::Hierarchical, &seeds),
            engine.layout(&snap, LayoutAlgorithm::Hierarchical)
        );
    }

    #[test]
    fn algorithm_toggle() {
        assert_eq!(LayoutAlgorithm::Force.toggled(), LayoutAlgorithm::Hierarchical);
        assert_eq!(LayoutAlgorithm::Hierarchical.toggled(), LayoutAlgorithm::Force);
    }
}
