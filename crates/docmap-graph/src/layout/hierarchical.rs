//! Layered (Sugiyama-style) layout
//!
//! 1. Cycle breaking: DFS in node order, back-edges are ignored
//! 2. Ranking: longest path from a source
//! 3. Ordering: barycenter sweeps down then up, with dummy nodes standing in
//!    for edges that span more than one rank. The ordering with the fewest
//!    crossings between adjacent ranks wins.
//! 4. Coordinates: rank on the main axis, order on the cross axis, every rank
//!    centred on zero.

use super::{LayoutDirection, LayoutGraph, Layouter};
use crate::config::LayoutSettings;
use egui::Pos2;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct HierarchicalLayout {
    settings: LayoutSettings,
}

impl Default for HierarchicalLayout {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl HierarchicalLayout {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }
}

// =============================================================================
// RANKING
// =============================================================================

/// Edges that survive cycle breaking, in their original order.
pub fn acyclic_edges(graph: &LayoutGraph) -> Vec<(usize, usize)> {
    let n = graph.len();
    let mut outgoing: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (edge, &(a, b)) in graph.edges.iter().enumerate() {
        outgoing[a].push((edge, b));
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut mark = vec![Mark::Unvisited; n];
    let mut back = vec![false; graph.edges.len()];

    for root in 0..n {
        if mark[root] != Mark::Unvisited {
            continue;
        }
        // (node, next outgoing edge to look at)
        let mut stack = vec![(root, 0usize)];
        mark[root] = Mark::OnStack;
        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            top.1 += 1;
            if let Some(&(edge, next)) = outgoing[node].get(cursor) {
                match mark[next] {
                    Mark::OnStack => back[edge] = true,
                    Mark::Unvisited => {
                        mark[next] = Mark::OnStack;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                mark[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    graph
        .edges
        .iter()
        .zip(back)
        .filter(|(_, is_back)| !is_back)
        .map(|(&edge, _)| edge)
        .collect()
}

/// Longest-path rank per node after cycle breaking.
pub fn assign_ranks(graph: &LayoutGraph) -> Vec<usize> {
    ranks_for(graph.len(), &acyclic_edges(graph))
}

fn ranks_for(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indegree = vec![0usize; n];
    let mut outgoing = vec![Vec::new(); n];
    for &(a, b) in edges {
        indegree[b] += 1;
        outgoing[a].push(b);
    }

    let mut rank = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &next in &outgoing[node] {
            rank[next] = rank[next].max(rank[node] + 1);
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    rank
}

// =============================================================================
// ORDERING
// =============================================================================

/// Ranked graph with dummy nodes, so every segment joins adjacent ranks.
#[derive(Debug)]
struct Layered {
    /// Real nodes are `0..real`, dummies follow
    real: usize,
    rank: Vec<usize>,
    layers: Vec<Vec<usize>>,
    /// Segments from rank r to rank r + 1
    up: Vec<Vec<usize>>,
    down: Vec<Vec<usize>>,
}

impl Layered {
    fn build(n: usize, edges: &[(usize, usize)], mut rank: Vec<usize>) -> Self {
        let mut segments = Vec::new();
        for &(a, b) in edges {
            let (from, to) = (rank[a], rank[b]);
            let mut previous = a;
            for r in from + 1..to {
                let dummy = rank.len();
                rank.push(r);
                segments.push((previous, dummy));
                previous = dummy;
            }
            segments.push((previous, b));
        }

        let total = rank.len();
        let depth = rank.iter().copied().max().map_or(0, |r| r + 1);
        let mut layers = vec![Vec::new(); depth];
        for (node, &r) in rank.iter().enumerate() {
            layers[r].push(node);
        }

        let mut up = vec![Vec::new(); total];
        let mut down = vec![Vec::new(); total];
        for (a, b) in segments {
            down[a].push(b);
            up[b].push(a);
        }

        Self {
            real: n,
            rank,
            layers,
            up,
            down,
        }
    }

    fn order_index(&self) -> Vec<usize> {
        let mut index = vec![0usize; self.rank.len()];
        for layer in &self.layers {
            for (i, &node) in layer.iter().enumerate() {
                index[node] = i;
            }
        }
        index
    }

    /// Reorder one layer by the mean order of its neighbours in the adjacent
    /// layer. Nodes without neighbours keep their current slot as key.
    fn sweep_layer(&mut self, layer: usize, use_up: bool) {
        let index = self.order_index();
        let neighbours = if use_up { &self.up } else { &self.down };
        let mut keyed: Vec<(f32, usize)> = self.layers[layer]
            .iter()
            .map(|&node| {
                let adjacent = &neighbours[node];
                let key = if adjacent.is_empty() {
                    index[node] as f32
                } else {
                    adjacent.iter().map(|&m| index[m] as f32).sum::<f32>() / adjacent.len() as f32
                };
                (key, node)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.layers[layer] = keyed.into_iter().map(|(_, node)| node).collect();
    }

    fn crossings(&self) -> usize {
        let index = self.order_index();
        let mut total = 0;
        for layer in &self.layers {
            let segments: Vec<(usize, usize)> = layer
                .iter()
                .flat_map(|&a| self.down[a].iter().map(move |&b| (a, b)))
                .map(|(a, b)| (index[a], index[b]))
                .collect();
            for (i, &(a1, b1)) in segments.iter().enumerate() {
                for &(a2, b2) in &segments[i + 1..] {
                    if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                        total += 1;
                    }
                }
            }
        }
        total
    }

    fn minimize_crossings(&mut self, passes: usize) {
        let mut best = self.layers.clone();
        let mut best_crossings = self.crossings();

        for _ in 0..passes {
            if best_crossings == 0 {
                break;
            }
            for layer in 1..self.layers.len() {
                self.sweep_layer(layer, true);
            }
            for layer in (0..self.layers.len().saturating_sub(1)).rev() {
                self.sweep_layer(layer, false);
            }

            let crossings = self.crossings();
            if crossings < best_crossings {
                best_crossings = crossings;
                best = self.layers.clone();
            }
        }

        tracing::trace!(crossings = best_crossings, "layer ordering chosen");
        self.layers = best;
    }
}

// =============================================================================
// COORDINATES
// =============================================================================

impl Layouter for HierarchicalLayout {
    fn layout_component(&self, graph: &LayoutGraph, _seeds: &[Option<Pos2>]) -> Vec<Pos2> {
        let s = &self.settings;
        let n = graph.len();
        if n == 0 {
            return Vec::new();
        }

        let edges = acyclic_edges(graph);
        let rank = ranks_for(n, &edges);
        let mut layered = Layered::build(n, &edges, rank);
        layered.minimize_crossings(s.crossing_passes);

        let top_down = s.direction == LayoutDirection::TopDown;
        // (main, cross) extents of a real node
        let extent = |node: usize| {
            let size = graph.kinds[node].size();
            if top_down {
                (size.height, size.width)
            } else {
                (size.width, size.height)
            }
        };
        let rank_step = s.rank_spacing
            + (0..n).map(|node| extent(node).0).fold(0.0_f32, f32::max);

        let mut positions = vec![Pos2::ZERO; n];
        for (r, layer) in layered.layers.iter().enumerate() {
            let widths: Vec<f32> = layer
                .iter()
                .map(|&node| if node < layered.real { extent(node).1 } else { 0.0 })
                .collect();
            let span = widths.iter().sum::<f32>()
                + s.node_spacing * layer.len().saturating_sub(1) as f32;

            let main = r as f32 * rank_step;
            let mut cursor = -span / 2.0;
            for (&node, width) in layer.iter().zip(widths) {
                let cross = cursor + width / 2.0;
                cursor += width + s.node_spacing;
                if node < layered.real {
                    positions[node] = if top_down {
                        Pos2::new(cross, main)
                    } else {
                        Pos2::new(main, cross)
                    };
                }
            }
        }
        positions
    }
}
