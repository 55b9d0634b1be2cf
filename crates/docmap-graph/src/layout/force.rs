//! Force-directed layout
//!
//! Nodes repel each other (Barnes-Hut approximated), edges act as springs and
//! a weak gravity keeps the component compact. The simulation runs for a fixed
//! iteration budget with a cooling step cap, stopping early once it settles.
//! A final collision pass pushes apart any node rectangles that still overlap.
//!
//! Starting positions come from a golden-angle spiral unless seeds are given,
//! so the same input always yields the same output.

use super::geometry::{centroid, separate_overlaps, GOLDEN_ANGLE};
use super::quadtree::QuadTree;
use super::{LayoutGraph, Layouter};
use crate::config::LayoutSettings;
use egui::{Pos2, Vec2};

/// Floor on the step cap as the simulation cools
const MIN_COOLING: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct ForceLayout {
    settings: LayoutSettings,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl ForceLayout {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    /// Sunflower spiral around `origin`, denser near the centre.
    fn spiral(&self, i: usize, origin: Pos2) -> Pos2 {
        let radius = self.settings.spring_length * 0.5 * (i as f32 + 0.5).sqrt();
        origin + Vec2::angled(i as f32 * GOLDEN_ANGLE) * radius
    }

    fn initial_positions(&self, count: usize, seeds: &[Option<Pos2>]) -> Vec<Pos2> {
        let origin = centroid(seeds.iter().flatten().copied()).unwrap_or(Pos2::ZERO);
        (0..count)
            .map(|i| {
                seeds
                    .get(i)
                    .copied()
                    .flatten()
                    .unwrap_or_else(|| self.spiral(i, origin))
            })
            .collect()
    }

    /// Run the simulation from the given starting positions.
    pub fn simulate(&self, graph: &LayoutGraph, mut positions: Vec<Pos2>) -> Vec<Pos2> {
        let s = &self.settings;
        let n = positions.len();
        if n < 2 {
            return positions;
        }

        let mut velocities = vec![Vec2::ZERO; n];
        let mut forces = vec![Vec2::ZERO; n];

        for iteration in 0..s.iterations {
            // Repulsion
            let tree = QuadTree::build(&positions);
            for (i, force) in forces.iter_mut().enumerate() {
                *force = tree.repulsion(i, &positions, s.theta, s.repulsion);
            }

            // Springs
            for &(a, b) in &graph.edges {
                let delta = positions[b] - positions[a];
                let distance = delta.length().max(0.01);
                let pull = delta / distance * (s.spring_strength * (distance - s.spring_length));
                forces[a] += pull;
                forces[b] -= pull;
            }

            // Gravity
            if let Some(center) = centroid(positions.iter().copied()) {
                for (force, &p) in forces.iter_mut().zip(&positions) {
                    *force += (center - p) * s.gravity;
                }
            }

            let cooling = (1.0 - iteration as f32 / s.iterations as f32).max(MIN_COOLING);
            let cap = s.max_displacement * cooling;
            let mut total = 0.0;
            for i in 0..n {
                let mut v = (velocities[i] + forces[i]) * s.damping;
                let speed = v.length();
                if speed > cap {
                    v *= cap / speed;
                }
                velocities[i] = v;
                positions[i] += v;
                total += v.length();
            }

            if total < s.convergence_threshold {
                tracing::debug!(iteration, total, "force layout converged");
                break;
            }
        }

        positions
    }
}

impl Layouter for ForceLayout {
    fn layout_component(&self, graph: &LayoutGraph, seeds: &[Option<Pos2>]) -> Vec<Pos2> {
        let start = self.initial_positions(graph.len(), seeds);
        let mut positions = self.simulate(graph, start);
        separate_overlaps(
            &mut positions,
            &graph.kinds,
            self.settings.node_spacing / 2.0,
            self.settings.collision_passes,
        );
        positions
    }
}
