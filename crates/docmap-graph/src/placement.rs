//! Neighbour-proximity placement for nodes that have no cached or carried-over
//! position.
//!
//! A new node lands at a random offset around the centroid of its already
//! positioned neighbours. Nodes without any positioned neighbour go near the
//! viewport centre. Placement repeats until nothing changes, so a node whose
//! only neighbour was itself just placed still ends up beside it.
//!
//! Every placed node is nudged outward (bounded attempts) until its rectangle
//! stops overlapping anything already on the canvas, using an R-tree of the
//! occupied rectangles.

use crate::config::PlacementSettings;
use crate::layout::geometry::{centroid, node_rect};
use crate::layout::Positions;
use crate::spatial::RectIndex;
use docmap_types::{GraphSnapshot, NodeKind};
use egui::{Pos2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Gap kept between a placed node and its neighbours' rectangles
const CLEARANCE: f32 = 8.0;

/// RNG for placement: fixed seed when configured, entropy otherwise.
pub fn placement_rng(settings: &PlacementSettings) -> StdRng {
    match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub struct Placer<'a, R> {
    settings: &'a PlacementSettings,
    center: Pos2,
    rng: &'a mut R,
}

impl<'a, R: Rng> Placer<'a, R> {
    pub fn new(settings: &'a PlacementSettings, center: Pos2, rng: &'a mut R) -> Self {
        Self {
            settings,
            center,
            rng,
        }
    }

    /// Give every id in `pending` a position in `positioned`.
    ///
    /// `pending` is processed in order; returns the ids in the order they
    /// were placed.
    pub fn place<P>(
        &mut self,
        snapshot: &GraphSnapshot<P>,
        positioned: &mut Positions,
        pending: &[String],
    ) -> Vec<String> {
        let kind_of = |id: &str| snapshot.node(id).map(|n| n.kind).unwrap_or_default();

        let mut occupancy = RectIndex::from_rects(
            positioned
                .iter()
                .map(|(id, &p)| (id.clone(), node_rect(p, kind_of(id)))),
        );

        let mut remaining: Vec<&String> = pending
            .iter()
            .filter(|id| !positioned.contains_key(id.as_str()))
            .collect();
        let mut placed = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            // Neighbour-anchored nodes first, repeatedly
            let mut progress = true;
            while progress {
                progress = false;
                let mut still_waiting = Vec::with_capacity(remaining.len());
                for id in remaining {
                    let anchor = centroid(
                        snapshot
                            .neighbors(id)
                            .filter_map(|n| positioned.get(n).copied()),
                    );
                    match anchor {
                        Some(anchor) => {
                            let distance = self.settings.neighbor_offset
                                + self.rng.gen::<f32>() * self.settings.jitter;
                            let pos = self.settle(anchor, distance, kind_of(id), &occupancy);
                            occupancy.insert(id.clone(), node_rect(pos, kind_of(id)));
                            positioned.insert(id.clone(), pos);
                            placed.push(id.clone());
                            progress = true;
                        }
                        None => still_waiting.push(id),
                    }
                }
                remaining = still_waiting;
            }

            // Then one orphan at the centre, which may anchor the rest
            if let Some((id, rest)) = remaining.split_first() {
                let distance = self.rng.gen::<f32>() * self.settings.jitter;
                let pos = self.settle(self.center, distance, kind_of(id), &occupancy);
                occupancy.insert((*id).clone(), node_rect(pos, kind_of(id)));
                positioned.insert((*id).clone(), pos);
                placed.push((*id).clone());
                remaining = rest.to_vec();
            }
        }

        tracing::debug!(placed = placed.len(), "placed new nodes");
        placed
    }

    /// Random point `distance` away from `anchor`, pushed outward until free.
    fn settle(&mut self, anchor: Pos2, distance: f32, kind: NodeKind, occupancy: &RectIndex<String>) -> Pos2 {
        let direction = Vec2::angled(self.rng.gen::<f32>() * TAU);
        let mut pos = anchor + direction * distance;

        let size = kind.size();
        let step = size.width.max(size.height) / 2.0;
        for _ in 0..self.settings.max_nudge_attempts {
            if !occupancy.overlaps(node_rect(pos, kind).expand(CLEARANCE / 2.0)) {
                break;
            }
            pos += direction * step;
        }
        pos
    }
}
