//! Spatial index over node rectangles
//!
//! Uses an R-tree (via `rstar`) so overlap checks during separation and
//! new-node placement are O(log n) per query instead of a scan over every
//! node.

use egui::{Pos2, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// Spatial index entry: a node rectangle tagged with a caller-chosen key
#[derive(Debug, Clone)]
pub struct RectEntry<K> {
    pub key: K,
    bounds: AABB<[f32; 2]>,
}

impl<K> RectEntry<K> {
    pub fn new(key: K, rect: Rect) -> Self {
        Self {
            key,
            bounds: AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]),
        }
    }
}

impl<K> RTreeObject for RectEntry<K> {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

/// R-tree of node rectangles.
pub struct RectIndex<K> {
    tree: RTree<RectEntry<K>>,
}

impl<K> std::fmt::Debug for RectIndex<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RectIndex")
            .field("count", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl<K> Default for RectIndex<K> {
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl<K: Clone> RectIndex<K> {
    /// Bulk-load an index from `(key, rect)` pairs
    pub fn from_rects(rects: impl IntoIterator<Item = (K, Rect)>) -> Self {
        let entries: Vec<_> = rects
            .into_iter()
            .map(|(key, rect)| RectEntry::new(key, rect))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, key: K, rect: Rect) {
        self.tree.insert(RectEntry::new(key, rect));
    }

    /// Keys of every rectangle whose bounds intersect `rect`
    pub fn intersecting(&self, rect: Rect) -> Vec<K> {
        let query = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Does anything overlap `rect` with positive area?
    ///
    /// Touching edges do not count.
    pub fn overlaps(&self, rect: Rect) -> bool {
        let query = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&query)
            .any(|entry| {
                let lower = entry.bounds.lower();
                let upper = entry.bounds.upper();
                let other = Rect::from_min_max(
                    Pos2::new(lower[0], lower[1]),
                    Pos2::new(upper[0], upper[1]),
                );
                let overlap_x = rect.max.x.min(other.max.x) - rect.min.x.max(other.min.x);
                let overlap_y = rect.max.y.min(other.max.y) - rect.min.y.max(other.min.y);
                overlap_x > 0.0 && overlap_y > 0.0
            })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
