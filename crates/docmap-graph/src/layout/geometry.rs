//! Geometry helpers shared by both layout algorithms, placement and the
//! session: point conversion, node rectangles, centroids, component tiling
//! and overlap separation.

use crate::spatial::RectIndex;
use docmap_types::{NodeKind, NodeSize, Point};
use egui::{Pos2, Rect, Vec2};
use std::collections::HashMap;

/// Golden angle in radians, used for spiral seeding and tie-breaking
pub const GOLDEN_ANGLE: f32 = 2.399_963;

// =============================================================================
// CONVERSIONS
// =============================================================================

/// Transport point → engine geometry
pub trait PointExt {
    fn to_pos2(self) -> Pos2;
}

impl PointExt for Point {
    fn to_pos2(self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }
}

/// Engine geometry → transport point
pub fn to_point(pos: Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

pub fn size_vec(size: NodeSize) -> Vec2 {
    Vec2::new(size.width, size.height)
}

/// Rectangle a node of `kind` occupies when centred on `center`.
pub fn node_rect(center: Pos2, kind: NodeKind) -> Rect {
    Rect::from_center_size(center, size_vec(kind.size()))
}

/// Mean of a set of points, `None` when empty.
pub fn centroid(points: impl IntoIterator<Item = Pos2>) -> Option<Pos2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for point in points {
        sum += point.to_vec2();
        count += 1;
    }
    (count > 0).then(|| (sum / count as f32).to_pos2())
}

/// Union of the node rectangles of a positioned set.
pub fn bounding_rect(points: &[Pos2], kinds: &[NodeKind]) -> Option<Rect> {
    points
        .iter()
        .zip(kinds)
        .map(|(&p, &kind)| node_rect(p, kind))
        .reduce(|a, b| a.union(b))
}

/// Shift every position so the bounding box of the set is centred on `center`.
pub fn center_on(positions: &mut HashMap<String, Pos2>, kinds: &HashMap<&str, NodeKind>, center: Pos2) {
    let bounds = positions
        .iter()
        .map(|(id, &p)| {
            let kind = kinds.get(id.as_str()).copied().unwrap_or_default();
            node_rect(p, kind)
        })
        .reduce(|a, b| a.union(b));

    let Some(bounds) = bounds else {
        return;
    };
    let shift = center - bounds.center();
    for pos in positions.values_mut() {
        *pos += shift;
    }
}

// =============================================================================
// COMPONENT TILING
// =============================================================================

/// One laid-out connected component, in its own local coordinates.
#[derive(Debug, Clone)]
pub struct ComponentLayout {
    pub ids: Vec<String>,
    pub kinds: Vec<NodeKind>,
    pub positions: Vec<Pos2>,
}

impl ComponentLayout {
    fn bounds(&self) -> Rect {
        bounding_rect(&self.positions, &self.kinds).unwrap_or(Rect::ZERO)
    }
}

/// Pack components into rows ("shelves") so no two overlap.
///
/// Components keep their incoming order, which the caller makes
/// deterministic. Rows are capped at roughly the width of a square holding
/// the total area, but never narrower than the widest component.
pub fn tile_components(components: Vec<ComponentLayout>, gap: f32) -> HashMap<String, Pos2> {
    let bounds: Vec<Rect> = components.iter().map(ComponentLayout::bounds).collect();
    let total_area: f32 = bounds.iter().map(|b| (b.width() + gap) * (b.height() + gap)).sum();
    let widest = bounds.iter().map(Rect::width).fold(0.0_f32, f32::max);
    let row_limit = (total_area.sqrt() * 1.2).max(widest);

    let mut result = HashMap::new();
    let mut cursor = Pos2::ZERO;
    let mut row_height = 0.0_f32;

    for (component, bounds) in components.into_iter().zip(bounds) {
        if cursor.x > 0.0 && cursor.x + bounds.width() > row_limit {
            cursor = Pos2::new(0.0, cursor.y + row_height + gap);
            row_height = 0.0;
        }

        let shift = cursor - bounds.min;
        for (id, pos) in component.ids.into_iter().zip(component.positions) {
            result.insert(id, pos + shift);
        }

        cursor.x += bounds.width() + gap;
        row_height = row_height.max(bounds.height());
    }

    result
}

// =============================================================================
// OVERLAP SEPARATION
// =============================================================================

/// Push apart overlapping node rectangles.
///
/// Each pass finds intersecting pairs through an R-tree and moves both nodes
/// half the overlap along the axis of least penetration. Stops early once a
/// pass finds nothing to fix.
pub fn separate_overlaps(positions: &mut [Pos2], kinds: &[NodeKind], padding: f32, passes: usize) {
    for pass in 0..passes {
        let rects: Vec<Rect> = positions
            .iter()
            .zip(kinds)
            .map(|(&p, &kind)| node_rect(p, kind).expand(padding / 2.0))
            .collect();
        let index = RectIndex::from_rects(rects.iter().copied().enumerate());

        let mut moves = vec![Vec2::ZERO; positions.len()];
        let mut overlaps = 0usize;

        for (i, rect) in rects.iter().enumerate() {
            for j in index.intersecting(*rect) {
                if j <= i {
                    continue;
                }
                let other = rects[j];
                let overlap_x = rect.max.x.min(other.max.x) - rect.min.x.max(other.min.x);
                let overlap_y = rect.max.y.min(other.max.y) - rect.min.y.max(other.min.y);
                if overlap_x <= 0.0 || overlap_y <= 0.0 {
                    continue;
                }
                overlaps += 1;

                let delta = positions[j] - positions[i];
                let push = if overlap_x < overlap_y {
                    let dir = if delta.x != 0.0 { delta.x.signum() } else { tie_break(i, j).x.signum() };
                    Vec2::new(dir * overlap_x / 2.0, 0.0)
                } else {
                    let dir = if delta.y != 0.0 { delta.y.signum() } else { tie_break(i, j).y.signum() };
                    Vec2::new(0.0, dir * overlap_y / 2.0)
                };
                moves[i] -= push;
                moves[j] += push;
            }
        }

        if overlaps == 0 {
            tracing::trace!(pass, "overlap separation settled");
            return;
        }
        for (pos, delta) in positions.iter_mut().zip(moves) {
            *pos += delta;
        }
    }
}

/// Deterministic direction for separating two coincident points.
fn tie_break(i: usize, j: usize) -> Vec2 {
    let dir = Vec2::angled((i * 31 + j) as f32 * GOLDEN_ANGLE);
    Vec2::new(
        if dir.x == 0.0 { 1.0 } else { dir.x },
        if dir.y == 0.0 { 1.0 } else { dir.y },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(std::iter::empty()).is_none());
        let c = centroid([Pos2::new(0.0, 0.0), Pos2::new(10.0, 20.0)]).unwrap();
        assert_eq!(c, Pos2::new(5.0, 10.0));
    }

    #[test]
    fn point_round_trip() {
        let p = Point::new(1.5, -2.0);
        assert_eq!(to_point(p.to_pos2()), p);
    }

    #[test]
    fn tiled_components_do_not_overlap() {
        let component = |prefix: &str| ComponentLayout {
            ids: vec![format!("{prefix}1"), format!("{prefix}2")],
            kinds: vec![NodeKind::Document; 2],
            positions: vec![Pos2::new(0.0, 0.0), Pos2::new(250.0, 0.0)],
        };
        let tiled = tile_components(vec![component("a"), component("b"), component("c")], 80.0);
        assert_eq!(tiled.len(), 6);

        let rects: Vec<Rect> = tiled
            .values()
            .map(|&p| node_rect(p, NodeKind::Document))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn center_on_moves_bounds_center() {
        let mut positions = HashMap::from([
            ("a".to_string(), Pos2::new(0.0, 0.0)),
            ("b".to_string(), Pos2::new(100.0, 0.0)),
        ]);
        let kinds = HashMap::from([("a", NodeKind::Document), ("b", NodeKind::Document)]);
        center_on(&mut positions, &kinds, Pos2::new(500.0, 400.0));
        assert_eq!(positions["a"], Pos2::new(450.0, 400.0));
        assert_eq!(positions["b"], Pos2::new(550.0, 400.0));
    }

    #[test]
    fn separation_resolves_coincident_nodes() {
        let mut positions = vec![Pos2::ZERO, Pos2::ZERO, Pos2::new(5.0, 5.0)];
        let kinds = vec![NodeKind::ExternalLink; 3];
        separate_overlaps(&mut positions, &kinds, 10.0, 50);

        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                let a = node_rect(positions[i], kinds[i]);
                let b = node_rect(positions[j], kinds[j]);
                let overlap_x = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
                let overlap_y = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
                assert!(overlap_x <= 0.01 || overlap_y <= 0.01, "{i} and {j} still overlap");
            }
        }
    }
}
