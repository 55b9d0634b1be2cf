//! Barnes-Hut quadtree for approximate n-body repulsion.
//!
//! Cells live in a flat arena. Each cell tracks the number of bodies below it
//! and their summed position, so the centre of mass is `weighted / mass`.
//! A distant cell whose apparent size (`width / distance`) is below the
//! opening angle θ acts as a single body; anything closer is opened.

use super::geometry::GOLDEN_ANGLE;
use egui::{Pos2, Rect, Vec2};

/// Recursion cap; bodies sharing a cell past this depth stay in one leaf
const MAX_DEPTH: usize = 20;

/// Closest distance used in the force law, keeps near-coincident pairs finite
const MIN_DISTANCE: f32 = 10.0;

#[derive(Debug, Clone)]
struct Cell {
    center: Pos2,
    half: f32,
    mass: f32,
    weighted: Vec2,
    children: Option<[usize; 4]>,
    bodies: Vec<usize>,
}

impl Cell {
    fn new(center: Pos2, half: f32) -> Self {
        Self {
            center,
            half,
            mass: 0.0,
            weighted: Vec2::ZERO,
            children: None,
            bodies: Vec::new(),
        }
    }

    fn quadrant(&self, p: Pos2) -> usize {
        let east = usize::from(p.x >= self.center.x);
        let south = usize::from(p.y >= self.center.y);
        east | (south << 1)
    }

    fn contains(&self, p: Pos2) -> bool {
        Rect::from_center_size(self.center, Vec2::splat(self.half * 2.0)).contains(p)
    }
}

/// Quadtree over one set of points, rebuilt every simulation step.
#[derive(Debug, Clone)]
pub struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    pub fn build(points: &[Pos2]) -> Self {
        let bounds = points
            .iter()
            .fold(None::<Rect>, |acc, &p| match acc {
                Some(r) => Some(r.union(Rect::from_min_max(p, p))),
                None => Some(Rect::from_min_max(p, p)),
            })
            .unwrap_or(Rect::ZERO);
        let half = (bounds.width().max(bounds.height()) / 2.0).max(1.0) + 1.0;

        let mut tree = Self {
            cells: vec![Cell::new(bounds.center(), half)],
        };
        for body in 0..points.len() {
            tree.insert(0, body, points, 0);
        }
        tree
    }

    fn insert(&mut self, cell: usize, body: usize, points: &[Pos2], depth: usize) {
        let p = points[body];
        self.cells[cell].mass += 1.0;
        self.cells[cell].weighted += p.to_vec2();

        if let Some(children) = self.cells[cell].children {
            let q = self.cells[cell].quadrant(p);
            self.insert(children[q], body, points, depth + 1);
            return;
        }

        let coincident = self.cells[cell].bodies.iter().all(|&b| points[b] == p);
        if self.cells[cell].bodies.is_empty() || coincident || depth >= MAX_DEPTH {
            self.cells[cell].bodies.push(body);
            return;
        }

        let children = self.subdivide(cell);
        let existing = std::mem::take(&mut self.cells[cell].bodies);
        for other in existing.into_iter().chain(std::iter::once(body)) {
            let q = self.cells[cell].quadrant(points[other]);
            self.insert(children[q], other, points, depth + 1);
        }
    }

    fn subdivide(&mut self, cell: usize) -> [usize; 4] {
        let Cell { center, half, .. } = self.cells[cell];
        let quarter = half / 2.0;
        let first = self.cells.len();
        for q in 0..4 {
            let dx = if q & 1 == 1 { quarter } else { -quarter };
            let dy = if q & 2 == 2 { quarter } else { -quarter };
            self.cells.push(Cell::new(center + Vec2::new(dx, dy), quarter));
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.cells[cell].children = Some(children);
        children
    }

    /// Total repulsive force acting on `body`.
    ///
    /// Force law is `strength * mass / distance²`, pointing away from the
    /// source. A cell that contains the body itself is always opened.
    pub fn repulsion(&self, body: usize, points: &[Pos2], theta: f32, strength: f32) -> Vec2 {
        let p = points[body];
        let mut force = Vec2::ZERO;
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if cell.mass == 0.0 {
                continue;
            }

            match cell.children {
                None => {
                    for &other in &cell.bodies {
                        if other != body {
                            force += pair_force(body, other, p, points[other], 1.0, strength);
                        }
                    }
                }
                Some(children) => {
                    let com = (cell.weighted / cell.mass).to_pos2();
                    let distance = (p - com).length();
                    let far = distance > 0.0 && (cell.half * 2.0) / distance < theta;
                    if far && !cell.contains(p) {
                        force += pair_force(body, usize::MAX, p, com, cell.mass, strength);
                    } else {
                        stack.extend(children);
                    }
                }
            }
        }
        force
    }
}

fn pair_force(body: usize, other: usize, p: Pos2, q: Pos2, mass: f32, strength: f32) -> Vec2 {
    let delta = p - q;
    let length = delta.length();
    let direction = if length > f32::EPSILON {
        delta / length
    } else {
        // Coincident: split along a fixed per-pair angle, opposite for each side
        let (lo, hi) = (body.min(other), body.max(other));
        let dir = Vec2::angled((lo.wrapping_mul(31).wrapping_add(hi) % 1024) as f32 * GOLDEN_ANGLE);
        if body == lo {
            dir
        } else {
            -dir
        }
    };
    let distance = length.max(MIN_DISTANCE);
    direction * (strength * mass / (distance * distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(body: usize, points: &[Pos2], strength: f32) -> Vec2 {
        (0..points.len())
            .filter(|&o| o != body)
            .map(|o| pair_force(body, o, points[body], points[o], 1.0, strength))
            .fold(Vec2::ZERO, |a, b| a + b)
    }

    #[test]
    fn tiny_theta_matches_exact_sum() {
        let points: Vec<Pos2> = (0..30)
            .map(|i| {
                let i = i as f32;
                Pos2::new((i * 37.0) % 400.0, (i * 91.0) % 300.0)
            })
            .collect();
        let tree = QuadTree::build(&points);
        for body in [0, 7, 29] {
            let approx = tree.repulsion(body, &points, 1e-6, 1000.0);
            let exact = exact(body, &points, 1000.0);
            assert!((approx - exact).length() < 1e-3, "{approx:?} vs {exact:?}");
        }
    }

    #[test]
    fn approximation_stays_close() {
        let points: Vec<Pos2> = (0..200)
            .map(|i| {
                let i = i as f32;
                Pos2::new((i * 53.0) % 1000.0, (i * 17.0) % 700.0)
            })
            .collect();
        let tree = QuadTree::build(&points);
        let approx = tree.repulsion(3, &points, 0.9, 1000.0);
        let exact = exact(3, &points, 1000.0);
        assert!((approx - exact).length() <= exact.length() * 0.4 + 0.05);
    }

    #[test]
    fn coincident_bodies_push_apart() {
        let points = vec![Pos2::new(5.0, 5.0), Pos2::new(5.0, 5.0)];
        let tree = QuadTree::build(&points);
        let a = tree.repulsion(0, &points, 0.9, 100.0);
        let b = tree.repulsion(1, &points, 0.9, 100.0);
        assert!(a.length() > 0.0);
        assert!((a + b).length() < 1e-4);
    }

    #[test]
    fn single_body_feels_nothing() {
        let points = vec![Pos2::new(1.0, 2.0)];
        let tree = QuadTree::build(&points);
        assert_eq!(tree.repulsion(0, &points, 0.9, 100.0), Vec2::ZERO);
    }
}
