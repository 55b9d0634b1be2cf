//! Precomputed frame sequences.
//!
//! A [`Timeline`] is a finite list of frame-sets; the last one is always the
//! destination state. Interpolation uses `t = i / (len - 1)` so the first
//! frame is exactly the start state and the last exactly the end state.

use super::easing::{ease_in_cubic, ease_in_out_cubic, ease_out_cubic, lerp};
use egui::Pos2;
use std::collections::HashMap;

/// Scale an entering node starts from (and an exiting node shrinks to)
pub const COLLAPSED_SCALE: f32 = 0.5;

/// Per-node display state for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeFrame {
    pub position: Pos2,
    pub opacity: f32,
    pub scale: f32,
}

impl NodeFrame {
    pub fn at_rest(position: Pos2) -> Self {
        Self {
            position,
            opacity: 1.0,
            scale: 1.0,
        }
    }
}

/// Frame for every animated node, keyed by node id
pub type FrameSet = HashMap<String, NodeFrame>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineKind {
    Entering,
    Exiting,
    Transition,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    kind: TimelineKind,
    frames: Vec<FrameSet>,
}

impl Timeline {
    /// Fade in (opacity 0 → 1) and grow (scale 0.5 → 1), eased out.
    pub fn entering(nodes: impl IntoIterator<Item = (String, Pos2)>, frames: usize) -> Self {
        Self::build(TimelineKind::Entering, nodes, frames, |position, t| {
            let e = ease_out_cubic(t);
            NodeFrame {
                position,
                opacity: e,
                scale: lerp(COLLAPSED_SCALE, 1.0, e),
            }
        })
    }

    /// Fade out (opacity 1 → 0) and shrink (scale 1 → 0.5), eased in.
    pub fn exiting(nodes: impl IntoIterator<Item = (String, Pos2)>, frames: usize) -> Self {
        Self::build(TimelineKind::Exiting, nodes, frames, |position, t| {
            let e = ease_in_cubic(t);
            NodeFrame {
                position,
                opacity: 1.0 - e,
                scale: lerp(1.0, COLLAPSED_SCALE, e),
            }
        })
    }

    /// Move each node from its start to its end position, eased in-out.
    pub fn transition(
        moves: impl IntoIterator<Item = (String, Pos2, Pos2)>,
        frames: usize,
    ) -> Self {
        let moves: Vec<(String, Pos2, Pos2)> = moves.into_iter().collect();
        let len = frames.max(2);
        let frames = (0..len)
            .map(|i| {
                let t = ease_in_out_cubic(i as f32 / (len - 1) as f32);
                moves
                    .iter()
                    .map(|(id, from, to)| (id.clone(), NodeFrame::at_rest(from.lerp(*to, t))))
                    .collect()
            })
            .collect();
        Self {
            kind: TimelineKind::Transition,
            frames,
        }
    }

    fn build(
        kind: TimelineKind,
        nodes: impl IntoIterator<Item = (String, Pos2)>,
        frames: usize,
        frame_at: impl Fn(Pos2, f32) -> NodeFrame,
    ) -> Self {
        let nodes: Vec<(String, Pos2)> = nodes.into_iter().collect();
        let len = frames.max(2);
        let frames = (0..len)
            .map(|i| {
                let t = i as f32 / (len - 1) as f32;
                nodes
                    .iter()
                    .map(|(id, position)| (id.clone(), frame_at(*position, t)))
                    .collect()
            })
            .collect();
        Self { kind, frames }
    }

    pub fn kind(&self) -> TimelineKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&FrameSet> {
        self.frames.get(index)
    }

    /// Destination state
    pub fn last(&self) -> Option<&FrameSet> {
        self.frames.last()
    }

    /// Does the timeline animate any node?
    pub fn has_nodes(&self) -> bool {
        self.frames.first().is_some_and(|f| !f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(id: &str) -> Vec<(String, Pos2)> {
        vec![(id.to_string(), Pos2::new(10.0, 20.0))]
    }

    #[test]
    fn entering_goes_from_invisible_to_visible() {
        let timeline = Timeline::entering(one("d"), 15);
        assert_eq!(timeline.len(), 15);
        assert_eq!(timeline.kind(), TimelineKind::Entering);

        let first = timeline.frame(0).unwrap()["d"];
        assert_eq!(first.opacity, 0.0);
        assert_eq!(first.scale, 0.5);

        let last = timeline.last().unwrap()["d"];
        assert_eq!(last.opacity, 1.0);
        assert_eq!(last.scale, 1.0);
        assert_eq!(last.position, Pos2::new(10.0, 20.0));
    }

    #[test]
    fn exiting_mirrors_entering() {
        let timeline = Timeline::exiting(one("a"), 10);
        assert_eq!(timeline.len(), 10);

        let first = timeline.frame(0).unwrap()["a"];
        assert_eq!((first.opacity, first.scale), (1.0, 1.0));
        let last = timeline.last().unwrap()["a"];
        assert_eq!((last.opacity, last.scale), (0.0, 0.5));
    }

    #[test]
    fn opacity_is_monotonic() {
        let timeline = Timeline::entering(one("d"), 15);
        let opacities: Vec<f32> = (0..timeline.len())
            .map(|i| timeline.frame(i).unwrap()["d"].opacity)
            .collect();
        assert!(opacities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn transition_ends_on_target() {
        let timeline = Timeline::transition(
            [("a".to_string(), Pos2::new(0.0, 0.0), Pos2::new(100.0, 50.0))],
            20,
        );
        assert_eq!(timeline.len(), 20);
        assert_eq!(timeline.frame(0).unwrap()["a"].position, Pos2::new(0.0, 0.0));
        assert_eq!(timeline.last().unwrap()["a"].position, Pos2::new(100.0, 50.0));
        assert_eq!(timeline.frame(10).unwrap()["a"].opacity, 1.0);
    }

    #[test]
    fn frame_count_never_below_two() {
        let timeline = Timeline::entering(one("d"), 0);
        assert_eq!(timeline.len(), 2);
        assert!(timeline.has_nodes());
        assert!(!Timeline::entering(Vec::new(), 5).has_nodes());
    }
}
