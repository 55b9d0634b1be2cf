//! Render-facing output of a session.
//!
//! The renderer never sees `GraphNode` directly; it gets [`RenderNode`]s with
//! resolved geometry and style state plus [`RenderEdge`]s with emphasis.

use crate::layout::geometry::to_point;
use docmap_types::{EdgeKind, GraphEdge, GraphNode, NodeKind};
use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Where a node is in its animation lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePhase {
    /// At rest, full opacity
    #[default]
    Settled,
    /// Fading and scaling in
    Entering,
    /// Fading out; removed once the exit animation completes
    Exiting,
    /// Travelling between two layouts
    Moving,
}

/// One node as the renderer should draw it this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode<P> {
    pub id: String,
    pub kind: NodeKind,
    pub position: Pos2,
    /// 0.0 = invisible, 1.0 = fully visible
    pub opacity: f32,
    pub scale: f32,
    pub phase: NodePhase,
    /// A non-empty search query is in effect
    pub search_active: bool,
    /// Node matches the query (always true when no query is active)
    pub search_match: bool,
    pub selected: bool,
    pub payload: P,
}

impl<P> RenderNode<P> {
    /// Settled node at `position`
    pub fn settled(node: GraphNode<P>, position: Pos2) -> Self {
        Self {
            id: node.id,
            kind: node.kind,
            position,
            opacity: 1.0,
            scale: 1.0,
            phase: NodePhase::Settled,
            search_active: false,
            search_match: true,
            selected: false,
            payload: node.payload,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase == NodePhase::Settled
    }

    /// Back to rest: full opacity and scale, phase cleared
    pub fn settle(&mut self) {
        self.opacity = 1.0;
        self.scale = 1.0;
        self.phase = NodePhase::Settled;
    }

    /// Dimmed by an active search that this node does not match
    pub fn is_dimmed(&self) -> bool {
        self.search_active && !self.search_match
    }
}

impl<P: Clone> RenderNode<P> {
    /// Boundary node carrying the current position
    pub fn to_graph_node(&self) -> GraphNode<P> {
        GraphNode::new(self.id.clone(), self.kind, self.payload.clone())
            .with_position(to_point(self.position))
    }
}

/// Visual weight of an edge relative to the active node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeEmphasis {
    /// No active node
    #[default]
    Normal,
    /// Touches the active node
    Highlighted,
    /// An active node exists and this edge does not touch it
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub emphasis: EdgeEmphasis,
    /// Eligible for a flowing/animated stroke
    pub animated: bool,
}

impl RenderEdge {
    /// Style one edge against the active node and the settled state of its
    /// endpoints.
    pub fn styled(edge: &GraphEdge, active: Option<&str>, endpoints_settled: bool) -> Self {
        let emphasis = match active {
            None => EdgeEmphasis::Normal,
            Some(id) if edge.touches(id) => EdgeEmphasis::Highlighted,
            Some(_) => EdgeEmphasis::Muted,
        };
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind,
            emphasis,
            animated: edge.kind == EdgeKind::Internal
                && emphasis == EdgeEmphasis::Highlighted
                && endpoints_settled,
        }
    }
}
