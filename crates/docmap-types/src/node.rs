//! Graph nodes and their size classes.

use serde::{Deserialize, Serialize};

// ============================================================================
// POINT
// ============================================================================

/// A position on the (unbounded) diagram plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// NODE KIND / SIZE CLASS
// ============================================================================

/// Fixed width/height of a node, used for collision and placement math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f32,
    pub height: f32,
}

/// What a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A markdown document inside the scanned root
    #[default]
    Document,
    /// All outbound links to one domain, aggregated into a single node
    ExternalLink,
}

impl NodeKind {
    /// Size class for this kind. Documents carry a title and stats line,
    /// external links only a domain.
    pub fn size(&self) -> NodeSize {
        match self {
            NodeKind::Document => NodeSize {
                width: 180.0,
                height: 64.0,
            },
            NodeKind::ExternalLink => NodeSize {
                width: 140.0,
                height: 40.0,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::ExternalLink => "external_link",
        }
    }
}

// ============================================================================
// GRAPH NODE
// ============================================================================

/// One node of a document map.
///
/// `P` is the display payload (title, stats, broken links, ...). The engine
/// never inspects it except through [`crate::NodeAttributes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode<P> {
    /// Stable identity: relative document path, or link domain for
    /// aggregated external-link nodes
    pub id: String,
    pub kind: NodeKind,
    /// Current position. Scanners emit [`Point::ORIGIN`]; the engine
    /// resolves the real value.
    #[serde(default)]
    pub position: Point,
    pub payload: P,
}

impl<P> GraphNode<P> {
    pub fn new(id: impl Into<String>, kind: NodeKind, payload: P) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Point::ORIGIN,
            payload,
        }
    }

    /// Convenience constructor for a document node.
    pub fn document(id: impl Into<String>, payload: P) -> Self {
        Self::new(id, NodeKind::Document, payload)
    }

    /// Convenience constructor for an aggregated external-link node.
    pub fn external(domain: impl Into<String>, payload: P) -> Self {
        Self::new(domain, NodeKind::ExternalLink, payload)
    }

    /// Builder: set position
    pub fn with_position(mut self, position: impl Into<Point>) -> Self {
        self.position = position.into();
        self
    }

    pub fn size(&self) -> NodeSize {
        self.kind.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_nodes_are_larger_than_link_nodes() {
        let doc = NodeKind::Document.size();
        let link = NodeKind::ExternalLink.size();
        assert!(doc.width > link.width);
        assert!(doc.height > link.height);
    }

    #[test]
    fn builder_sets_position() {
        let node = GraphNode::document("notes/a.md", ()).with_position((3.0, 4.0));
        assert_eq!(node.position, Point::new(3.0, 4.0));
        assert_eq!(node.position.distance(Point::ORIGIN), 5.0);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&NodeKind::ExternalLink).unwrap();
        assert_eq!(json, "\"external_link\"");
    }
}
