//! Position cache keyed by graph identity.
//!
//! ```text
//! GraphId ──► node id ──► Pos2
//! ```
//!
//! The store is the only long-lived mutable state of the engine. It holds
//! positions and nothing else: opacity, scale, search flags and the rest of
//! the render state never reach it. Entries are created on first save,
//! overwritten on later saves and only go away through [`PositionStore::clear`]
//! or [`PositionStore::forget_all`].
//!
//! Hosts that want positions to survive a restart can export the store with
//! [`PositionStore::to_json`] and feed it back through
//! [`PositionStore::from_json`]; the engine itself never touches the disk.

use crate::error::{GraphError, Result};
use crate::layout::geometry::{to_point, PointExt};
use docmap_types::{GraphId, GraphNode};
use egui::Pos2;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Version written by [`PositionStore::to_json`]
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Store shared between every session of one process.
pub type SharedPositionStore = Rc<RefCell<PositionStore>>;

#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    graphs: HashMap<GraphId, HashMap<String, Pos2>>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// New store wrapped for sharing
    pub fn shared() -> SharedPositionStore {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Record the position of every node. Existing entries for other nodes
    /// of the same graph are kept.
    pub fn save<P>(&mut self, graph: &GraphId, nodes: &[GraphNode<P>]) {
        self.save_positions(
            graph,
            nodes.iter().map(|n| (n.id.clone(), n.position.to_pos2())),
        );
    }

    /// Record a batch of `(node id, position)` pairs.
    pub fn save_positions<I, S>(&mut self, graph: &GraphId, positions: I)
    where
        I: IntoIterator<Item = (S, Pos2)>,
        S: Into<String>,
    {
        let entry = self.graphs.entry(graph.clone()).or_default();
        let before = entry.len();
        for (id, pos) in positions {
            entry.insert(id.into(), pos);
        }
        tracing::trace!(graph = %graph, new_entries = entry.len() - before, "positions saved");
    }

    /// Give each node its stored position.
    ///
    /// Nodes with no entry keep whatever position they carry; callers check
    /// [`PositionStore::position`] when they need to know which were hit.
    pub fn restore<P: Clone>(&self, graph: &GraphId, nodes: &[GraphNode<P>]) -> Vec<GraphNode<P>> {
        let saved = self.graphs.get(graph);
        nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                if let Some(&pos) = saved.and_then(|s| s.get(&node.id)) {
                    node.position = to_point(pos);
                }
                node
            })
            .collect()
    }

    pub fn has_saved(&self, graph: &GraphId) -> bool {
        self.graphs.get(graph).is_some_and(|s| !s.is_empty())
    }

    pub fn position(&self, graph: &GraphId, node: &str) -> Option<Pos2> {
        self.graphs.get(graph)?.get(node).copied()
    }

    pub fn clear(&mut self, graph: &GraphId) {
        if self.graphs.remove(graph).is_some() {
            tracing::debug!(graph = %graph, "cleared saved positions");
        }
    }

    pub fn forget_all(&mut self) {
        self.graphs.clear();
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    // =========================================================================
    // EXPORT / IMPORT
    // =========================================================================

    /// Serialise the whole store as a versioned JSON document.
    ///
    /// Graphs and nodes are written in sorted order so the output is stable.
    pub fn to_json(&self) -> Result<String> {
        let document = StoreDocument {
            version: STORE_FORMAT_VERSION,
            graphs: self
                .graphs
                .iter()
                .map(|(graph, nodes)| {
                    let nodes = nodes.iter().map(|(id, &p)| (id.clone(), p)).collect();
                    (graph.as_str().to_string(), nodes)
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: StoreDocument = serde_json::from_str(json)?;
        if document.version != STORE_FORMAT_VERSION {
            return Err(GraphError::UnsupportedStoreVersion {
                found: document.version,
                expected: STORE_FORMAT_VERSION,
            });
        }

        let graphs = document
            .graphs
            .into_iter()
            .map(|(graph, nodes)| (GraphId::from(graph.as_str()), nodes.into_iter().collect()))
            .collect();
        Ok(Self { graphs })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    graphs: BTreeMap<String, BTreeMap<String, Pos2>>,
}
