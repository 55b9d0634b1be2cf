//! Shared Graph Types for docmap
//!
//! This crate is the contract between the three parties that touch a document
//! map: the scanner that produces nodes and edges, the layout engine
//! (`docmap-graph`) and the renderer that draws the result.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────┐  GraphSnapshot  ┌──────────────┐  RenderNode/Edge  ┌──────────────┐
//! │  Scanner     │ ──────────────► │  Engine      │ ────────────────► │  Renderer    │
//! │  (fs + md)   │  ScanProgress   │  (layout)    │ ◄──────────────── │  (canvas)    │
//! └──────────────┘                 └──────────────┘   drag-stop       └──────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **No egui dependency** - positions travel as [`Point`], the engine
//!    converts to its own geometry types
//! 2. **String IDs** - node ids are relative paths or link domains
//! 3. **Opaque payloads** - display attributes ride along in a generic slot;
//!    the engine only reads them through [`NodeAttributes`]

pub mod edge;
pub mod graph_id;
pub mod node;
pub mod payload;
pub mod progress;
pub mod snapshot;

pub use edge::{EdgeKind, GraphEdge};
pub use graph_id::GraphId;
pub use node::{GraphNode, NodeKind, NodeSize, Point};
pub use payload::{DocumentPayload, NodeAttributes};
pub use progress::{ScanPhase, ScanProgress};
pub use snapshot::GraphSnapshot;
