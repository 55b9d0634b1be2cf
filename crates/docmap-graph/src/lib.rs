//! docmap layout engine
//!
//! Positions for a map of interlinked documents, kept stable across rescans.
//! This crate owns layout, position persistence, diffing, enter/exit
//! animation and search matching. It does no scanning, no parsing and no
//! drawing: snapshots come in from a [`DocumentSource`], render state goes out
//! as [`RenderNode`]s and [`RenderEdge`]s.
//!
//! ## Modules
//!
//! - [`layout`]: force-directed and layered layout, component tiling
//! - [`position_store`]: position cache keyed by graph identity
//! - [`diff`]: added / removed / unchanged classification
//! - [`animation`]: timelines, frame scheduling, the animation controller
//! - [`search`]: query matching
//! - [`placement`]: neighbour-proximity placement of new nodes
//! - [`session`]: one open view, tying the above together
//!
//! ## Threading
//!
//! Everything runs on the host thread. The only thread this crate spawns is
//! the optional [`IntervalTicker`], and it only sends tick messages.

pub mod animation;
pub mod config;
pub mod diff;
pub mod error;
pub mod layout;
pub mod placement;
pub mod position_store;
pub mod search;
pub mod session;
pub mod spatial;
pub mod view;

pub use animation::{
    AnimationController, FrameHandle, FrameScheduler, IntervalTicker, ManualFrameScheduler,
    TickStatus, Timeline, TimelineKind,
};
pub use config::{
    AnimationSettings, GraphSettings, LayoutSettings, PlacementSettings, ViewportSettings,
};
pub use diff::{diff, diff_nodes, DiffResult};
pub use error::{GraphError, Result};
pub use layout::{LayoutAlgorithm, LayoutDirection, LayoutEngine, Positions};
pub use position_store::{PositionStore, SharedPositionStore};
pub use search::{SearchIndex, SearchQuery};
pub use session::{DocumentSource, GraphSession, RebuildReport, RestoreTier};
pub use view::{EdgeEmphasis, NodePhase, RenderEdge, RenderNode};

// Boundary types, so hosts only need one import
pub use docmap_types;
