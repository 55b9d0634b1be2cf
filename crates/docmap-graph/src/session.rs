//! One open graph view.
//!
//! # Rebuild pipeline
//!
//! ```text
//! snapshot ──► interrupt animation ──► diff vs. live list
//!          ──► resolve positions (cache > carryover > fresh layout)
//!          ──► place new nodes ──► exit removed ──► enter added ──► save
//! ```
//!
//! Position priority, highest first:
//! 1. **Cache**: the shared [`PositionStore`] has entries for this graph
//! 2. **Carryover**: not the first load and a previous live list exists;
//!    unchanged nodes keep their last rendered position
//! 3. **Fresh**: full layout from scratch
//!
//! Anything tiers 1 and 2 leave unresolved goes through neighbour-proximity
//! placement. Positions are written back to the store after a fresh layout,
//! a drag, an animation completing and a layout-algorithm switch.
//!
//! [`PositionStore`]: crate::position_store::PositionStore

use crate::animation::{AnimationController, CompletionFn, FrameScheduler, TickStatus};
use crate::config::GraphSettings;
use crate::diff::{diff, DiffResult};
use crate::error::Result;
use crate::layout::{LayoutAlgorithm, LayoutEngine, Positions};
use crate::placement::{placement_rng, Placer};
use crate::position_store::SharedPositionStore;
use crate::search::SearchIndex;
use crate::view::{NodePhase, RenderEdge, RenderNode};
use docmap_types::{GraphId, GraphSnapshot, NodeAttributes, ScanProgress};
use egui::Pos2;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Supplies a fresh snapshot when the document set changes.
pub trait DocumentSource<P> {
    fn snapshot(&mut self) -> GraphSnapshot<P>;
}

impl<P, F> DocumentSource<P> for F
where
    F: FnMut() -> GraphSnapshot<P>,
{
    fn snapshot(&mut self) -> GraphSnapshot<P> {
        self()
    }
}

/// Which restoration tier resolved positions on a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreTier {
    Cache,
    Carryover,
    Fresh,
}

/// What one rebuild decided.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    pub tier: RestoreTier,
    pub diff: DiffResult,
    /// Nodes placed by the neighbour heuristic, in placement order
    pub placed: Vec<String>,
    /// An exit or enter timeline was started
    pub animated: bool,
}

pub struct GraphSession<P> {
    graph_id: GraphId,
    store: SharedPositionStore,
    settings: GraphSettings,
    engine: LayoutEngine,
    algorithm: LayoutAlgorithm,
    animation: AnimationController<P>,
    rng: StdRng,

    snapshot: GraphSnapshot<P>,
    live: Vec<RenderNode<P>>,
    first_load: bool,

    search: SearchIndex,
    active: Option<String>,
    focus: Option<String>,
    scan_progress: Option<ScanProgress>,
}

impl<P> std::fmt::Debug for GraphSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSession")
            .field("graph_id", &self.graph_id)
            .field("algorithm", &self.algorithm)
            .field("nodes", &self.live.len())
            .field("first_load", &self.first_load)
            .field("animation", &self.animation)
            .finish_non_exhaustive()
    }
}

impl<P> GraphSession<P>
where
    P: NodeAttributes + Clone + 'static,
{
    /// Open a view of `graph_id`. Settings are validated.
    pub fn new(
        graph_id: GraphId,
        store: SharedPositionStore,
        settings: GraphSettings,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Result<Self> {
        settings.validate()?;
        let engine = LayoutEngine::from_settings(&settings);
        let animation = AnimationController::new(scheduler, settings.animation.clone());
        let rng = placement_rng(&settings.placement);

        Ok(Self {
            graph_id,
            store,
            algorithm: settings.layout.algorithm,
            engine,
            animation,
            rng,
            settings,
            snapshot: GraphSnapshot::empty(),
            live: Vec::new(),
            first_load: true,
            search: SearchIndex::default(),
            active: None,
            focus: None,
            scan_progress: None,
        })
    }

    pub fn graph_id(&self) -> &GraphId {
        &self.graph_id
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn algorithm(&self) -> LayoutAlgorithm {
        self.algorithm
    }

    pub fn store(&self) -> &SharedPositionStore {
        &self.store
    }

    pub fn snapshot(&self) -> &GraphSnapshot<P> {
        &self.snapshot
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_animating()
    }

    pub fn active_node(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn scan_progress(&self) -> Option<&ScanProgress> {
        self.scan_progress.as_ref()
    }

    // =========================================================================
    // REBUILD
    // =========================================================================

    /// Pull a snapshot from `source` and rebuild.
    pub fn rescan(&mut self, source: &mut impl DocumentSource<P>) -> RebuildReport {
        let snapshot = source.snapshot();
        self.rebuild(snapshot)
    }

    /// Replace the displayed graph with `snapshot`.
    pub fn rebuild(&mut self, snapshot: GraphSnapshot<P>) -> RebuildReport {
        let _span = tracing::info_span!("rebuild", graph = %self.graph_id, nodes = snapshot.len())
            .entered();

        if self.animation.interrupt(&mut self.live) {
            // Settled positions of the cut-short animation are the new baseline
            save_live(&self.store, &self.graph_id, &self.live);
            tracing::debug!("rebuild interrupted running animation");
        }
        self.scan_progress = None;

        let diff = diff(
            self.live.iter().map(|n| n.id.as_str()),
            snapshot.nodes().iter().map(|n| n.id.as_str()),
        );

        let (tier, mut positions) = self.resolve_positions(&snapshot, &diff);
        tracing::debug!(?tier, resolved = positions.len(), "positions resolved");

        let pending: Vec<String> = snapshot
            .nodes()
            .iter()
            .filter(|n| !positions.contains_key(&n.id))
            .map(|n| n.id.clone())
            .collect();
        let placed = Placer::new(&self.settings.placement, self.settings.viewport.center(), &mut self.rng)
            .place(&snapshot, &mut positions, &pending);

        if tier == RestoreTier::Fresh {
            self.store
                .borrow_mut()
                .save_positions(&self.graph_id, positions.iter().map(|(id, &p)| (id.clone(), p)));
        }

        let animated = self.swap_in(&snapshot, &positions, &diff);

        // Placed nodes must reach the store even when no animation will save them
        if tier != RestoreTier::Fresh && !placed.is_empty() && !animated {
            self.store
                .borrow_mut()
                .save_positions(&self.graph_id, positions.iter().map(|(id, &p)| (id.clone(), p)));
        }

        if let Some(focus) = self.focus.as_ref().filter(|f| snapshot.contains(f)) {
            self.active = Some(focus.clone());
        } else if self.active.as_ref().is_some_and(|a| !snapshot.contains(a)) {
            self.active = None;
        }

        self.snapshot = snapshot;
        self.first_load = false;
        self.refresh_styles();

        RebuildReport {
            tier,
            diff,
            placed,
            animated,
        }
    }

    fn resolve_positions(&self, snapshot: &GraphSnapshot<P>, diff: &DiffResult) -> (RestoreTier, Positions) {
        let store = self.store.borrow();

        let (tier, positions) = if store.has_saved(&self.graph_id) {
            let positions = snapshot
                .nodes()
                .iter()
                .filter_map(|n| Some((n.id.clone(), store.position(&self.graph_id, &n.id)?)))
                .collect();
            (RestoreTier::Cache, positions)
        } else if !self.first_load && !self.live.is_empty() {
            let last: HashMap<&str, Pos2> = self.live.iter().map(|n| (n.id.as_str(), n.position)).collect();
            let positions = diff
                .unchanged
                .iter()
                .filter_map(|id| Some((id.clone(), *last.get(id.as_str())?)))
                .collect();
            (RestoreTier::Carryover, positions)
        } else {
            (RestoreTier::Fresh, Positions::new())
        };

        if tier != RestoreTier::Fresh && !(positions.is_empty() && !snapshot.is_empty()) {
            return (tier, positions);
        }
        if tier != RestoreTier::Fresh {
            tracing::debug!(?tier, "nothing restored, falling back to fresh layout");
        }
        (RestoreTier::Fresh, self.engine.layout(snapshot, self.algorithm))
    }

    /// Install the new live list and start exit/enter animation.
    fn swap_in(&mut self, snapshot: &GraphSnapshot<P>, positions: &Positions, diff: &DiffResult) -> bool {
        let removed: HashSet<&str> = diff.removed.iter().map(String::as_str).collect();
        let added: HashSet<&str> = diff.added.iter().map(String::as_str).collect();

        let ghosts: Vec<RenderNode<P>> = std::mem::take(&mut self.live)
            .into_iter()
            .filter(|n| removed.contains(n.id.as_str()))
            .collect();

        let mut current = Vec::with_capacity(snapshot.len());
        let mut incoming = Vec::new();
        for node in snapshot.nodes() {
            let position = positions
                .get(&node.id)
                .copied()
                .unwrap_or_else(|| self.settings.viewport.center());
            let render = RenderNode::settled(node.clone(), position);
            if added.contains(node.id.as_str()) && !ghosts.is_empty() {
                incoming.push(render);
            } else {
                current.push(render);
            }
        }
        self.live = current;

        if self.first_load || diff.is_noop() {
            return false;
        }

        let on_entered = save_on_complete(Rc::clone(&self.store), self.graph_id.clone());
        if ghosts.is_empty() {
            return self.animation.animate_entering(&mut self.live, &diff.added, on_entered);
        }

        self.live.extend(ghosts);
        let order: HashMap<String, usize> = snapshot
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let added_ids = diff.added.clone();
        let on_exited: CompletionFn<P> = Box::new(move |controller, live| {
            live.extend(incoming);
            live.sort_by_key(|n| order.get(&n.id).copied().unwrap_or(usize::MAX));
            controller.animate_entering(live, &added_ids, on_entered);
        });
        self.animation.animate_exiting(&mut self.live, &diff.removed, on_exited)
    }

    // =========================================================================
    // HOST / RENDERER INPUT
    // =========================================================================

    /// Advance the running animation by one frame.
    pub fn on_frame(&mut self) -> TickStatus {
        let status = self.animation.tick(&mut self.live);
        if status != TickStatus::Idle {
            self.refresh_styles();
        }
        status
    }

    /// The renderer finished dragging nodes; persist the whole live set.
    pub fn on_drag_stop(&mut self, moved: &[(String, Pos2)]) {
        let moved: HashMap<&str, Pos2> = moved.iter().map(|(id, p)| (id.as_str(), *p)).collect();
        for node in self.live.iter_mut() {
            if let Some(&p) = moved.get(node.id.as_str()) {
                node.position = p;
            }
        }
        tracing::debug!(moved = moved.len(), "drag stop");
        save_live(&self.store, &self.graph_id, &self.live);
    }

    pub fn on_scan_progress(&mut self, progress: ScanProgress) {
        tracing::trace!(phase = ?progress.phase, current = progress.current, total = progress.total, "scan progress");
        self.scan_progress = Some(progress);
    }

    /// Switch layout algorithm: lay out afresh and glide every node to its
    /// new position. Saved once the transition completes.
    pub fn set_algorithm(&mut self, algorithm: LayoutAlgorithm) {
        if algorithm == self.algorithm {
            return;
        }
        self.algorithm = algorithm;
        tracing::debug!(?algorithm, "layout algorithm changed");
        if self.snapshot.is_empty() {
            return;
        }

        self.animation.interrupt(&mut self.live);
        // Force layout starts from what is on screen
        let seeds: Positions = self.live.iter().map(|n| (n.id.clone(), n.position)).collect();
        let targets = self.engine.layout_from(&self.snapshot, algorithm, &seeds);

        // Nodes still waiting on an interrupted exit/enter chain join at their target
        let present: HashSet<String> = self.live.iter().map(|n| n.id.clone()).collect();
        for node in self.snapshot.nodes() {
            if !present.contains(&node.id) {
                let position = targets.get(&node.id).copied().unwrap_or_default();
                self.live.push(RenderNode::settled(node.clone(), position));
            }
        }

        let on_moved = save_on_complete(Rc::clone(&self.store), self.graph_id.clone());
        self.animation.animate_transition(&mut self.live, &targets, on_moved);
        self.refresh_styles();
    }

    /// Node to pre-select whenever a rebuild contains it.
    pub fn set_focus_node(&mut self, focus: Option<String>) {
        if let Some(id) = focus.as_ref().filter(|id| self.snapshot.contains(id)) {
            self.active = Some(id.clone());
        }
        self.focus = focus;
        self.refresh_styles();
    }

    pub fn set_active_node(&mut self, active: Option<&str>) {
        self.active = active.map(str::to_string);
        self.refresh_styles();
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search.set_query(query);
        self.refresh_styles();
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    pub fn nodes(&self) -> &[RenderNode<P>] {
        &self.live
    }

    /// Edges between nodes currently on screen, styled against the active
    /// node.
    pub fn edges(&self) -> Vec<RenderEdge> {
        let settled: HashMap<&str, bool> = self
            .live
            .iter()
            .map(|n| (n.id.as_str(), n.is_settled()))
            .collect();
        let active = self.active.as_deref();

        self.snapshot
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = *settled.get(edge.source.as_str())?;
                let target = *settled.get(edge.target.as_str())?;
                Some(RenderEdge::styled(edge, active, source && target))
            })
            .collect()
    }

    /// Tear the view down. The position store is left intact.
    pub fn close(&mut self) {
        self.animation.cancel();
        self.live.clear();
        self.snapshot = GraphSnapshot::empty();
        self.first_load = true;
        self.scan_progress = None;
        tracing::debug!(graph = %self.graph_id, "session closed");
    }

    fn refresh_styles(&mut self) {
        let search_active = self.search.is_active();
        for node in self.live.iter_mut() {
            node.search_active = search_active;
            node.search_match = self.search.matches_parts(&node.id, node.kind, &node.payload);
            node.selected = self.active.as_deref() == Some(node.id.as_str());
        }
    }
}

fn save_live<P>(store: &SharedPositionStore, graph: &GraphId, live: &[RenderNode<P>]) {
    store.borrow_mut().save_positions(
        graph,
        live.iter()
            .filter(|n| n.phase != NodePhase::Exiting)
            .map(|n| (n.id.clone(), n.position)),
    );
}

fn save_on_complete<P: 'static>(store: SharedPositionStore, graph: GraphId) -> CompletionFn<P> {
    Box::new(move |_, live| {
        save_live(&store, &graph, live);
        tracing::debug!(graph = %graph, nodes = live.len(), "positions saved after animation");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ManualFrameScheduler;
    use crate::position_store::PositionStore;
    use docmap_types::{GraphEdge, GraphNode, ScanPhase};

    fn session() -> (GraphSession<()>, ManualFrameScheduler) {
        let host = ManualFrameScheduler::new();
        let session = GraphSession::new(
            GraphId::from("docs"),
            PositionStore::shared(),
            GraphSettings::default().with_seed(11),
            Box::new(host.clone()),
        )
        .unwrap();
        (session, host)
    }

    fn snapshot(ids: &[&str], edges: &[(&str, &str)]) -> GraphSnapshot<()> {
        GraphSnapshot::new(
            ids.iter().map(|id| GraphNode::document(*id, ())).collect(),
            edges.iter().map(|(a, b)| GraphEdge::internal(*a, *b)).collect(),
        )
    }

    fn drain(session: &mut GraphSession<()>) {
        while session.on_frame() != TickStatus::Idle {}
    }

    #[test]
    fn first_load_is_fresh_and_saved() {
        let (mut session, host) = session();
        let report = session.rebuild(snapshot(&["a", "b"], &[("a", "b")]));
        assert_eq!(report.tier, RestoreTier::Fresh);
        assert!(!report.animated);
        assert!(!host.has_pending());
        assert!(session.store().borrow().has_saved(session.graph_id()));
        assert!(session.nodes().iter().all(|n| n.opacity == 1.0));
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut settings = GraphSettings::default();
        settings.animation.entering_frames = 0;
        let result = GraphSession::<()>::new(
            GraphId::from("docs"),
            PositionStore::shared(),
            settings,
            Box::new(ManualFrameScheduler::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn carryover_when_store_was_cleared() {
        let (mut session, _host) = session();
        session.rebuild(snapshot(&["a", "b"], &[("a", "b")]));
        let a_before = session.nodes()[0].position;

        session.store().borrow_mut().clear(&GraphId::from("docs"));
        let report = session.rebuild(snapshot(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        assert_eq!(report.tier, RestoreTier::Carryover);
        assert_eq!(report.placed, vec!["c".to_string()]);
        assert_eq!(session.nodes()[0].position, a_before);
    }

    #[test]
    fn drag_stop_saves_full_live_set() {
        let (mut session, _host) = session();
        session.rebuild(snapshot(&["a", "b"], &[]));
        session.on_drag_stop(&[("a".to_string(), Pos2::new(-50.0, -60.0))]);

        let store = session.store().borrow();
        let graph = GraphId::from("docs");
        assert_eq!(store.position(&graph, "a"), Some(Pos2::new(-50.0, -60.0)));
        assert!(store.position(&graph, "b").is_some());
    }

    #[test]
    fn search_flags_on_every_node() {
        let (mut session, _host) = session();
        session.rebuild(snapshot(&["guide.md", "api.md"], &[]));
        session.set_search_query("guide");
        let nodes = session.nodes();
        assert!(nodes.iter().all(|n| n.search_active));
        assert!(nodes[0].search_match);
        assert!(!nodes[1].search_match);

        session.set_search_query("  ");
        assert!(session.nodes().iter().all(|n| !n.search_active && n.search_match));
    }

    #[test]
    fn focus_node_preselected_after_rebuild() {
        let (mut session, _host) = session();
        session.set_focus_node(Some("b".into()));
        session.rebuild(snapshot(&["a", "b"], &[("a", "b")]));
        assert_eq!(session.active_node(), Some("b"));
        assert!(session.nodes()[1].selected);

        let edges = session.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].emphasis, crate::view::EdgeEmphasis::Highlighted);
        assert!(edges[0].animated);
    }

    #[test]
    fn active_node_cleared_when_removed() {
        let (mut session, _host) = session();
        session.rebuild(snapshot(&["a", "b"], &[]));
        session.set_active_node(Some("a"));
        session.rebuild(snapshot(&["b"], &[]));
        assert_eq!(session.active_node(), None);
    }

    #[test]
    fn algorithm_switch_transitions_and_saves() {
        let (mut session, _host) = session();
        session.rebuild(snapshot(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        session.set_algorithm(LayoutAlgorithm::Hierarchical);
        assert!(session.is_animating());
        assert!(session.nodes().iter().all(|n| n.phase == NodePhase::Moving));
        drain(&mut session);

        let expected = LayoutEngine::from_settings(session.settings())
            .layout(session.snapshot(), LayoutAlgorithm::Hierarchical);
        let store = session.store().borrow();
        for node in session.nodes() {
            assert_eq!(node.position, expected[&node.id]);
            assert_eq!(store.position(session.graph_id(), &node.id), Some(expected[&node.id]));
        }
    }

    #[test]
    fn scan_progress_cleared_by_rebuild() {
        let (mut session, _host) = session();
        session.on_scan_progress(ScanProgress::new(ScanPhase::Parsing, 3, 10).with_file("a.md"));
        assert_eq!(session.scan_progress().map(|p| p.current), Some(3));

        let mut source = || snapshot(&["a"], &[]);
        session.rescan(&mut source);
        assert!(session.scan_progress().is_none());
    }

    #[test]
    fn close_resets_diff_state_keeps_store() {
        let (mut session, _host) = session();
        session.rebuild(snapshot(&["a"], &[]));
        session.close();
        assert!(session.nodes().is_empty());
        assert!(session.store().borrow().has_saved(&GraphId::from("docs")));

        // reopening restores from the cache without animating
        let report = session.rebuild(snapshot(&["a"], &[]));
        assert_eq!(report.tier, RestoreTier::Cache);
        assert!(!report.animated);
    }
}
