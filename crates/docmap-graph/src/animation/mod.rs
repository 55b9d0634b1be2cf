//! Frame-based enter/exit/transition animation.
//!
//! # Lifecycle
//!
//! ```text
//! animate_*()  ──► frame 0 applied, frame requested
//! tick()       ──► next frame applied, next frame requested
//! tick()       ──► last frame applied ──► on_complete(controller, live)
//! ```
//!
//! At most one timeline runs at a time. Starting a new one, or calling
//! [`AnimationController::cancel`], drops the current timeline together with
//! its completion callback; a cancelled callback never runs. Callbacks get the
//! controller back so they can chain the next timeline (exit, then enter).

pub mod easing;
pub mod scheduler;
pub mod timeline;

pub use scheduler::{FrameHandle, FrameScheduler, IntervalTicker, ManualFrameScheduler};
pub use timeline::{FrameSet, NodeFrame, Timeline, TimelineKind};

use crate::config::AnimationSettings;
use crate::layout::Positions;
use crate::view::{NodePhase, RenderNode};
use std::collections::HashSet;

/// Runs when a timeline has applied its last frame.
pub type CompletionFn<P> = Box<dyn FnOnce(&mut AnimationController<P>, &mut Vec<RenderNode<P>>)>;

/// Result of one [`AnimationController::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing was animating
    Idle,
    /// A frame was applied and another one requested
    Running,
    /// The last frame was applied and the completion callback ran
    Completed,
}

struct ActiveTimeline<P> {
    timeline: Timeline,
    next_frame: usize,
    handle: Option<FrameHandle>,
    on_complete: Option<CompletionFn<P>>,
}

pub struct AnimationController<P> {
    scheduler: Box<dyn FrameScheduler>,
    settings: AnimationSettings,
    active: Option<ActiveTimeline<P>>,
}

impl<P> std::fmt::Debug for AnimationController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("settings", &self.settings)
            .field("active", &self.active.as_ref().map(|a| a.timeline.kind()))
            .finish_non_exhaustive()
    }
}

impl<P> AnimationController<P> {
    pub fn new(scheduler: Box<dyn FrameScheduler>, settings: AnimationSettings) -> Self {
        Self {
            scheduler,
            settings,
            active: None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_kind(&self) -> Option<TimelineKind> {
        self.active.as_ref().map(|a| a.timeline.kind())
    }

    /// Frames still to be applied by `tick`
    pub fn frames_remaining(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |a| a.timeline.len().saturating_sub(a.next_frame))
    }

    // =========================================================================
    // STARTING
    // =========================================================================

    /// Fade and grow in the nodes of `live` named by `ids`.
    ///
    /// Returns `false` when there is nothing to animate; `on_complete` has
    /// then already run.
    pub fn animate_entering(
        &mut self,
        live: &mut Vec<RenderNode<P>>,
        ids: &[String],
        on_complete: CompletionFn<P>,
    ) -> bool {
        let targets = pick(live, ids);
        let timeline = Timeline::entering(
            targets.iter().map(|n| (n.id.clone(), n.position)),
            self.settings.entering_frames,
        );
        mark(live, ids, NodePhase::Entering);
        self.start(live, timeline, on_complete)
    }

    /// Fade and shrink out the nodes of `live` named by `ids`. They are
    /// removed from `live` when the timeline completes, before `on_complete`.
    pub fn animate_exiting(
        &mut self,
        live: &mut Vec<RenderNode<P>>,
        ids: &[String],
        on_complete: CompletionFn<P>,
    ) -> bool {
        let targets = pick(live, ids);
        let timeline = Timeline::exiting(
            targets.iter().map(|n| (n.id.clone(), n.position)),
            self.settings.exiting_frames,
        );
        mark(live, ids, NodePhase::Exiting);
        self.start(live, timeline, on_complete)
    }

    /// Move every node of `live` that has a target to that target.
    pub fn animate_transition(
        &mut self,
        live: &mut Vec<RenderNode<P>>,
        targets: &Positions,
        on_complete: CompletionFn<P>,
    ) -> bool {
        let moves: Vec<(String, egui::Pos2, egui::Pos2)> = live
            .iter()
            .filter_map(|n| targets.get(&n.id).map(|&to| (n.id.clone(), n.position, to)))
            .collect();
        let ids: Vec<String> = moves.iter().map(|(id, _, _)| id.clone()).collect();
        let timeline = Timeline::transition(moves, self.settings.transition_frames);
        mark(live, &ids, NodePhase::Moving);
        self.start(live, timeline, on_complete)
    }

    fn start(
        &mut self,
        live: &mut Vec<RenderNode<P>>,
        timeline: Timeline,
        on_complete: CompletionFn<P>,
    ) -> bool {
        self.cancel();

        if !timeline.has_nodes() {
            tracing::trace!(kind = ?timeline.kind(), "nothing to animate");
            on_complete(self, live);
            return false;
        }

        tracing::debug!(kind = ?timeline.kind(), frames = timeline.len(), "animation started");
        if let Some(first) = timeline.frame(0) {
            apply(live, first);
        }
        let handle = self.scheduler.request_frame();
        self.active = Some(ActiveTimeline {
            timeline,
            next_frame: 1,
            handle: Some(handle),
            on_complete: Some(on_complete),
        });
        true
    }

    // =========================================================================
    // RUNNING
    // =========================================================================

    /// Apply the next frame to `live`.
    pub fn tick(&mut self, live: &mut Vec<RenderNode<P>>) -> TickStatus {
        let Some(active) = self.active.as_mut() else {
            return TickStatus::Idle;
        };
        active.handle = None;

        if let Some(frame) = active.timeline.frame(active.next_frame) {
            apply(live, frame);
            tracing::trace!(frame = active.next_frame, "animation frame");
        }
        active.next_frame += 1;

        if active.next_frame < active.timeline.len() {
            active.handle = Some(self.scheduler.request_frame());
            return TickStatus::Running;
        }

        let Some(mut finished) = self.active.take() else {
            return TickStatus::Idle;
        };
        finish(live, finished.timeline.kind());
        tracing::debug!(kind = ?finished.timeline.kind(), "animation complete");
        if let Some(on_complete) = finished.on_complete.take() {
            on_complete(self, live);
        }
        TickStatus::Completed
    }

    /// Drop the running timeline and its callback.
    ///
    /// Returns `true` if something was cancelled. Display state of `live`
    /// is left as last applied; see [`AnimationController::interrupt`].
    pub fn cancel(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        if let Some(handle) = active.handle {
            self.scheduler.cancel_frame(handle);
        }
        tracing::debug!(kind = ?active.timeline.kind(), "animation cancelled");
        true
    }

    /// Cancel, then bring `live` back to a resting state: exiting ghosts are
    /// removed and partially faded nodes return to full opacity and scale.
    /// Positions stay where the last frame left them.
    pub fn interrupt(&mut self, live: &mut Vec<RenderNode<P>>) -> bool {
        let cancelled = self.cancel();
        live.retain(|n| n.phase != NodePhase::Exiting);
        for node in live.iter_mut() {
            node.settle();
        }
        cancelled
    }
}

fn pick<'a, P>(live: &'a [RenderNode<P>], ids: &[String]) -> Vec<&'a RenderNode<P>> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    live.iter().filter(|n| wanted.contains(n.id.as_str())).collect()
}

fn mark<P>(live: &mut [RenderNode<P>], ids: &[String], phase: NodePhase) {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    for node in live.iter_mut().filter(|n| wanted.contains(n.id.as_str())) {
        node.phase = phase;
    }
}

fn apply<P>(live: &mut [RenderNode<P>], frame: &FrameSet) {
    for node in live.iter_mut() {
        if let Some(f) = frame.get(&node.id) {
            node.position = f.position;
            node.opacity = f.opacity;
            node.scale = f.scale;
        }
    }
}

fn finish<P>(live: &mut Vec<RenderNode<P>>, kind: TimelineKind) {
    match kind {
        TimelineKind::Exiting => live.retain(|n| n.phase != NodePhase::Exiting),
        TimelineKind::Entering => settle_phase(live, NodePhase::Entering),
        TimelineKind::Transition => settle_phase(live, NodePhase::Moving),
    }
}

fn settle_phase<P>(live: &mut [RenderNode<P>], phase: NodePhase) {
    for node in live.iter_mut().filter(|n| n.phase == phase) {
        node.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_types::GraphNode;
    use egui::Pos2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn live(ids: &[&str]) -> Vec<RenderNode<()>> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                RenderNode::settled(GraphNode::document(*id, ()), Pos2::new(i as f32 * 10.0, 0.0))
            })
            .collect()
    }

    fn controller() -> (AnimationController<()>, ManualFrameScheduler) {
        let host = ManualFrameScheduler::new();
        let controller =
            AnimationController::new(Box::new(host.clone()), AnimationSettings::default());
        (controller, host)
    }

    fn run_to_end(controller: &mut AnimationController<()>, live: &mut Vec<RenderNode<()>>) -> usize {
        let mut ticks = 0;
        while controller.tick(live) == TickStatus::Running {
            ticks += 1;
        }
        ticks + 1
    }

    #[test]
    fn entering_runs_all_frames_then_completes() {
        let (mut controller, host) = controller();
        let mut nodes = live(&["a", "b"]);
        let done = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&done);

        let started = controller.animate_entering(
            &mut nodes,
            &["b".to_string()],
            Box::new(move |_, _| *flag.borrow_mut() = true),
        );
        assert!(started);
        assert_eq!(nodes[1].opacity, 0.0);
        assert_eq!(nodes[1].phase, NodePhase::Entering);
        assert_eq!(nodes[0].opacity, 1.0);
        assert!(host.has_pending());

        // frame 0 applied on start, 14 ticks remain
        assert_eq!(run_to_end(&mut controller, &mut nodes), 14);
        assert!(*done.borrow());
        assert_eq!(nodes[1].opacity, 1.0);
        assert_eq!(nodes[1].phase, NodePhase::Settled);
        assert_eq!(controller.tick(&mut nodes), TickStatus::Idle);
    }

    #[test]
    fn exiting_nodes_are_removed_on_completion() {
        let (mut controller, _host) = controller();
        let mut nodes = live(&["a", "b", "c"]);
        controller.animate_exiting(&mut nodes, &["a".to_string()], Box::new(|_, live| {
            assert!(live.iter().all(|n| n.id != "a"));
        }));
        assert_eq!(run_to_end(&mut controller, &mut nodes), 9);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn empty_list_completes_immediately() {
        let (mut controller, host) = controller();
        let mut nodes = live(&["a"]);
        let done = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&done);

        let started =
            controller.animate_entering(&mut nodes, &[], Box::new(move |_, _| *flag.borrow_mut() = true));
        assert!(!started);
        assert!(*done.borrow());
        assert!(!controller.is_animating());
        assert_eq!(host.requested(), 0);
    }

    #[test]
    fn new_animation_cancels_old_callback() {
        let (mut controller, host) = controller();
        let mut nodes = live(&["a", "b"]);
        let calls = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&calls);
        controller.animate_entering(&mut nodes, &["a".to_string()], Box::new(move |_, _| {
            log.borrow_mut().push("first")
        }));
        controller.tick(&mut nodes);

        let log = Rc::clone(&calls);
        controller.animate_entering(&mut nodes, &["b".to_string()], Box::new(move |_, _| {
            log.borrow_mut().push("second")
        }));
        assert_eq!(host.cancelled(), 1);
        run_to_end(&mut controller, &mut nodes);

        assert_eq!(*calls.borrow(), vec!["second"]);
    }

    #[test]
    fn completion_can_chain_next_timeline() {
        let (mut controller, _host) = controller();
        let mut nodes = live(&["a", "b"]);
        let entered = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&entered);

        controller.animate_exiting(
            &mut nodes,
            &["a".to_string()],
            Box::new(move |controller, live| {
                live.push(RenderNode::settled(GraphNode::document("d", ()), Pos2::ZERO));
                controller.animate_entering(
                    live,
                    &["d".to_string()],
                    Box::new(move |_, _| *flag.borrow_mut() = true),
                );
            }),
        );

        assert_eq!(controller.current_kind(), Some(TimelineKind::Exiting));
        assert_eq!(run_to_end(&mut controller, &mut nodes), 9);
        assert_eq!(controller.current_kind(), Some(TimelineKind::Entering));
        assert_eq!(controller.frames_remaining(), 14);
        run_to_end(&mut controller, &mut nodes);
        assert!(*entered.borrow());
    }

    #[test]
    fn transition_moves_to_targets() {
        let (mut controller, _host) = controller();
        let mut nodes = live(&["a", "b"]);
        let targets = Positions::from([("a".to_string(), Pos2::new(500.0, 500.0))]);
        controller.animate_transition(&mut nodes, &targets, Box::new(|_, _| {}));
        assert_eq!(nodes[0].phase, NodePhase::Moving);
        assert_eq!(nodes[1].phase, NodePhase::Settled);
        assert_eq!(run_to_end(&mut controller, &mut nodes), 19);
        assert_eq!(nodes[0].position, Pos2::new(500.0, 500.0));
        assert!(nodes[0].is_settled());
    }

    #[test]
    fn interrupt_restores_rest_state() {
        let (mut controller, _host) = controller();
        let mut nodes = live(&["a", "b"]);
        controller.animate_exiting(&mut nodes, &["a".to_string()], Box::new(|_, _| {}));
        controller.tick(&mut nodes);
        assert!(controller.interrupt(&mut nodes));
        assert_eq!(nodes.len(), 1);
        assert!(nodes.iter().all(|n| n.opacity == 1.0 && n.is_settled()));
        assert!(!controller.interrupt(&mut nodes));
    }
}
