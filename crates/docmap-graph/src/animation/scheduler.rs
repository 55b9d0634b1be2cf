//! Frame scheduling.
//!
//! The controller never sleeps or spins; it asks a [`FrameScheduler`] for the
//! next frame and the host calls back into the session when it arrives.
//!
//! Two implementations:
//! - [`ManualFrameScheduler`]: a game/render loop checks `take_pending()` each
//!   frame and ticks when a frame was requested
//! - [`IntervalTicker`]: a background timer thread delivers requested frames
//!   over a channel at a fixed rate

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Identifies one requested frame. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host-supplied display-synchronised callback source.
pub trait FrameScheduler {
    /// Ask for one more frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request. Unknown or already-delivered handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

// =============================================================================
// MANUAL
// =============================================================================

#[derive(Debug, Default)]
struct FrameQueue {
    next_id: u64,
    pending: Option<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

/// Scheduler for hosts that already run a frame loop.
///
/// Cloning shares the queue: hand one clone to the session and keep one in
/// the loop.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameScheduler {
    queue: Rc<RefCell<FrameQueue>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.queue.borrow().pending.is_some()
    }

    /// Consume the outstanding request, if any
    pub fn take_pending(&self) -> Option<FrameHandle> {
        self.queue.borrow_mut().pending.take()
    }

    /// Total frames requested so far
    pub fn requested(&self) -> usize {
        self.queue.borrow().requested
    }

    /// Total requests withdrawn before delivery
    pub fn cancelled(&self) -> usize {
        self.queue.borrow().cancelled
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        queue.requested += 1;
        let handle = FrameHandle(queue.next_id);
        queue.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut queue = self.queue.borrow_mut();
        if queue.pending == Some(handle) {
            queue.pending = None;
            queue.cancelled += 1;
        }
    }
}

// =============================================================================
// INTERVAL TICKER
// =============================================================================

/// Timer-thread scheduler.
///
/// The thread wakes every `interval`; if a frame is outstanding it sends the
/// handle on the channel returned by [`IntervalTicker::start`]. The host
/// receives on its own thread and calls `GraphSession::on_frame`. The thread
/// exits when the ticker is dropped or the receiver goes away.
#[derive(Debug)]
pub struct IntervalTicker {
    next_id: u64,
    /// Outstanding handle id, 0 = none
    pending: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
}

impl IntervalTicker {
    pub fn start(interval: Duration) -> (Self, Receiver<FrameHandle>) {
        let (sender, receiver) = mpsc::channel();
        let pending = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_pending = Arc::clone(&pending);
        let thread_stop = Arc::clone(&stop);
        thread::spawn(move || run_ticker(interval, thread_pending, thread_stop, sender));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "interval ticker started");

        (
            Self {
                next_id: 0,
                pending,
                stop,
            },
            receiver,
        )
    }
}

fn run_ticker(
    interval: Duration,
    pending: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    sender: Sender<FrameHandle>,
) {
    while !stop.load(Ordering::Acquire) {
        thread::sleep(interval);
        let id = pending.swap(0, Ordering::AcqRel);
        if id != 0 && sender.send(FrameHandle(id)).is_err() {
            break;
        }
    }
    tracing::trace!("interval ticker stopped");
}

impl FrameScheduler for IntervalTicker {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.pending.store(self.next_id, Ordering::Release);
        FrameHandle(self.next_id)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // Only clears the slot if it still holds this handle
        let _ = self
            .pending
            .compare_exchange(handle.0, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}
