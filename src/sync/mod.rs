//! Bidirectional scroll synchronization between two panes.
//!
//! The engine is deliberately small and self-contained: it does not own
//! document content, does not decide what a segment is, and never
//! measures layout itself. All of that arrives through the
//! [`PanelHandle`] capability each pane implements. What it does own is
//! the hard part: mapping offsets across panes whose segments have
//! different heights ([`map_offset`]), and doing so on every live scroll
//! event without the programmatic write on one side re-triggering the
//! other in an endless loop ([`SyncGuard`]).
//!
//! Everything runs on the host's single event-dispatch thread. Scroll
//! handling is synchronous from start to finish; the only deferred step
//! is the binder's one-tick rebind delay, which waits for host layout to
//! settle, not for synchronization correctness.
//!
//! Typical wiring:
//!
//! ```ignore
//! let queue = Rc::new(TaskQueue::new());
//! let sync = ScrollSync::new(original, translated, toggle, queue.clone());
//! sync.panels_ready();   // once both panes have a viewport
//! queue.drain();         // host tick: binder measures and attaches
//! ```

mod binder;
mod guard;
mod mapper;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use binder::PanelBinder;

pub use guard::{MIN_SCROLL_DELTA, Side, SyncGuard};
pub use mapper::{SegmentPosition, map_offset};

/// Token returned by [`PanelHandle::subscribe_scroll`]; passing it back
/// to `unsubscribe_scroll` detaches the listener.
pub type ListenerId = u64;

/// Capability surface the engine consumes from each pane.
///
/// Implementations dispatch scroll listeners synchronously, on the
/// caller's stack, for programmatic writes and user scrolls alike; the
/// engine relies on that to observe its own writes re-entrantly.
pub trait PanelHandle {
    /// Is the pane's scroll container present and laid out?
    fn is_ready(&self) -> bool;

    /// Snapshot of the current segment positions. Empty until measured.
    fn segment_positions(&self) -> Vec<SegmentPosition>;

    /// Recompute segment positions from the current layout. Idempotent;
    /// a no-op while the pane has no layout.
    fn measure_segments(&self);

    /// Current scroll offset, in rows.
    fn scroll_top(&self) -> f64;

    /// Imperatively set the scroll offset. Raises a scroll event on this
    /// pane when the (clamped) value actually changes.
    fn scroll_to_offset(&self, top: f64);

    fn subscribe_scroll(&self, listener: Rc<dyn Fn(f64)>) -> ListenerId;
    fn unsubscribe_scroll(&self, id: ListenerId);
}

/// Whether synchronization is on, read once per scroll event.
///
/// `Fixed` is a plain value; `Live` re-evaluates a host-supplied closure
/// each time, so a UI toggle takes effect mid-session without the engine
/// knowing anything about the host's reactivity model.
pub enum SyncToggle {
    Fixed(bool),
    Live(Rc<dyn Fn() -> bool>),
}

impl SyncToggle {
    pub fn read(&self) -> bool {
        match self {
            SyncToggle::Fixed(value) => *value,
            SyncToggle::Live(read) => read(),
        }
    }
}

/// Host-supplied scheduling port: run a task on the next host tick,
/// after any pending layout work has settled.
pub trait Scheduler {
    fn defer(&self, task: Box<dyn FnOnce()>);
}

/// Single-threaded deferred-task queue.
///
/// The viewer drains it once per event-loop iteration; tests drain it
/// manually. Tasks queued while draining run on the *next* drain, which
/// is what makes it a tick boundary rather than a trampoline.
#[derive(Default)]
pub struct TaskQueue {
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn drain(&self) {
        let tasks: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        for task in tasks {
            task();
        }
    }
}

impl Scheduler for TaskQueue {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(task);
    }
}

/// The composed engine: one guard session plus the lifecycle binder,
/// constructed per panel pair and owned by whoever composes the panes.
pub struct ScrollSync {
    binder: Rc<PanelBinder>,
}

impl ScrollSync {
    pub fn new(
        original: Rc<dyn PanelHandle>,
        translated: Rc<dyn PanelHandle>,
        toggle: SyncToggle,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        let guard = Rc::new(SyncGuard::new(toggle));
        Self {
            binder: PanelBinder::new(original, translated, guard, scheduler),
        }
    }

    /// Both panes have (re)gained their layout. Rebinding (detach,
    /// measure, attach) happens one scheduler tick later.
    pub fn panels_ready(&self) {
        PanelBinder::panels_ready(&self.binder);
    }

    /// Either pane lost its layout. Listeners detach and the session
    /// resets; the pair is re-armed by the next `panels_ready`.
    pub fn panels_unavailable(&self) {
        self.binder.panels_unavailable();
    }

    /// Force both panes to remeasure after an external layout change
    /// (resize, document swap) the engine cannot observe itself. No-op
    /// for any pane that currently has no layout.
    pub fn refresh_layouts(&self) {
        self.binder.refresh_layouts();
    }
}
