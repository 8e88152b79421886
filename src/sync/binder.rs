//! Panel-pair lifecycle: readiness tracking, deferred rebinding, and
//! scroll-listener attach/detach.
//!
//! The host reports readiness transitions; the binder turns them into
//! listener wiring. Rebinding is deferred by one scheduler tick so the
//! host's layout can settle before segments are measured.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use log::debug;

use super::guard::{Side, SyncGuard};
use super::{ListenerId, PanelHandle, Scheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindState {
    Unbound,
    PendingMeasure,
    Bound,
}

pub(super) struct PanelBinder {
    original: Rc<dyn PanelHandle>,
    translated: Rc<dyn PanelHandle>,
    guard: Rc<SyncGuard>,
    scheduler: Rc<dyn Scheduler>,
    state: Cell<BindState>,
    attached: Cell<Option<(ListenerId, ListenerId)>>,
}

impl PanelBinder {
    pub(super) fn new(
        original: Rc<dyn PanelHandle>,
        translated: Rc<dyn PanelHandle>,
        guard: Rc<SyncGuard>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Rc<Self> {
        Rc::new(Self {
            original,
            translated,
            guard,
            scheduler,
            state: Cell::new(BindState::Unbound),
            attached: Cell::new(None),
        })
    }

    pub(super) fn panels_ready(binder: &Rc<Self>) {
        if !binder.original.is_ready() || !binder.translated.is_ready() {
            // 片側だけ ready の報告は unbound 扱い
            binder.panels_unavailable();
            return;
        }
        binder.state.set(BindState::PendingMeasure);
        debug!("sync: panels ready, rebinding on next tick");
        let weak = Rc::downgrade(binder);
        binder.scheduler.defer(Box::new(move || {
            if let Some(binder) = weak.upgrade() {
                binder.rebind();
            }
        }));
    }

    pub(super) fn panels_unavailable(&self) {
        self.detach();
        self.guard.reset();
        self.state.set(BindState::Unbound);
        debug!("sync: panels unavailable, listeners detached");
    }

    pub(super) fn refresh_layouts(&self) {
        if self.original.is_ready() {
            self.original.measure_segments();
        }
        if self.translated.is_ready() {
            self.translated.measure_segments();
        }
    }

    /// The deferred half of `panels_ready`. The tick may fire after the
    /// pair went away again, or after an earlier tick already rebound;
    /// both are no-ops.
    fn rebind(&self) {
        if self.state.get() != BindState::PendingMeasure {
            return;
        }
        if !self.original.is_ready() || !self.translated.is_ready() {
            self.state.set(BindState::Unbound);
            return;
        }
        self.detach();
        self.original.measure_segments();
        self.translated.measure_segments();
        self.attach();
        self.state.set(BindState::Bound);
        debug!("sync: panels measured, listeners attached");
    }

    fn attach(&self) {
        let original_id = self.original.subscribe_scroll(scroll_listener(
            Side::Original,
            self.guard.clone(),
            Rc::downgrade(&self.original),
            Rc::downgrade(&self.translated),
        ));
        let translated_id = self.translated.subscribe_scroll(scroll_listener(
            Side::Translated,
            self.guard.clone(),
            Rc::downgrade(&self.translated),
            Rc::downgrade(&self.original),
        ));
        self.attached.set(Some((original_id, translated_id)));
    }

    fn detach(&self) {
        if let Some((original_id, translated_id)) = self.attached.take() {
            self.original.unsubscribe_scroll(original_id);
            self.translated.unsubscribe_scroll(translated_id);
        }
    }
}

/// Build one side's scroll listener. Weak captures keep the pane →
/// listener → pane edge from forming an `Rc` cycle.
fn scroll_listener(
    side: Side,
    guard: Rc<SyncGuard>,
    src: Weak<dyn PanelHandle>,
    dst: Weak<dyn PanelHandle>,
) -> Rc<dyn Fn(f64)> {
    Rc::new(move |top| {
        let (Some(src), Some(dst)) = (src.upgrade(), dst.upgrade()) else {
            return;
        };
        guard.handle_scroll(side, top, src.as_ref(), dst.as_ref());
    })
}
