//! Per-session scroll-event guard.
//!
//! Every scroll event, user input and this engine's own programmatic
//! writes alike, arrives here. The guard enforces mutual exclusion
//! between the two sync directions, suppresses sub-threshold jitter,
//! maps the offset, and applies directional clamping before driving the
//! destination pane.

use std::cell::Cell;

use log::{debug, trace};

use super::mapper::map_offset;
use super::{PanelHandle, SyncToggle};

/// Scroll deltas smaller than this (in rows) are treated as inertia or
/// jitter and not propagated to the other pane.
pub const MIN_SCROLL_DELTA: f64 = 3.0;

/// Which pane an event (or the focus) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Original,
    Translated,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Original => Side::Translated,
            Side::Translated => Side::Original,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Original => "original",
            Side::Translated => "translated",
        }
    }
}

/// Session state for one panel pair.
///
/// `driving` is set for the duration of a single `handle_scroll` call and
/// cleared before it returns; handling never suspends, so the re-entrant
/// scroll event raised by `scroll_to_offset` observes the flag while it
/// is still set. `Cell` fields keep that re-entrant read free of borrow
/// conflicts.
pub struct SyncGuard {
    toggle: SyncToggle,
    driving: Cell<Option<Side>>,
    last_original_top: Cell<Option<f64>>,
    last_translated_top: Cell<Option<f64>>,
}

impl SyncGuard {
    pub fn new(toggle: SyncToggle) -> Self {
        Self {
            toggle,
            driving: Cell::new(None),
            last_original_top: Cell::new(None),
            last_translated_top: Cell::new(None),
        }
    }

    fn last_top(&self, side: Side) -> &Cell<Option<f64>> {
        match side {
            Side::Original => &self.last_original_top,
            Side::Translated => &self.last_translated_top,
        }
    }

    /// Reset the session. Called when the pair becomes unavailable; the
    /// next observed scroll on either side starts with no history.
    pub fn reset(&self) {
        self.driving.set(None);
        self.last_original_top.set(None);
        self.last_translated_top.set(None);
    }

    /// Handle one scroll event on `side`, driving `dst` to the mapped
    /// offset. Runs to completion with no suspension point.
    pub fn handle_scroll(
        &self,
        side: Side,
        source_top: f64,
        src: &dyn PanelHandle,
        dst: &dyn PanelHandle,
    ) {
        if !self.toggle.read() {
            return;
        }

        // 相手側が駆動中に発生したイベントは、こちらの書き込みが起こした
        // ものなので無視する（フィードバックループ防止）
        if self.driving.get() == Some(side.other()) {
            trace!(
                "sync: {} event at {source_top:.1} while {} is driving, ignored",
                side.label(),
                side.other().label()
            );
            return;
        }

        if !src.is_ready() || !dst.is_ready() {
            return;
        }

        self.driving.set(Some(side));

        let prev = self.last_top(side).get();
        if let Some(prev_top) = prev {
            let delta = source_top - prev_top;
            if delta.abs() < MIN_SCROLL_DELTA {
                // Inertia/jitter: record the position anyway so the next
                // delta is measured from here, but don't move the peer.
                trace!("sync: {} delta {delta:.1} below threshold", side.label());
                self.last_top(side).set(Some(source_top));
                self.driving.set(None);
                return;
            }
        }

        let dst_current = dst.scroll_top();
        let mapped = map_offset(
            source_top,
            &src.segment_positions(),
            &dst.segment_positions(),
        );

        let Some(mapped) = mapped else {
            // No mapping possible (a segment list is empty): skip this
            // pass but keep the observation.
            self.last_top(side).set(Some(source_top));
            self.driving.set(None);
            return;
        };

        let mut target = mapped;
        if let Some(prev_top) = prev {
            let delta = source_top - prev_top;
            // Segment-size quantization can map a forward scroll to an
            // offset behind where the peer already is (and vice versa);
            // never move the peer against the user's direction.
            if delta > 0.0 && target < dst_current {
                target = dst_current;
            }
            if delta < 0.0 && target > dst_current {
                target = dst_current;
            }
        }

        self.last_top(side).set(Some(source_top));
        debug!(
            "sync: {} {source_top:.1} -> {} {target:.1} (mapped {mapped:.1}, peer was {dst_current:.1})",
            side.label(),
            side.other().label()
        );
        dst.scroll_to_offset(target);
        self.driving.set(None);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::super::testing::FakePanel;
    use super::*;
    use crate::sync::mapper::SegmentPosition;

    fn segs(spans: &[(f64, f64)]) -> Vec<SegmentPosition> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &(top, height))| SegmentPosition::new(format!("blk{i}"), top, height))
            .collect()
    }

    fn pair() -> (Rc<FakePanel>, Rc<FakePanel>) {
        (
            FakePanel::new(segs(&[(0.0, 100.0), (100.0, 50.0)])),
            FakePanel::new(segs(&[(0.0, 200.0), (200.0, 100.0)])),
        )
    }

    #[test]
    fn first_event_propagates_mapped_offset() {
        let (src, dst) = pair();
        let guard = SyncGuard::new(SyncToggle::Fixed(true));
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert_eq!(dst.scrolled_to(), vec![100.0]);
    }

    #[test]
    fn jitter_below_threshold_is_swallowed() {
        let (src, dst) = pair();
        let guard = SyncGuard::new(SyncToggle::Fixed(true));
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        // Delta of 2 rows: no propagation, but the observation updates.
        guard.handle_scroll(Side::Original, 52.0, src.as_ref(), dst.as_ref());
        assert_eq!(dst.scrolled_to().len(), 1);
        // Delta of 4 rows from the *updated* observation: propagates.
        guard.handle_scroll(Side::Original, 56.0, src.as_ref(), dst.as_ref());
        assert_eq!(dst.scrolled_to().len(), 2);
    }

    #[test]
    fn reentrant_event_from_driven_side_is_ignored() {
        let (src, dst) = pair();
        let guard = Rc::new(SyncGuard::new(SyncToggle::Fixed(true)));

        // Simulate the real wiring: the destination pane's scroll event
        // synchronously calls back into the guard for its own side.
        {
            let guard = guard.clone();
            let src = src.clone();
            let dst = dst.clone();
            let dst_listener = dst.clone();
            dst_listener.subscribe_scroll(Rc::new(move |top| {
                guard.handle_scroll(Side::Translated, top, dst.as_ref(), src.as_ref());
            }));
        }

        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());

        // The driven side's re-entrant event must not bounce back.
        assert_eq!(dst.scrolled_to(), vec![100.0]);
        assert!(src.scrolled_to().is_empty());
        // And the flag is back to idle: a fresh translated event works.
        guard.handle_scroll(Side::Translated, 240.0, dst.as_ref(), src.as_ref());
        assert_eq!(src.scrolled_to().len(), 1);
    }

    #[test]
    fn forward_scroll_never_moves_peer_backward() {
        let (src, dst) = pair();
        let guard = SyncGuard::new(SyncToggle::Fixed(true));
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        // Peer sits at 100.0 now. Pretend it was dragged further ahead.
        dst.set_top(150.0);
        // Forward delta mapping to 112.0 (< 150.0) is raised to 150.0.
        guard.handle_scroll(Side::Original, 56.0, src.as_ref(), dst.as_ref());
        assert_eq!(*dst.scrolled_to().last().unwrap(), 150.0);
    }

    #[test]
    fn backward_scroll_never_moves_peer_forward() {
        let (src, dst) = pair();
        let guard = SyncGuard::new(SyncToggle::Fixed(true));
        guard.handle_scroll(Side::Original, 100.0, src.as_ref(), dst.as_ref());
        dst.set_top(10.0);
        // Backward delta mapping above 10.0 is lowered to 10.0.
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert_eq!(*dst.scrolled_to().last().unwrap(), 10.0);
    }

    #[test]
    fn empty_segment_list_skips_the_pass() {
        let (src, dst) = pair();
        src.set_positions(Vec::new());
        let guard = SyncGuard::new(SyncToggle::Fixed(true));
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert!(dst.scrolled_to().is_empty());
        // The observation was still recorded: restoring the segments and
        // moving 2 rows is jitter relative to 50.0.
        src.set_positions(segs(&[(0.0, 100.0), (100.0, 50.0)]));
        guard.handle_scroll(Side::Original, 52.0, src.as_ref(), dst.as_ref());
        assert!(dst.scrolled_to().is_empty());
    }

    #[test]
    fn disabled_toggle_is_a_full_noop() {
        let (src, dst) = pair();
        let guard = SyncGuard::new(SyncToggle::Fixed(false));
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert!(dst.scrolled_to().is_empty());
    }

    #[test]
    fn live_toggle_is_read_per_event() {
        let (src, dst) = pair();
        let flag = Rc::new(Cell::new(false));
        let guard = {
            let flag = flag.clone();
            SyncGuard::new(SyncToggle::Live(Rc::new(move || flag.get())))
        };
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert!(dst.scrolled_to().is_empty());
        flag.set(true);
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert_eq!(dst.scrolled_to(), vec![100.0]);
    }

    #[test]
    fn unready_panel_skips_the_pass() {
        let (src, dst) = pair();
        dst.set_ready(false);
        let guard = SyncGuard::new(SyncToggle::Fixed(true));
        guard.handle_scroll(Side::Original, 50.0, src.as_ref(), dst.as_ref());
        assert!(dst.scrolled_to().is_empty());
    }
}
