//! One scrollable pane: document blocks, wrapped layout, scroll state,
//! and the synchronous scroll-event channel.
//!
//! A pane measures itself by wrapping every block to its viewport width;
//! the resulting per-block row extents are the segment positions the
//! sync engine maps between. User scrolls and the engine's programmatic
//! writes go through the same `scroll_to_offset` path, so both raise the
//! same scroll event.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use log::debug;

use crate::segment::Block;
use crate::sync::{ListenerId, PanelHandle, SegmentPosition};

/// Text area of a pane, in terminal cells. A pane without a viewport is
/// not laid out and reports itself unready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

/// Synchronous scroll-event dispatcher. Listeners run on the caller's
/// stack. The registry is snapshotted before dispatch: a listener may
/// scroll the peer pane, which re-enters `emit` over there, and must not
/// hold this pane's borrow while doing so.
struct ScrollEvents {
    next_id: Cell<ListenerId>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn Fn(f64)>)>>,
}

impl ScrollEvents {
    fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn subscribe(&self, listener: Rc<dyn Fn(f64)>) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    fn emit(&self, top: f64) {
        let snapshot: Vec<Rc<dyn Fn(f64)>> =
            self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in snapshot {
            listener(top);
        }
    }
}

pub struct Panel {
    label: &'static str,
    blocks: RefCell<Vec<Block>>,
    viewport: Cell<Option<Viewport>>,
    /// Flattened wrapped lines, rebuilt by `measure_segments`.
    lines: RefCell<Vec<String>>,
    positions: RefCell<Vec<SegmentPosition>>,
    scroll_top: Cell<f64>,
    events: ScrollEvents,
}

impl Panel {
    pub fn new(label: &'static str, blocks: Vec<Block>) -> Rc<Self> {
        Rc::new(Self {
            label,
            blocks: RefCell::new(blocks),
            viewport: Cell::new(None),
            lines: RefCell::new(Vec::new()),
            positions: RefCell::new(Vec::new()),
            scroll_top: Cell::new(0.0),
            events: ScrollEvents::new(),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(Some(viewport));
    }

    pub fn clear_viewport(&self) {
        self.viewport.set(None);
    }

    /// Swap in a reloaded document. Positions and lines go stale until
    /// the next `measure_segments`.
    pub fn replace_blocks(&self, blocks: Vec<Block>) {
        *self.blocks.borrow_mut() = blocks;
    }

    /// Wrapped lines for drawing.
    pub fn lines(&self) -> Ref<'_, Vec<String>> {
        self.lines.borrow()
    }

    pub fn total_rows(&self) -> usize {
        self.lines.borrow().len()
    }

    /// First visible row for drawing (mapped offsets are fractional).
    pub fn top_row(&self) -> usize {
        self.scroll_top.get().max(0.0) as usize
    }

    pub fn max_scroll(&self) -> f64 {
        let rows = self.viewport.get().map_or(0, |vp| vp.rows) as usize;
        self.total_rows().saturating_sub(rows) as f64
    }

    /// User-input scroll, relative. Same event channel as programmatic
    /// writes.
    pub fn scroll_by(&self, delta: f64) {
        self.scroll_to_offset(self.scroll_top.get() + delta);
    }
}

impl PanelHandle for Panel {
    fn is_ready(&self) -> bool {
        self.viewport.get().is_some()
    }

    fn segment_positions(&self) -> Vec<SegmentPosition> {
        self.positions.borrow().clone()
    }

    fn measure_segments(&self) {
        let Some(viewport) = self.viewport.get() else {
            return;
        };
        let width = viewport.cols.max(1) as usize;

        let mut lines: Vec<String> = Vec::new();
        let mut positions = Vec::new();
        for block in self.blocks.borrow().iter() {
            let top = lines.len();
            for source_line in block.text.lines() {
                for wrapped in textwrap::wrap(source_line, width) {
                    lines.push(wrapped.into_owned());
                }
            }
            // The separator row belongs to the block, so segments tile
            // the scroll range without gaps.
            lines.push(String::new());
            positions.push(SegmentPosition::new(
                block.id.clone(),
                top as f64,
                (lines.len() - top) as f64,
            ));
        }
        debug!(
            "panel {}: measured {} blocks into {} rows at width {width}",
            self.label,
            positions.len(),
            lines.len()
        );
        *self.lines.borrow_mut() = lines;
        *self.positions.borrow_mut() = positions;

        // A reload or narrower viewport may have shrunk the scroll
        // range; pull the offset back in silently (layout motion, not a
        // scroll event).
        let max = self.max_scroll();
        if self.scroll_top.get() > max {
            self.scroll_top.set(max);
        }
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }

    fn scroll_to_offset(&self, top: f64) {
        let clamped = top.clamp(0.0, self.max_scroll());
        if clamped == self.scroll_top.get() {
            return;
        }
        self.scroll_top.set(clamped);
        self.events.emit(clamped);
    }

    fn subscribe_scroll(&self, listener: Rc<dyn Fn(f64)>) -> ListenerId {
        self.events.subscribe(listener)
    }

    fn unsubscribe_scroll(&self, id: ListenerId) {
        self.events.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::segment::split_blocks;

    fn panel(md: &str, cols: u16, rows: u16) -> Rc<Panel> {
        let p = Panel::new("original", split_blocks(md));
        p.set_viewport(Viewport { cols, rows });
        p.measure_segments();
        p
    }

    #[test]
    fn unready_until_viewport_is_set() {
        let p = Panel::new("original", split_blocks("hello\n"));
        assert!(!p.is_ready());
        assert!(p.segment_positions().is_empty());
        // measure without a viewport is a no-op
        p.measure_segments();
        assert!(p.lines().is_empty());
    }

    #[test]
    fn long_lines_wrap_to_viewport_width() {
        let p = panel("aaa bbb ccc ddd\n", 7, 10);
        // "aaa bbb" / "ccc ddd" / separator
        assert_eq!(p.total_rows(), 3);
        assert!(p.lines().iter().all(|l| l.chars().count() <= 7));
    }

    #[test]
    fn positions_tile_without_gaps() {
        let p = panel("one one one\n\ntwo\n\nthree three\n", 5, 4);
        let positions = p.segment_positions();
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0].top, 0.0);
        for pair in positions.windows(2) {
            assert_eq!(pair[0].top + pair[0].height, pair[1].top);
        }
        let last = positions.last().unwrap();
        assert_eq!(last.top + last.height, p.total_rows() as f64);
    }

    #[test]
    fn scroll_clamps_to_range() {
        let p = panel("a\n\nb\n\nc\n\nd\n\ne\n", 10, 4);
        p.scroll_to_offset(9999.0);
        assert_eq!(p.scroll_top(), p.max_scroll());
        p.scroll_by(-9999.0);
        assert_eq!(p.scroll_top(), 0.0);
    }

    #[test]
    fn content_shorter_than_viewport_cannot_scroll() {
        let p = panel("only\n", 10, 20);
        p.scroll_by(5.0);
        assert_eq!(p.scroll_top(), 0.0);
    }

    #[test]
    fn events_fire_on_change_only() {
        let p = panel("a\n\nb\n\nc\n\nd\n\ne\n", 10, 4);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let id = {
            let seen = seen.clone();
            p.subscribe_scroll(Rc::new(move |top| seen.borrow_mut().push(top)))
        };

        p.scroll_by(3.0);
        p.scroll_by(0.0); // no change, no event
        p.scroll_to_offset(3.0); // already there, no event
        assert_eq!(*seen.borrow(), vec![3.0]);

        p.unsubscribe_scroll(id);
        p.scroll_by(2.0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn remeasure_after_reload_clamps_scroll() {
        let p = panel("a\n\nb\n\nc\n\nd\n\ne\n\nf\n\ng\n", 10, 4);
        p.scroll_to_offset(p.max_scroll());
        assert!(p.scroll_top() > 0.0);
        p.replace_blocks(split_blocks("a\n"));
        p.measure_segments();
        assert_eq!(p.scroll_top(), 0.0);
        assert_eq!(p.segment_positions().len(), 1);
    }

    #[test]
    fn narrower_viewport_grows_segment_heights() {
        let wide = panel("alpha beta gamma delta\n", 30, 10);
        let narrow = panel("alpha beta gamma delta\n", 6, 10);
        let h_wide = wide.segment_positions()[0].height;
        let h_narrow = narrow.segment_positions()[0].height;
        assert!(h_narrow > h_wide);
    }
}
