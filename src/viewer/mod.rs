//! Side-by-side terminal viewer: two panes, one scroll engine.
//!
//! Layout:
//!   col 0..left.cols        : original pane
//!   col divider_col         : divider
//!   col right.x..           : translated pane
//!   row term_rows-1         : status bar
//!
//! The event loop owns the deferred-task queue that serves as the sync
//! engine's tick: it is drained once at the top of every iteration, so a
//! rebind requested by `panels_ready` runs after the layout that
//! triggered it has been fully applied.
//!
//! Both panes scroll in whole rows from key and wheel input; offsets the
//! engine writes back are fractional and floored at draw time.

mod input;
mod terminal;

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{self, Event, MouseEvent, MouseEventKind};
use crossterm::terminal as crossterm_terminal;
use log::{debug, info, warn};

use crate::config::Config;
use crate::panel::{Panel, Viewport};
use crate::segment::{Block, split_blocks};
use crate::sync::{PanelHandle, ScrollSync, Side, SyncToggle, TaskQueue};
use crate::watch::PairWatcher;

use input::{Action, InputAccumulator, map_key_event};
use terminal::{RawGuard, StatusLine};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

struct PaneRect {
    x: u16,
    cols: u16,
    rows: u16,
}

struct Layout {
    left: PaneRect,
    right: PaneRect,
    divider_col: u16,
    status_row: u16,
    total_cols: u16,
}

fn compute_layout(term_cols: u16, term_rows: u16) -> Layout {
    let content_rows = term_rows.saturating_sub(1);
    let left_cols = term_cols.saturating_sub(1) / 2;
    let divider_col = left_cols;
    let right_x = divider_col.saturating_add(1).min(term_cols);
    let right_cols = term_cols.saturating_sub(right_x);
    Layout {
        left: PaneRect { x: 0, cols: left_cols, rows: content_rows },
        right: PaneRect { x: right_x, cols: right_cols, rows: content_rows },
        divider_col,
        status_row: term_rows.saturating_sub(1),
        total_cols: term_cols,
    }
}

fn apply_layout(layout: &Layout, original: &Panel, translated: &Panel) {
    // One-column gutter between text and the divider; wrapping uses the
    // narrower width, drawing pads to the full pane.
    original.set_viewport(Viewport {
        cols: layout.left.cols.saturating_sub(1).max(1),
        rows: layout.left.rows,
    });
    translated.set_viewport(Viewport {
        cols: layout.right.cols.saturating_sub(1).max(1),
        rows: layout.right.rows,
    });
}

// ---------------------------------------------------------------------------
// Viewer loop
// ---------------------------------------------------------------------------

/// Run the side-by-side viewer.
///
/// `original_path` and `translated_path` are the two documents to show;
/// `watch_files` reloads either document when it changes on disk.
pub fn run(
    original_path: PathBuf,
    translated_path: PathBuf,
    config: &Config,
    watch_files: bool,
) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let original_name = file_label(&original_path);
    let translated_name = file_label(&translated_path);

    let original = Panel::new("original", load_blocks(&original_path)?);
    let translated = Panel::new("translated", load_blocks(&translated_path)?);

    let queue = Rc::new(TaskQueue::new());
    let sync_enabled = Rc::new(Cell::new(config.sync.enabled));
    let toggle = {
        let enabled = sync_enabled.clone();
        SyncToggle::Live(Rc::new(move || enabled.get()))
    };
    let sync = ScrollSync::new(original.clone(), translated.clone(), toggle, queue.clone());

    // Watchers before raw mode: a bad path should fail to the shell.
    let watcher = if watch_files {
        Some(PairWatcher::new(&original_path, &translated_path)?)
    } else {
        None
    };

    let mut guard = RawGuard::enter()?;

    let (term_cols, term_rows) = crossterm_terminal::size()?;
    let mut layout = compute_layout(term_cols, term_rows);
    apply_layout(&layout, &original, &translated);
    sync.panels_ready();
    // Rebind tick: measure and attach before the first frame.
    queue.drain();

    let mut focus = Side::Original;
    let mut acc = InputAccumulator::new();
    let mut flash: Option<String> = None;
    let mut dirty = false;
    let mut last_render = Instant::now();

    redraw(
        &layout,
        &original,
        &translated,
        (&original_name, &translated_name),
        focus,
        sync_enabled.get(),
        acc.peek(),
        None,
    )?;

    loop {
        queue.drain();

        let timeout = if dirty {
            config.viewer.frame_budget.saturating_sub(last_render.elapsed())
        } else if watcher.is_some() {
            config.viewer.watch_interval
        } else {
            Duration::from_secs(86400)
        };

        if event::poll(timeout)? {
            let ev = event::read()?;
            debug!("event: {:?}", ev);

            match ev {
                Event::Key(key_event) => {
                    let had_flash = flash.is_some();
                    flash = None;

                    let focused = match focus {
                        Side::Original => &original,
                        Side::Translated => &translated,
                    };
                    let step = f64::from(config.viewer.scroll_step);
                    let half_page = f64::from((layout.left.rows / 2).max(1));

                    match map_key_event(key_event, &mut acc) {
                        Some(Action::Quit) => break,

                        Some(Action::ScrollDown(n)) => {
                            focused.scroll_by(f64::from(n) * step);
                            dirty = true;
                        }
                        Some(Action::ScrollUp(n)) => {
                            focused.scroll_by(-(f64::from(n) * step));
                            dirty = true;
                        }
                        Some(Action::HalfPageDown(n)) => {
                            focused.scroll_by(f64::from(n) * half_page);
                            dirty = true;
                        }
                        Some(Action::HalfPageUp(n)) => {
                            focused.scroll_by(-(f64::from(n) * half_page));
                            dirty = true;
                        }
                        Some(Action::JumpToTop) => {
                            focused.scroll_to_offset(0.0);
                            dirty = true;
                        }
                        Some(Action::JumpToBottom) => {
                            focused.scroll_to_offset(focused.max_scroll());
                            dirty = true;
                        }

                        Some(Action::SwitchFocus) => {
                            focus = focus.other();
                            dirty = true;
                        }
                        Some(Action::ToggleSync) => {
                            let now = !sync_enabled.get();
                            sync_enabled.set(now);
                            info!("sync toggled {}", if now { "on" } else { "off" });
                            flash = Some(if now { "sync on" } else { "sync off" }.into());
                            dirty = true;
                        }
                        Some(Action::Refresh) => {
                            sync.refresh_layouts();
                            flash = Some("layouts remeasured".into());
                            dirty = true;
                        }

                        Some(Action::CancelInput) | Some(Action::Digit) => {
                            dirty = true;
                        }
                        None => {
                            // Unknown key: reset accumulator
                            if acc.is_active() {
                                acc.reset();
                                dirty = true;
                            } else if had_flash {
                                dirty = true;
                            }
                        }
                    }
                }

                Event::Mouse(mouse) => {
                    let step = f64::from(config.viewer.scroll_step);
                    if let Some((side, delta)) = map_wheel(&mouse, &layout, step) {
                        let target = match side {
                            Side::Original => &original,
                            Side::Translated => &translated,
                        };
                        target.scroll_by(delta);
                        dirty = true;
                    }
                }

                Event::Resize(new_cols, new_rows) => {
                    info!("resize: {new_cols}x{new_rows}");
                    // ペーンの形が変わる間は unbound に落とし、新しい
                    // レイアウトで測り直してから再アタッチする
                    sync.panels_unavailable();
                    layout = compute_layout(new_cols, new_rows);
                    apply_layout(&layout, &original, &translated);
                    sync.panels_ready();
                    dirty = true;
                }

                _ => {}
            }
            continue;
        }

        // poll timeout → watches first, then redraw under the frame budget
        if let Some(watcher) = &watcher {
            let (original_changed, translated_changed) = watcher.take_changed();
            if original_changed {
                reload(&original, &original_path, &mut flash);
            }
            if translated_changed {
                reload(&translated, &translated_path, &mut flash);
            }
            if original_changed || translated_changed {
                sync.refresh_layouts();
                dirty = true;
            }
        }

        if dirty {
            redraw(
                &layout,
                &original,
                &translated,
                (&original_name, &translated_name),
                focus,
                sync_enabled.get(),
                acc.peek(),
                flash.as_deref(),
            )?;
            dirty = false;
        }
        last_render = Instant::now();
    }

    guard.cleanup();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn redraw(
    layout: &Layout,
    original: &Rc<Panel>,
    translated: &Rc<Panel>,
    names: (&str, &str),
    focus: Side,
    sync_on: bool,
    acc_peek: Option<u32>,
    flash: Option<&str>,
) -> io::Result<()> {
    let focused: &Panel = match focus {
        Side::Original => original,
        Side::Translated => translated,
    };
    let max = focused.max_scroll();
    let pct = if max <= 0.0 {
        100
    } else {
        ((focused.scroll_top() / max) * 100.0).round().clamp(0.0, 100.0) as u32
    };
    terminal::draw(
        layout,
        original,
        translated,
        &StatusLine {
            original_name: names.0,
            translated_name: names.1,
            focus,
            sync_on,
            pct,
            acc_peek,
            flash,
        },
    )
}

fn map_wheel(mouse: &MouseEvent, layout: &Layout, step: f64) -> Option<(Side, f64)> {
    if mouse.row >= layout.status_row {
        return None;
    }
    let side = if mouse.column < layout.divider_col {
        Side::Original
    } else {
        Side::Translated
    };
    match mouse.kind {
        MouseEventKind::ScrollDown => Some((side, step)),
        MouseEventKind::ScrollUp => Some((side, -step)),
        _ => None,
    }
}

fn load_blocks(path: &Path) -> anyhow::Result<Vec<Block>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(split_blocks(&text))
}

/// Reload a document in place. A failed read (editor mid-save) keeps the
/// old content; the watcher will fire again on the next write.
fn reload(panel: &Panel, path: &Path, flash: &mut Option<String>) {
    match fs::read_to_string(path) {
        Ok(text) => {
            panel.replace_blocks(split_blocks(&text));
            info!("reloaded {} ({})", path.display(), panel.label());
            *flash = Some(format!("reloaded {}", file_label(path)));
        }
        Err(e) => {
            warn!("reload {} failed: {e}", path.display());
            *flash = Some(format!("reload failed: {}", file_label(path)));
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_partitions_the_full_width() {
        for cols in [2u16, 3, 79, 80, 81, 200] {
            let layout = compute_layout(cols, 24);
            assert_eq!(
                layout.left.cols + 1 + layout.right.cols,
                cols,
                "cols={cols}"
            );
            assert_eq!(layout.divider_col, layout.left.cols);
            assert_eq!(layout.right.x, layout.divider_col + 1);
        }
    }

    #[test]
    fn layout_reserves_the_status_row() {
        let layout = compute_layout(80, 24);
        assert_eq!(layout.status_row, 23);
        assert_eq!(layout.left.rows, 23);
        assert_eq!(layout.right.rows, 23);
    }

    #[test]
    fn degenerate_terminal_does_not_underflow() {
        let layout = compute_layout(0, 0);
        assert_eq!(layout.left.cols, 0);
        assert_eq!(layout.right.cols, 0);
        assert_eq!(layout.left.rows, 0);
    }
}
