//! Terminal I/O layer: raw mode, pane and status bar drawing.

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};
use unicode_width::UnicodeWidthChar;

use super::{Layout, PaneRect};
use crate::panel::Panel;
use crate::sync::Side;

// ---------------------------------------------------------------------------
// RawGuard — Drop で raw mode / alternate screen / mouse capture を確実に復元
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(crossterm::event::EnableMouseCapture)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(crossterm::event::DisableMouseCapture);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters. crossterm's `use-dev-tty` reads keyboard from
    // /dev/tty (Unix) or Console API (Windows), so stdin being a pipe is
    // always fine.
    if !io::stdout().is_terminal() {
        anyhow::bail!("tandem requires an interactive terminal");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Everything the status bar needs for one frame.
pub(super) struct StatusLine<'a> {
    pub original_name: &'a str,
    pub translated_name: &'a str,
    pub focus: Side,
    pub sync_on: bool,
    /// Scroll percentage of the focused pane.
    pub pct: u32,
    pub acc_peek: Option<u32>,
    pub flash: Option<&'a str>,
}

/// Full redraw: both panes, the divider column, and the status bar.
pub(super) fn draw(
    layout: &Layout,
    original: &Panel,
    translated: &Panel,
    status: &StatusLine<'_>,
) -> io::Result<()> {
    let mut out = stdout();
    draw_pane(&mut out, &layout.left, original)?;
    draw_pane(&mut out, &layout.right, translated)?;
    for row in 0..layout.left.rows {
        out.queue(cursor::MoveTo(layout.divider_col, row))?;
        write!(out, "{}", "│".dark_grey())?;
    }
    draw_status_bar(&mut out, layout, status)?;
    out.flush()
}

fn draw_pane(out: &mut impl Write, rect: &PaneRect, panel: &Panel) -> io::Result<()> {
    let lines = panel.lines();
    let top = panel.top_row();
    for row in 0..rect.rows {
        out.queue(cursor::MoveTo(rect.x, row))?;
        let text = lines
            .get(top + row as usize)
            .map(String::as_str)
            .unwrap_or("");
        let padded = pad_to_width(text, rect.cols as usize);
        // Headings get a little weight; everything else is plain text.
        if text.starts_with('#') {
            write!(out, "{}", padded.bold())?;
        } else {
            write!(out, "{padded}")?;
        }
    }
    Ok(())
}

/// ステータスバーをターミナル最終行に描画。
///
/// `acc_peek`: 数字蓄積中なら `:12_` のように表示
/// `flash`: リロード等の一時メッセージ（次のキー入力でクリア)
fn draw_status_bar(
    out: &mut impl Write,
    layout: &Layout,
    status: &StatusLine<'_>,
) -> io::Result<()> {
    out.queue(cursor::MoveTo(0, layout.status_row))?;

    let sync = if status.sync_on { "sync:on" } else { "sync:off" };
    let names = format!("{} ⇄ {}", status.original_name, status.translated_name);

    let middle = if let Some(msg) = status.flash {
        format!(" {names} | {msg} | {}%", status.pct)
    } else if let Some(n) = status.acc_peek {
        format!(
            " {names} | :{n}_ | focus:{} | {sync} | {}%",
            status.focus.label(),
            status.pct
        )
    } else {
        format!(
            " {names} | focus:{} | {sync} | {}%  [Tab:focus s:sync j/k d/u g/G r:measure q:quit]",
            status.focus.label(),
            status.pct
        )
    };

    let padded = pad_to_width(&middle, layout.total_cols as usize);
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    Ok(())
}

/// Clip `text` to at most `width` terminal columns and pad the remainder
/// with spaces. Display-width aware (CJK translations are the common
/// case here, not the exception).
fn pad_to_width(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut used = 0usize;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        result.push(c);
        used += w;
    }
    for _ in used..width {
        result.push(' ');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_fills_short_text() {
        assert_eq!(pad_to_width("ab", 5), "ab   ");
    }

    #[test]
    fn pad_clips_long_text() {
        assert_eq!(pad_to_width("abcdef", 4), "abcd");
    }

    #[test]
    fn pad_counts_wide_chars_as_two_columns() {
        // "日" is two columns; three of them don't fit in five.
        assert_eq!(pad_to_width("日日日", 5), "日日 ");
    }
}
