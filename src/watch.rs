//! File watcher — monitors the two source documents via notify (inotify
//! on Linux).
//!
//! notify::RecommendedWatcher runs callbacks on an internal thread; the
//! watchers bridge change notifications to the main thread through one
//! mpsc::channel, tagged with which pane's document changed.

use std::path::Path;
use std::sync::mpsc;

use anyhow::Result;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::sync::Side;

pub struct PairWatcher {
    rx: mpsc::Receiver<Side>,
    // Drop stops watching
    _watchers: Vec<RecommendedWatcher>,
}

impl PairWatcher {
    /// Watch both source files for modification.
    ///
    /// Linux inotify loses the watch on rename (atomic save), so each
    /// watcher covers the file's parent directory (NonRecursive) and
    /// filters events by path.
    pub fn new(original: &Path, translated: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watchers = vec![
            watch_file(original, Side::Original, tx.clone())?,
            watch_file(translated, Side::Translated, tx)?,
        ];
        Ok(Self { rx, _watchers: watchers })
    }

    /// Which sides changed since the last check (non-blocking). Multiple
    /// queued notifications per side collapse into one.
    pub fn take_changed(&self) -> (bool, bool) {
        let mut original = false;
        let mut translated = false;
        while let Ok(side) = self.rx.try_recv() {
            match side {
                Side::Original => original = true,
                Side::Translated => translated = true,
            }
        }
        (original, translated)
    }
}

fn watch_file(path: &Path, side: Side, tx: mpsc::Sender<Side>) -> Result<RecommendedWatcher> {
    let canonical = path.canonicalize()?;
    let target = canonical.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let matches = event.paths.iter().any(|p| p == &target);
                if matches && event.kind.is_modify() {
                    let _ = tx.send(side);
                }
            }
        },
        notify::Config::default(),
    )?;
    let parent = canonical
        .parent()
        .ok_or_else(|| anyhow::anyhow!("cannot watch root path"))?;
    watcher.watch(parent, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
