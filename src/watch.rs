//! File watching for live rebuilds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌───────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ classify │───▶│ Runner::rerun     │
//! │ events   │    │ (300ms)   │    │ → Task   │    │ + reload browsers │
//! └──────────┘    └───────────┘    └──────────┘    └───────────────────┘
//! ```
//!
//! | Changed path | Task |
//! |--------------|------|
//! | under the style directory | `styles` |
//! | under the assets directory | `assets` |
//! | other `.md` under content | `pages` |
//!
//! Editor artifacts (swap files, backups, dotfiles) are ignored. A batch runs
//! to completion before the next one is taken, and every page rebuild starts
//! from a fresh keyword index.

use crate::log;
use crate::tasks::{Runner, Task};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;

const DEBOUNCE_MS: u64 = 300;

/// How often the loop wakes to check for shutdown.
const TICK_MS: u64 = 100;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("file watcher: {0}")]
    Notify(#[from] notify::Error),
}

/// Which changes a watch loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchScope {
    /// Content, assets and styles.
    All,
    /// Style sheets only.
    Styles,
}

// =============================================================================
// Path classification
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
}

/// Watched directories, resolved once so event paths compare reliably.
#[derive(Debug, Clone)]
pub struct WatchRoots {
    content: PathBuf,
    assets: PathBuf,
    style: PathBuf,
}

impl WatchRoots {
    pub fn new(config: &crate::config::Config) -> Self {
        Self {
            content: resolve(&config.content_dir()),
            assets: resolve(&config.assets_dir()),
            style: resolve(&config.style_dir()),
        }
    }

    /// The task a change to `path` calls for, if any.
    pub fn classify(&self, path: &Path, scope: WatchScope) -> Option<Task> {
        if is_temp_file(path) {
            return None;
        }
        let path = resolve(path);

        if path.starts_with(&self.style) {
            return Some(Task::Styles);
        }
        if scope == WatchScope::Styles {
            return None;
        }
        if path.starts_with(&self.assets) {
            return Some(Task::Assets);
        }
        if path.starts_with(&self.content) {
            let is_markdown = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("md"));
            // Extension-less paths are directories, possibly already removed.
            if is_markdown || path.extension().is_none() {
                return Some(Task::Pages);
            }
        }
        None
    }

    /// Directories to watch recursively. Assets outside content get their own watch.
    fn dirs(&self, scope: WatchScope) -> Vec<&Path> {
        match scope {
            WatchScope::All => {
                let mut dirs = vec![self.content.as_path(), self.style.as_path()];
                if !self.assets.starts_with(&self.content) {
                    dirs.push(self.assets.as_path());
                }
                dirs
            }
            WatchScope::Styles => vec![self.style.as_path()],
        }
    }
}

/// Canonicalize what exists; for removed files, canonicalize the parent.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events until they settle.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: BTreeSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn add(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.pending.extend(paths);
        self.last_event = Some(Instant::now());
    }

    /// True once events are pending and none arrived for the debounce window.
    pub fn ready(&self) -> bool {
        self.ready_after(Duration::from_millis(DEBOUNCE_MS))
    }

    fn ready_after(&self, quiet: Duration) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= quiet)
    }

    pub fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Watch for changes and rerun the affected tasks until shutdown.
pub fn watch(runner: &mut Runner, scope: WatchScope) -> Result<(), WatchError> {
    let roots = WatchRoots::new(runner.config());

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    for dir in roots.dirs(scope) {
        if dir.exists() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
            log!("watch"; "{}", dir.display());
        }
    }

    let mut debouncer = Debouncer::default();
    while !runner.shutdown_flag().load(Ordering::Relaxed) {
        match rx.recv_timeout(Duration::from_millis(TICK_MS)) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event.paths),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) => {
                if !debouncer.ready() {
                    continue;
                }
                let changed = debouncer.take();
                let tasks: BTreeSet<Task> = changed
                    .iter()
                    .filter_map(|p| roots.classify(p, scope))
                    .collect();
                if tasks.is_empty() {
                    continue;
                }
                let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
                log!("watch"; "{} changed, running {}", changed.len(), names.join(", "));
                runner.rerun(&tasks);
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn temp_files_detected() {
        assert!(is_temp_file(Path::new("content/.010-intro.md.swp")));
        assert!(is_temp_file(Path::new("content/010-intro.md~")));
        assert!(is_temp_file(Path::new("content/#010-intro.md#")));
        assert!(is_temp_file(Path::new("style/main.css.bak")));
        assert!(!is_temp_file(Path::new("content/010-intro.md")));
    }

    #[test]
    fn classify_by_location() {
        let tmp = setup_fixtures();
        let roots = WatchRoots::new(&fixture_config(tmp.path()));
        let p = |rel: &str| tmp.path().join(rel);

        assert_eq!(
            roots.classify(&p("style/base.css"), WatchScope::All),
            Some(Task::Styles)
        );
        assert_eq!(
            roots.classify(&p("content/assets/img/dot.gif"), WatchScope::All),
            Some(Task::Assets)
        );
        assert_eq!(
            roots.classify(&p("content/index/010-intro.md"), WatchScope::All),
            Some(Task::Pages)
        );
        assert_eq!(
            roots.classify(&p("content/notes.txt"), WatchScope::All),
            None
        );
    }

    #[test]
    fn assets_inside_content_share_the_content_watch() {
        let tmp = setup_fixtures();
        let roots = WatchRoots::new(&fixture_config(tmp.path()));
        assert_eq!(roots.dirs(WatchScope::All).len(), 2);
    }

    #[test]
    fn assets_outside_content_are_watched() {
        let tmp = setup_fixtures();
        std::fs::rename(
            tmp.path().join("content/assets"),
            tmp.path().join("static-files"),
        )
        .unwrap();
        let mut config = fixture_config(tmp.path());
        config.paths.assets = "static-files".to_string();
        let roots = WatchRoots::new(&config);

        let assets = tmp.path().join("static-files").canonicalize().unwrap();
        assert!(roots.dirs(WatchScope::All).contains(&assets.as_path()));
        assert!(!roots.dirs(WatchScope::Styles).contains(&assets.as_path()));
        assert_eq!(
            roots.classify(&tmp.path().join("static-files/notes.txt"), WatchScope::All),
            Some(Task::Assets)
        );
    }

    #[test]
    fn classify_removed_file() {
        let tmp = setup_fixtures();
        let roots = WatchRoots::new(&fixture_config(tmp.path()));
        let gone = tmp.path().join("content/index/050-removed.md");
        assert_eq!(roots.classify(&gone, WatchScope::All), Some(Task::Pages));
    }

    #[test]
    fn styles_scope_ignores_content() {
        let tmp = setup_fixtures();
        let roots = WatchRoots::new(&fixture_config(tmp.path()));
        assert_eq!(
            roots.classify(&tmp.path().join("content/hyoshi.md"), WatchScope::Styles),
            None
        );
        assert_eq!(
            roots.classify(&tmp.path().join("style/main.css"), WatchScope::Styles),
            Some(Task::Styles)
        );
    }

    #[test]
    fn temp_files_never_classified() {
        let tmp = setup_fixtures();
        let roots = WatchRoots::new(&fixture_config(tmp.path()));
        assert_eq!(
            roots.classify(&tmp.path().join("style/.main.css.swp"), WatchScope::All),
            None
        );
    }

    #[test]
    fn debouncer_waits_for_quiet() {
        let mut d = Debouncer::default();
        assert!(!d.ready());
        d.add([PathBuf::from("a.md")]);
        assert!(!d.ready());
        assert!(d.ready_after(Duration::ZERO));
    }

    #[test]
    fn debouncer_take_drains_deduplicated() {
        let mut d = Debouncer::default();
        d.add([PathBuf::from("b.md"), PathBuf::from("a.md")]);
        d.add([PathBuf::from("a.md")]);
        assert_eq!(d.take(), vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
        assert!(!d.ready_after(Duration::ZERO));
    }
}
