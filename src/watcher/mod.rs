use crate::ignore::IgnoreFilter;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

/// A stylesheet whose content changed or disappeared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

struct WatchRoot {
    path: PathBuf,
    filter: Option<IgnoreFilter>,
}

/// Watches files and directories, reporting `.css` files whose content hash changed
pub struct Watcher {
    roots: Vec<WatchRoot>,
    hashes: HashMap<PathBuf, blake3::Hash>,
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Watcher {
    pub fn new(paths: &[PathBuf], excludes: &[String]) -> Self {
        let roots = paths
            .iter()
            .map(|path| {
                let path = canonical(path);
                let filter = path.is_dir().then(|| IgnoreFilter::new(&path, excludes));
                WatchRoot { path, filter }
            })
            .collect();

        Self {
            roots,
            hashes: HashMap::new(),
        }
    }

    /// Record current content hashes so unchanged files are not re-reported
    pub fn prime(&mut self, files: &[PathBuf]) {
        for file in files {
            self.record(&canonical(file));
        }
    }

    /// Whether a path is a stylesheet under a watched root and not excluded
    pub fn is_relevant(&self, path: &Path) -> bool {
        let is_css = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));

        self.roots.iter().any(|root| match &root.filter {
            None => root.path == path,
            Some(filter) => is_css && path.starts_with(&root.path) && !filter.is_ignored_path(path),
        })
    }

    /// Hash the file; true when it is new or its content differs
    fn record(&mut self, path: &Path) -> bool {
        let Ok(content) = std::fs::read(path) else {
            return false;
        };
        let hash = blake3::hash(&content);
        self.hashes.insert(path.to_path_buf(), hash) != Some(hash)
    }

    /// Translate a filesystem event into stylesheet changes
    pub fn handle_event(&mut self, event: notify::Event) -> Vec<WatchEvent> {
        let mut changes = Vec::new();
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in event.paths {
                    if !self.is_relevant(&path) {
                        continue;
                    }
                    if path.is_file() {
                        if self.record(&path) {
                            changes.push(WatchEvent::Changed(path));
                        }
                    } else if self.hashes.remove(&path).is_some() {
                        // renamed away
                        changes.push(WatchEvent::Removed(path));
                    }
                }
            }
            EventKind::Remove(_) => {
                for path in event.paths {
                    if self.hashes.remove(&path).is_some() {
                        changes.push(WatchEvent::Removed(path));
                    }
                }
            }
            _ => {}
        }
        changes
    }

    /// Block, calling `on_change` for every relevant change until the watcher fails
    pub fn run<F>(&mut self, mut on_change: F) -> anyhow::Result<()>
    where
        F: FnMut(&WatchEvent),
    {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

        for root in &self.roots {
            let mode = if root.filter.is_some() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher.watch(&root.path, mode)?;
            tracing::debug!("watching {}", root.path.display());
        }

        for res in rx {
            match res {
                Ok(event) => {
                    for change in self.handle_event(event) {
                        on_change(&change);
                    }
                }
                Err(e) => tracing::warn!("watch error: {:?}", e),
            }
        }

        Ok(())
    }
}
