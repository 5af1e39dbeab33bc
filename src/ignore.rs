use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        // Build output and vendored styles
        let defaults = [
            "node_modules/", "vendor/", "dist/", "build/", "out/", "coverage/",
            ".git/", ".next/", ".nuxt/", ".cache/", "target/",
            "*.min.css", "*.map",
        ];

        for pattern in defaults {
            builder.add_line(None, pattern).ok();
        }

        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("ignoring invalid exclude pattern '{}': {}", pattern, e);
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }

    /// Like [`is_ignored`](Self::is_ignored), but also matches excluded parent directories
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        let root = self.inner.path();
        if root.as_os_str().is_empty() || !path.starts_with(root) {
            return false;
        }
        self.inner.matched_path_or_any_parents(path, false).is_ignore()
    }
}

fn is_css(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
}

/// Expand files and directories into a sorted, deduplicated list of `.css` files.
///
/// Files named explicitly are kept even when an exclude would match them.
pub fn collect_css_files(paths: &[PathBuf], extra_excludes: &[String]) -> crate::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in paths {
        let metadata = std::fs::metadata(root)?;
        if metadata.is_file() {
            files.push(root.clone());
            continue;
        }

        let filter = IgnoreFilter::new(root, extra_excludes);
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !filter.is_ignored(entry.path(), is_dir)
            })
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|t| t.is_file()) && is_css(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => tracing::warn!("skipping unreadable entry: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(files = files.len(), "collected stylesheets");
    Ok(files)
}
