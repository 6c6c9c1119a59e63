//! JWalk-based preorder scanner.

use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use hivesync_core::{FileConfig, FileError};

use crate::ordered::OrderedPaths;

/// Produces preorder snapshots of a subtree using jwalk.
#[derive(Debug, Clone)]
pub struct PreorderScanner {
    follow_symlinks: bool,
    include_hidden: bool,
}

impl PreorderScanner {
    /// Create a scanner that includes hidden entries and does not follow links.
    pub fn new() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
        }
    }

    /// Create a scanner using the traversal options of a file config.
    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            follow_symlinks: config.follow_symlinks,
            include_hidden: config.include_hidden,
        }
    }

    /// Collect the subtree rooted at `root` in deterministic preorder.
    ///
    /// The root comes first, each child subtree is complete before the next
    /// sibling starts, and siblings are ordered by name. A file or an empty
    /// directory yields a single-element sequence.
    pub fn ordered_paths(&self, root: &Path) -> Result<OrderedPaths, FileError> {
        let metadata = std::fs::symlink_metadata(root).map_err(|e| FileError::io(root, e))?;
        let is_dir = if self.follow_symlinks {
            root.is_dir()
        } else {
            metadata.is_dir()
        };

        if !is_dir {
            return Ok(OrderedPaths::single(root));
        }

        let descendants = self.collect_descendants(root)?;
        debug!(
            root = %root.display(),
            count = descendants.len(),
            "collected subtree"
        );

        Ok(OrderedPaths::from_descendants(
            root.to_path_buf(),
            descendants,
        ))
    }

    /// Collect every entry below `root` (the root excluded).
    fn collect_descendants(&self, root: &Path) -> Result<Vec<PathBuf>, FileError> {
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            })
            .skip_hidden(!self.include_hidden)
            .follow_links(self.follow_symlinks)
            .min_depth(1);

        let mut descendants = Vec::new();
        for entry_result in walker {
            // A missing entry would silently drop a file from the plan.
            let entry = entry_result.map_err(|err| {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                match err.into_io_error() {
                    Some(source) => FileError::io(path, source),
                    None => FileError::Io {
                        path,
                        source: std::io::Error::other("filesystem loop detected"),
                    },
                }
            })?;
            descendants.push(entry.path());
        }

        Ok(descendants)
    }
}

impl Default for PreorderScanner {
    fn default() -> Self {
        Self::new()
    }
}
