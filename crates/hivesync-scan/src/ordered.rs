//! Preorder path sequences.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use hivesync_core::FileError;

/// Paths of a subtree in preorder.
///
/// The first element is the traversal root, and every other path has its
/// parent at a smaller index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPaths {
    paths: Vec<PathBuf>,
}

impl OrderedPaths {
    /// Sequence containing only `root`.
    pub fn single(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![root.into()],
        }
    }

    /// Build a sequence from paths already in preorder, checking the ordering.
    pub fn from_preorder(paths: Vec<PathBuf>) -> Result<Self, FileError> {
        let Some(root) = paths.first() else {
            return Err(FileError::invalid_argument("Path sequence is empty"));
        };

        let mut seen: HashSet<&Path> = HashSet::with_capacity(paths.len());
        seen.insert(root.as_path());

        for path in &paths[1..] {
            if !path.starts_with(root) || path == root {
                return Err(FileError::invalid_argument(format!(
                    "{} is not below the root {}",
                    path.display(),
                    root.display()
                )));
            }
            let parent_seen = path.parent().is_some_and(|parent| seen.contains(parent));
            if !parent_seen {
                return Err(FileError::invalid_argument(format!(
                    "{} appears before its parent",
                    path.display()
                )));
            }
            if !seen.insert(path.as_path()) {
                return Err(FileError::invalid_argument(format!(
                    "{} appears twice",
                    path.display()
                )));
            }
        }

        Ok(Self { paths })
    }

    /// Assemble from a root and its descendants in any order.
    ///
    /// Descendants are sorted component-wise, which yields preorder with
    /// siblings ordered by name.
    pub(crate) fn from_descendants(root: PathBuf, mut descendants: Vec<PathBuf>) -> Self {
        descendants.sort();
        descendants.dedup();

        let mut paths = Vec::with_capacity(descendants.len() + 1);
        paths.push(root);
        paths.extend(descendants);
        Self { paths }
    }

    /// The traversal root.
    pub fn root(&self) -> &Path {
        &self.paths[0]
    }

    /// Number of paths, the root included.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the sequence holds no paths. Never true for a scanned
    /// sequence, which always includes its root.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether the sequence holds only its root.
    pub fn is_single(&self) -> bool {
        self.paths.len() == 1
    }

    /// Iterate over the paths in preorder.
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    /// The paths as a slice.
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Consume the sequence.
    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a OrderedPaths {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}
