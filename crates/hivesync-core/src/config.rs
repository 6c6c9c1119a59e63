//! File configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default maximum size of a single file (25 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Default number of versions kept per file.
pub const DEFAULT_MAX_VERSIONS: u32 = 100;

/// Default chunk size used when splitting file content (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Configuration of the managed file tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FileConfig {
    /// Root of the synchronized tree.
    pub root: PathBuf,

    /// Largest file accepted, in bytes.
    #[builder(default = "DEFAULT_MAX_FILE_SIZE")]
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Maximum number of versions kept per file.
    #[builder(default = "DEFAULT_MAX_VERSIONS")]
    #[serde(default = "default_max_versions")]
    pub max_versions: u32,

    /// Upper bound on the summed size of all versions of a file.
    #[builder(default = "DEFAULT_MAX_FILE_SIZE * DEFAULT_MAX_VERSIONS as u64")]
    #[serde(default = "default_max_size_all_versions")]
    pub max_size_all_versions: u64,

    /// Chunk size used by the storage layer.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Follow symbolic links while walking a subtree.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_versions() -> u32 {
    DEFAULT_MAX_VERSIONS
}

fn default_max_size_all_versions() -> u64 {
    DEFAULT_MAX_FILE_SIZE * DEFAULT_MAX_VERSIONS as u64
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl FileConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be positive".to_string());
        }
        let max_file_size = self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);
        if let Some(all) = self.max_size_all_versions {
            if all < max_file_size {
                return Err(format!(
                    "Size of all versions ({all}) is smaller than the max file size ({max_file_size})"
                ));
            }
        }
        Ok(())
    }
}

impl FileConfig {
    /// Create a new file config builder.
    pub fn builder() -> FileConfigBuilder {
        FileConfigBuilder::default()
    }

    /// Create a default config managing the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_versions: DEFAULT_MAX_VERSIONS,
            max_size_all_versions: default_max_size_all_versions(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            follow_symlinks: false,
            include_hidden: true,
        }
    }

    /// Check if a path lies inside the managed root (the root included).
    ///
    /// Purely lexical: `..` components and symlinks are not resolved.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// Path relative to the managed root, if it lies inside it.
    pub fn relative_path<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok()
    }
}
