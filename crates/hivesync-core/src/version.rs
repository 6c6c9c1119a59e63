//! File version metadata and version selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FileError;

/// Metadata of one stored version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion {
    /// Version index, increasing with every update.
    pub index: u32,
    /// Size of the content in bytes.
    pub size: u64,
    /// When this version was created.
    pub created: DateTime<Utc>,
}

impl FileVersion {
    /// Create new version metadata.
    pub fn new(index: u32, size: u64, created: DateTime<Utc>) -> Self {
        Self {
            index,
            size,
            created,
        }
    }
}

/// Strategy for picking the version to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionSelector {
    /// The n-th version before the current one (1 = the one just before).
    Previous(u32),
    /// The version with exactly this index.
    Index(u32),
    /// The newest version created strictly before this instant.
    Before(DateTime<Utc>),
}

impl VersionSelector {
    /// Reject selectors that can never match a version.
    pub fn validate(&self) -> Result<(), FileError> {
        match self {
            Self::Previous(0) => Err(FileError::invalid_argument(
                "Version offset must be at least 1; offset 0 is the current version",
            )),
            _ => Ok(()),
        }
    }

    /// Pick a version from `versions`.
    ///
    /// The slice may be in any order; the current version is the one with
    /// the highest index and is never selected by `Previous`.
    pub fn select<'a>(&self, versions: &'a [FileVersion]) -> Option<&'a FileVersion> {
        match *self {
            Self::Previous(offset) => {
                let mut sorted: Vec<&FileVersion> = versions.iter().collect();
                sorted.sort_by(|a, b| b.index.cmp(&a.index));
                sorted.get(offset as usize).copied()
            }
            Self::Index(index) => versions.iter().find(|v| v.index == index),
            Self::Before(instant) => versions
                .iter()
                .filter(|v| v.created < instant)
                .max_by_key(|v| (v.created, v.index)),
        }
    }
}
