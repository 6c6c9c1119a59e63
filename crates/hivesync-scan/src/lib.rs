//! Subtree traversal for hivesync.
//!
//! This crate turns a directory on disk into an [`OrderedPaths`] sequence:
//! a one-shot preorder snapshot used to plan recursive add and delete
//! operations.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use hivesync_scan::PreorderScanner;
//!
//! let scanner = PreorderScanner::new();
//! let ordered = scanner.ordered_paths(Path::new("/path/to/folder")).unwrap();
//!
//! for path in &ordered {
//!     println!("{}", path.display());
//! }
//! ```

mod ordered;
mod scanner;

pub use ordered::OrderedPaths;
pub use scanner::PreorderScanner;

// Re-export core types for convenience
pub use hivesync_core::{FileConfig, FileError};
