//! Orchestration core of a peer-to-peer file synchronization client.
//!
//! `hivesync` turns user-level file requests (add, update, move, delete,
//! recover, share, list) into dependency-ordered operation trees, wraps each
//! tree in a cancellable handle and runs it asynchronously. Submission fails
//! fast when the session or the network is unavailable.
//!
//! The per-file work against the distributed store is supplied by an
//! [`OperationBuilder`]; connectivity comes from a [`NetworkContext`].
//!
//! # Example
//!
//! ```
//! use hivesync::{FileError, NetworkStatus, Preconditions};
//!
//! let status = NetworkStatus::online();
//! assert!(Preconditions::Standard.check(&status).is_ok());
//!
//! status.set_session(false);
//! assert!(matches!(
//!     Preconditions::Standard.check(&status),
//!     Err(FileError::NoSession)
//! ));
//! // Listing only needs the network.
//! assert!(Preconditions::NetworkOnly.check(&status).is_ok());
//! ```

pub use hivesync_core::*;
pub use hivesync_ops::*;
pub use hivesync_scan::{OrderedPaths, PreorderScanner};
