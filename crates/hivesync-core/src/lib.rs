//! Core types and traits for hivesync.
//!
//! This crate provides the fundamental data structures shared by the
//! hivesync crates: operation requests, version selection, configuration,
//! errors and the network/session view.

mod config;
mod error;
mod network;
mod request;
mod version;

pub use config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_VERSIONS, FileConfig,
    FileConfigBuilder,
};
pub use error::{ErrorKind, ExecutionError, FileError};
pub use network::{NetworkContext, NetworkStatus};
pub use request::{OperationRequest, PermissionGrant, PermissionLevel};
pub use version::{FileVersion, VersionSelector};
