//! Error types for file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced synchronously when an operation is requested.
///
/// Anything returned as a `FileError` means nothing was scheduled: fix the
/// cause and retry.
#[derive(Debug, Error)]
pub enum FileError {
    /// No session is bound to the local peer.
    #[error("No active session")]
    NoSession,

    /// The local peer is not connected to any remote peer.
    #[error("Peer is not connected to the network")]
    NoPeerConnection,

    /// The network layer is not initialized or unreachable.
    #[error("Network is not available")]
    NoNetwork,

    /// Target is not a valid directory under the managed root.
    #[error("Illegal file location: {path}")]
    InvalidLocation { path: PathBuf },

    /// Target path or requested version is absent.
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// Malformed selector, permission or path pair.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No async runtime is available to run submitted work.
    #[error("Runtime unavailable: {message}")]
    Runtime { message: String },
}

impl FileError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSession => ErrorKind::NoSession,
            Self::NoPeerConnection => ErrorKind::NoPeerConnection,
            Self::NoNetwork => ErrorKind::NoNetwork,
            Self::InvalidLocation { .. } => ErrorKind::InvalidLocation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Io { .. } => ErrorKind::Io,
            Self::Runtime { .. } => ErrorKind::Internal,
        }
    }

    /// Whether this is one of the session/connectivity precondition errors.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NoSession | Self::NoPeerConnection | Self::NoNetwork)
    }
}

/// Discriminant shared by synchronous and asynchronous errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NoSession,
    NoPeerConnection,
    NoNetwork,
    InvalidLocation,
    NotFound,
    InvalidArgument,
    /// Local file-system failure.
    Io,
    /// Failure reported by the distributed store.
    Remote,
    /// Execution stopped by a cancellation request.
    Cancelled,
    /// A leaf panicked or the executor lost a task.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => write!(f, "No session"),
            Self::NoPeerConnection => write!(f, "No peer connection"),
            Self::NoNetwork => write!(f, "No network"),
            Self::InvalidLocation => write!(f, "Invalid location"),
            Self::NotFound => write!(f, "Not found"),
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::Io => write!(f, "I/O error"),
            Self::Remote => write!(f, "Remote error"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Internal => write!(f, "Internal error"),
        }
    }
}

/// An error recorded on a handle while its operation tree was executing.
///
/// These are never returned to the submitter; they are observed by polling
/// or awaiting the handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Label of the leaf operation that failed, if known.
    pub leaf: Option<String>,
    /// A human-readable error message.
    pub message: String,
}

impl ExecutionError {
    /// Create a new execution error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            leaf: None,
            message: message.into(),
        }
    }

    /// Create a remote (distributed store) error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Remote, message)
    }

    /// Create a cancellation marker.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "Operation cancelled")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach the failing leaf's label unless one is already set.
    pub fn with_leaf(mut self, leaf: impl Into<String>) -> Self {
        if self.leaf.is_none() {
            self.leaf = Some(leaf.into());
        }
        self
    }

    /// Check if this error only marks a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.leaf {
            Some(leaf) => write!(f, "{} ({}): {}", self.kind, leaf, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<FileError> for ExecutionError {
    fn from(err: FileError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
