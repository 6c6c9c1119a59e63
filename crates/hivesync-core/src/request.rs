//! Operation request types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::version::VersionSelector;

/// Access level granted when sharing a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Grantee may read the shared folder.
    Read,
    /// Grantee may read and modify the shared folder.
    Write,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// A permission handed to another user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Identity of the user receiving access.
    pub grantee: String,
    /// Level of access.
    pub level: PermissionLevel,
}

impl PermissionGrant {
    /// Create a new permission grant.
    pub fn new(grantee: impl Into<String>, level: PermissionLevel) -> Self {
        Self {
            grantee: grantee.into(),
            level,
        }
    }
}

/// A user-level file operation, handed to the operation builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationRequest {
    /// Upload a new file or directory entry.
    Add { path: PathBuf },
    /// Upload a new version of a tracked file.
    Update { path: PathBuf },
    /// Move or rename a tracked entry.
    Move {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Remove a tracked entry.
    Delete { path: PathBuf },
    /// Restore an older version of a file next to the current one.
    Recover {
        path: PathBuf,
        selector: VersionSelector,
    },
    /// Share a folder with another user.
    Share {
        path: PathBuf,
        grant: PermissionGrant,
    },
    /// List all files known to the distributed store.
    List,
}

impl OperationRequest {
    /// Create an add request.
    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self::Add { path: path.into() }
    }

    /// Create an update request.
    pub fn update(path: impl Into<PathBuf>) -> Self {
        Self::Update { path: path.into() }
    }

    /// Create a move request.
    pub fn move_to(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Move {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Create a delete request.
    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self::Delete { path: path.into() }
    }

    /// Create a recover request.
    pub fn recover(path: impl Into<PathBuf>, selector: VersionSelector) -> Self {
        Self::Recover {
            path: path.into(),
            selector,
        }
    }

    /// Create a share request.
    pub fn share(path: impl Into<PathBuf>, grant: PermissionGrant) -> Self {
        Self::Share {
            path: path.into(),
            grant,
        }
    }

    /// The path this request acts on (the source, for moves).
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Add { path }
            | Self::Update { path }
            | Self::Delete { path }
            | Self::Recover { path, .. }
            | Self::Share { path, .. } => Some(path),
            Self::Move { source, .. } => Some(source),
            Self::List => None,
        }
    }

    /// Short verb naming the request.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Move { .. } => "move",
            Self::Delete { .. } => "delete",
            Self::Recover { .. } => "recover",
            Self::Share { .. } => "share",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for OperationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move {
                source,
                destination,
            } => write!(f, "move {} -> {}", source.display(), destination.display()),
            Self::Share { path, grant } => write!(
                f,
                "share {} with {} ({})",
                path.display(),
                grant.grantee,
                grant.level
            ),
            Self::List => write!(f, "list"),
            other => match other.path() {
                Some(path) => write!(f, "{} {}", other.verb(), path.display()),
                None => write!(f, "{}", other.verb()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_display() {
        assert_eq!(OperationRequest::add("/a/b").to_string(), "add /a/b");
        assert_eq!(
            OperationRequest::move_to("/a", "/b").to_string(),
            "move /a -> /b"
        );
        assert_eq!(
            OperationRequest::share("/s", PermissionGrant::new("bob", PermissionLevel::Write))
                .to_string(),
            "share /s with bob (write)"
        );
        assert_eq!(OperationRequest::List.to_string(), "list");
    }

    #[test]
    fn test_request_path() {
        assert_eq!(
            OperationRequest::move_to("/a", "/b").path(),
            Some(Path::new("/a"))
        );
        assert_eq!(OperationRequest::List.path(), None);
    }
}
