//! High-level entry point for file operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use hivesync_core::{
    FileConfig, FileError, NetworkContext, OperationRequest, PermissionGrant, PermissionLevel,
    VersionSelector,
};
use hivesync_scan::PreorderScanner;

use crate::builder::OperationBuilder;
use crate::handle::{OperationHandle, wrap, wrap_with_result};
use crate::operation::OperationTree;
use crate::plan::{build_create_tree, build_delete_tree};
use crate::registry::{Preconditions, SubmissionRegistry};

/// Turns file requests into submitted operation handles.
///
/// Every method checks preconditions first, then validates its arguments,
/// plans the work and submits it. Methods return as soon as the work is
/// scheduled; failures during execution are reported on the handle.
pub struct FileManager {
    config: FileConfig,
    builder: Arc<dyn OperationBuilder>,
    registry: SubmissionRegistry,
    scanner: PreorderScanner,
}

impl FileManager {
    /// Create a manager submitting to the current tokio runtime.
    pub fn new(
        config: FileConfig,
        builder: Arc<dyn OperationBuilder>,
        network: Arc<dyn NetworkContext>,
    ) -> Result<Self, FileError> {
        let registry = SubmissionRegistry::new(network)?;
        Ok(Self::with_registry(config, builder, registry))
    }

    /// Create a manager sharing an existing registry.
    pub fn with_registry(
        config: FileConfig,
        builder: Arc<dyn OperationBuilder>,
        registry: SubmissionRegistry,
    ) -> Self {
        let scanner = PreorderScanner::from_config(&config);
        Self {
            config,
            builder,
            registry,
            scanner,
        }
    }

    /// The file configuration this manager was created with.
    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// The registry tracking submitted work.
    pub fn registry(&self) -> &SubmissionRegistry {
        &self.registry
    }

    /// Upload a file, or a directory with everything below it.
    ///
    /// Parents are created before their children.
    pub fn add(&self, path: impl AsRef<Path>) -> Result<OperationHandle, FileError> {
        let path = path.as_ref();
        self.registry.check(Preconditions::Standard)?;

        let tree = if is_non_empty_dir(path, self.config.follow_symlinks)? {
            let sequence = self.scanner.ordered_paths(path)?;
            build_create_tree(&sequence, |p| self.build(&OperationRequest::add(p)))?
        } else {
            self.build(&OperationRequest::add(path))?
        };

        self.submit(tree, OperationRequest::add(path))
    }

    /// Upload a new version of an existing file.
    pub fn update(&self, path: impl AsRef<Path>) -> Result<OperationHandle, FileError> {
        let path = path.as_ref();
        self.registry.check(Preconditions::Standard)?;

        if path.is_dir() {
            return Err(FileError::invalid_argument(format!(
                "{} is a directory and has no versions to update",
                path.display()
            )));
        }

        let request = OperationRequest::update(path);
        let tree = self.build(&request)?;
        self.submit(tree, request)
    }

    /// Move or rename a file or directory.
    pub fn move_to(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<OperationHandle, FileError> {
        let (source, destination) = (source.as_ref(), destination.as_ref());
        self.registry.check(Preconditions::Standard)?;

        if source == destination {
            return Err(FileError::invalid_argument(format!(
                "Source and destination are both {}",
                source.display()
            )));
        }
        if destination.starts_with(source) {
            return Err(FileError::invalid_argument(format!(
                "Cannot move {} into itself ({})",
                source.display(),
                destination.display()
            )));
        }

        let request = OperationRequest::move_to(source, destination);
        let tree = self.build(&request)?;
        self.submit(tree, request)
    }

    /// Delete a file, or a directory with everything below it.
    ///
    /// Children are deleted before their parents.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<OperationHandle, FileError> {
        let path = path.as_ref();
        self.registry.check(Preconditions::Standard)?;

        let tree = if is_non_empty_dir(path, self.config.follow_symlinks)? {
            let sequence = self.scanner.ordered_paths(path)?;
            build_delete_tree(&sequence, |p| self.build(&OperationRequest::delete(p)))?
        } else {
            self.build(&OperationRequest::delete(path))?
        };

        self.submit(tree, OperationRequest::delete(path))
    }

    /// Restore an earlier version of a file.
    pub fn recover(
        &self,
        path: impl AsRef<Path>,
        selector: VersionSelector,
    ) -> Result<OperationHandle, FileError> {
        let path = path.as_ref();
        self.registry.check(Preconditions::Standard)?;
        selector.validate()?;

        let request = OperationRequest::recover(path, selector);
        let tree = self.build(&request)?;
        self.submit(tree, request)
    }

    /// Grant another user access to a folder below the managed root.
    pub fn share(
        &self,
        folder: impl AsRef<Path>,
        grantee: impl Into<String>,
        level: PermissionLevel,
    ) -> Result<OperationHandle, FileError> {
        let folder = folder.as_ref();
        self.registry.check(Preconditions::Standard)?;

        if !self.is_shareable(folder) {
            return Err(FileError::InvalidLocation {
                path: folder.to_path_buf(),
            });
        }

        let grantee = grantee.into();
        if grantee.trim().is_empty() {
            return Err(FileError::invalid_argument("Grantee must not be empty"));
        }

        let request = OperationRequest::share(folder, PermissionGrant::new(grantee, level));
        let tree = self.build(&request)?;
        self.submit(tree, request)
    }

    /// List every file known to the store.
    ///
    /// Only requires the network to be reachable.
    pub fn list_files(&self) -> Result<OperationHandle<Vec<PathBuf>>, FileError> {
        self.registry.check(Preconditions::NetworkOnly)?;

        let tree = self.builder.build_list(self.registry.network())?;
        debug!("built list operation");

        let handle = self
            .registry
            .submit_with(wrap_with_result(tree), Preconditions::NetworkOnly)?;
        info!(handle = %handle.id(), "list submitted");
        Ok(handle)
    }

    /// Whether `folder` resolves to an existing directory strictly below the
    /// managed root. `..` components and symlinks are resolved first.
    fn is_shareable(&self, folder: &Path) -> bool {
        let resolved = fs::canonicalize(folder);
        let root = fs::canonicalize(&self.config.root);
        let (Ok(resolved), Ok(root)) = (resolved, root) else {
            return false;
        };
        resolved != root && resolved.starts_with(&root) && resolved.is_dir()
    }

    fn build(&self, request: &OperationRequest) -> Result<OperationTree, FileError> {
        self.builder.build(request, self.registry.network())
    }

    fn submit(
        &self,
        tree: OperationTree,
        request: OperationRequest,
    ) -> Result<OperationHandle, FileError> {
        let leaves = tree.leaf_count();
        let handle = self.registry.submit(wrap(tree))?;
        info!(handle = %handle.id(), leaves, request = %request, "request submitted");
        Ok(handle)
    }
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Whether `path` is a directory with at least one entry.
///
/// A symlink to a directory only counts when links are followed, matching
/// what the scanner would traverse.
fn is_non_empty_dir(path: &Path, follow_symlinks: bool) -> Result<bool, FileError> {
    let metadata = if follow_symlinks {
        fs::metadata(path)
    } else {
        fs::symlink_metadata(path)
    };
    if !metadata.is_ok_and(|m| m.is_dir()) {
        return Ok(false);
    }
    let mut entries = fs::read_dir(path).map_err(|e| FileError::io(path, e))?;
    Ok(entries.next().is_some())
}
