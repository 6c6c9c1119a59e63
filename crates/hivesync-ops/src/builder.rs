//! Contract for the component that turns requests into operation trees.

use std::path::PathBuf;
use std::sync::Arc;

use hivesync_core::{FileError, NetworkContext, OperationRequest};

use crate::operation::{OperationTree, ResultOperationTree};

/// Builds the concrete per-file work for a request.
///
/// Implementations own the storage protocol. For `Add` and `Delete` they are
/// only ever asked for a single path; recursion over a directory is planned
/// by the caller.
pub trait OperationBuilder: Send + Sync {
    /// Build the tree for a single-target request.
    fn build(
        &self,
        request: &OperationRequest,
        network: &Arc<dyn NetworkContext>,
    ) -> Result<OperationTree, FileError>;

    /// Build the tree that lists every file known to the store.
    fn build_list(
        &self,
        network: &Arc<dyn NetworkContext>,
    ) -> Result<ResultOperationTree<Vec<PathBuf>>, FileError>;
}
