//! Turn preorder path sequences into dependency-ordered operation trees.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use hivesync_core::FileError;
use hivesync_scan::OrderedPaths;

use crate::operation::{Composite, CompositionOrder, NodeIndex, OperationTree};

/// Build a tree in which every path's leaf waits for its parent's leaf.
///
/// Paths without an ancestor relation get no edge and may run concurrently.
/// A single-path sequence yields the bare leaf.
pub fn build_create_tree<F>(
    sequence: &OrderedPaths,
    mut leaf_action: F,
) -> Result<OperationTree, FileError>
where
    F: FnMut(&Path) -> Result<OperationTree, FileError>,
{
    if sequence.is_single() {
        return leaf_action(sequence.root());
    }

    let mut composite = Composite::new(CompositionOrder::Create);
    let mut indices: HashMap<&Path, NodeIndex> = HashMap::with_capacity(sequence.len());

    for path in sequence {
        let leaf = leaf_action(path.as_path())?;
        let parent = path.parent().and_then(|parent| indices.get(parent)).copied();
        let deps: &[NodeIndex] = match &parent {
            Some(parent) => std::slice::from_ref(parent),
            None => &[],
        };
        let index = composite.push(leaf, deps)?;
        indices.insert(path.as_path(), index);
    }

    debug!(
        root = %sequence.root().display(),
        leaves = composite.len(),
        "planned create tree"
    );
    Ok(OperationTree::composite(composite))
}

/// Build a tree in which every directory's leaf waits for all its children.
///
/// Paths are visited in reverse preorder, so children are always pushed
/// before their parent. A single-path sequence yields the bare leaf.
pub fn build_delete_tree<F>(
    sequence: &OrderedPaths,
    mut leaf_action: F,
) -> Result<OperationTree, FileError>
where
    F: FnMut(&Path) -> Result<OperationTree, FileError>,
{
    if sequence.is_single() {
        return leaf_action(sequence.root());
    }

    let mut composite = Composite::new(CompositionOrder::Delete);
    let mut children: HashMap<&Path, Vec<NodeIndex>> = HashMap::new();

    for path in sequence.as_slice().iter().rev() {
        let leaf = leaf_action(path.as_path())?;
        let deps = children.remove(path.as_path()).unwrap_or_default();
        let index = composite.push(leaf, &deps)?;

        if path.as_path() != sequence.root() {
            if let Some(parent) = path.parent() {
                children.entry(parent).or_default().push(index);
            }
        }
    }

    debug!(
        root = %sequence.root().display(),
        leaves = composite.len(),
        "planned delete tree"
    );
    Ok(OperationTree::composite(composite))
}
