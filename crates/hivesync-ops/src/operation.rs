//! Operation tree types.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hivesync_core::{ExecutionError, FileError};

/// Type alias for boxed futures returned by async operation methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The smallest unit of work, usually one file against the distributed store.
pub trait Operation: Send + Sync {
    /// Human-readable label, reported when the operation fails.
    fn label(&self) -> &str;

    /// Run the operation to completion.
    fn execute(&self) -> BoxFuture<'_, Result<(), ExecutionError>>;
}

/// A unit of work that produces a value.
pub trait ResultOperation<T>: Send + Sync {
    /// Human-readable label, reported when the operation fails.
    fn label(&self) -> &str;

    /// Run the operation and return its result.
    fn execute(&self) -> BoxFuture<'_, Result<T, ExecutionError>>;
}

/// Position of a node inside a [`Composite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Get the raw index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which dependency direction a composite was assembled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionOrder {
    /// Parents before children.
    Create,
    /// Children before parents.
    Delete,
}

/// Sub-trees plus explicit dependency edges.
///
/// A node may only depend on nodes pushed before it, so the dependency
/// relation is acyclic by construction.
pub struct Composite {
    order: CompositionOrder,
    nodes: Vec<OperationTree>,
    dependencies: Vec<Vec<NodeIndex>>,
}

impl Composite {
    /// Create an empty composite.
    pub fn new(order: CompositionOrder) -> Self {
        Self {
            order,
            nodes: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Add a node that starts only after every node in `depends_on` completed.
    pub fn push(
        &mut self,
        tree: OperationTree,
        depends_on: &[NodeIndex],
    ) -> Result<NodeIndex, FileError> {
        let index = NodeIndex(self.nodes.len());
        if let Some(unknown) = depends_on.iter().find(|dep| dep.0 >= index.0) {
            return Err(FileError::invalid_argument(format!(
                "Dependency {} does not precede node {}",
                unknown.0, index.0
            )));
        }

        let mut deps = depends_on.to_vec();
        deps.sort();
        deps.dedup();

        self.nodes.push(tree);
        self.dependencies.push(deps);
        Ok(index)
    }

    /// The dependency direction this composite was built with.
    pub fn order(&self) -> CompositionOrder {
        self.order
    }

    /// Number of direct nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the composite has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a direct node.
    pub fn node(&self, index: NodeIndex) -> Option<&OperationTree> {
        self.nodes.get(index.0)
    }

    /// Nodes that must complete before `index` starts.
    pub fn dependencies(&self, index: NodeIndex) -> &[NodeIndex] {
        self.dependencies
            .get(index.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over the direct nodes with their indices.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &OperationTree)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    /// For every node, the nodes that depend on it.
    pub(crate) fn dependents(&self) -> Vec<Vec<usize>> {
        let mut dependents = vec![Vec::new(); self.nodes.len()];
        for (node, deps) in self.dependencies.iter().enumerate() {
            for dep in deps {
                dependents[dep.0].push(node);
            }
        }
        dependents
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("order", &self.order)
            .field("nodes", &self.nodes)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// An executable unit of work: one leaf or a composite of sub-trees.
///
/// Cloning is cheap; clones share the same operations.
#[derive(Clone)]
pub enum OperationTree {
    /// A single operation.
    Leaf(Arc<dyn Operation>),
    /// Sub-trees with dependency edges.
    Composite(Arc<Composite>),
}

impl OperationTree {
    /// Wrap a single operation.
    pub fn leaf(operation: impl Operation + 'static) -> Self {
        Self::Leaf(Arc::new(operation))
    }

    /// Freeze a composite into a tree.
    pub fn composite(composite: Composite) -> Self {
        Self::Composite(Arc::new(composite))
    }

    /// Check if this tree is a single leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// The composite behind this tree, if any.
    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Self::Leaf(_) => None,
            Self::Composite(composite) => Some(composite),
        }
    }

    /// Total number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Composite(composite) => composite.nodes.iter().map(Self::leaf_count).sum(),
        }
    }

    /// Label of the tree: the leaf's label, or the first node's for composites.
    pub fn label(&self) -> String {
        match self {
            Self::Leaf(op) => op.label().to_string(),
            Self::Composite(composite) => match composite.nodes.first() {
                Some(first) => format!(
                    "{} (+{} more)",
                    first.label(),
                    self.leaf_count().saturating_sub(1)
                ),
                None => "empty composite".to_string(),
            },
        }
    }
}

impl fmt::Debug for OperationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(op) => f.debug_tuple("Leaf").field(&op.label()).finish(),
            Self::Composite(composite) => composite.fmt(f),
        }
    }
}

/// A result-bearing unit of work.
pub struct ResultOperationTree<T> {
    operation: Arc<dyn ResultOperation<T>>,
}

impl<T> ResultOperationTree<T> {
    /// Wrap a result operation.
    pub fn new(operation: impl ResultOperation<T> + 'static) -> Self {
        Self {
            operation: Arc::new(operation),
        }
    }

    /// Label of the underlying operation.
    pub fn label(&self) -> &str {
        self.operation.label()
    }

    pub(crate) fn operation(&self) -> Arc<dyn ResultOperation<T>> {
        Arc::clone(&self.operation)
    }
}

impl<T> Clone for ResultOperationTree<T> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
        }
    }
}

impl<T> fmt::Debug for ResultOperationTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultOperationTree")
            .field("label", &self.label())
            .finish()
    }
}
