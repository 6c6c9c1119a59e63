//! Dependency-ordered execution of operation trees.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hivesync_core::ExecutionError;

use crate::operation::{BoxFuture, Composite, OperationTree, ResultOperationTree};
use crate::progress::ExecutionProgress;

/// Shared state of one handle's execution.
#[derive(Clone)]
pub(crate) struct ExecutionContext {
    cancel: CancellationToken,
    progress: Arc<watch::Sender<ExecutionProgress>>,
}

impl ExecutionContext {
    pub(crate) fn new(
        cancel: CancellationToken,
        progress: Arc<watch::Sender<ExecutionProgress>>,
    ) -> Self {
        Self { cancel, progress }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn update(&self, f: impl FnOnce(&mut ExecutionProgress)) {
        self.progress.send_modify(f);
    }
}

/// Execute a tree, honoring every dependency edge.
pub(crate) fn execute_tree(
    tree: OperationTree,
    ctx: ExecutionContext,
) -> BoxFuture<'static, Result<(), ExecutionError>> {
    Box::pin(async move {
        match tree {
            OperationTree::Leaf(op) => {
                let label = op.label().to_string();
                execute_unit(label, &ctx, async move { op.execute().await }).await
            }
            OperationTree::Composite(composite) => execute_composite(composite, ctx).await,
        }
    })
}

/// Execute a result-bearing tree.
pub(crate) fn execute_result<T: Send + 'static>(
    tree: ResultOperationTree<T>,
    ctx: ExecutionContext,
) -> BoxFuture<'static, Result<T, ExecutionError>> {
    Box::pin(async move {
        let op = tree.operation();
        let label = op.label().to_string();
        execute_unit(label, &ctx, async move { op.execute().await }).await
    })
}

/// Run one leaf on its own task, checking cancellation at its boundary.
async fn execute_unit<T, F>(
    label: String,
    ctx: &ExecutionContext,
    run: F,
) -> Result<T, ExecutionError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ExecutionError>> + Send + 'static,
{
    if ctx.is_cancelled() {
        ctx.update(|p| p.skip_leaves(1));
        return Err(ExecutionError::cancelled());
    }

    ctx.update(|p| p.start_leaf(&label));

    // A panicking leaf must surface as a failure, not take the tree down.
    let outcome = match tokio::spawn(run).await {
        Ok(result) => result,
        Err(err) => Err(ExecutionError::internal(format!("Operation task failed: {err}"))),
    };

    match outcome {
        Ok(value) => {
            ctx.update(|p| p.complete_leaf());
            Ok(value)
        }
        Err(err) => {
            warn!(leaf = %label, error = %err, "operation failed");
            ctx.update(|p| p.fail_leaf());
            Err(err.with_leaf(label))
        }
    }
}

/// Run the nodes of a composite as their dependencies complete.
///
/// A failed node's dependents never start; nodes that do not depend on it
/// keep running. The result is the first real failure, else a cancellation
/// if any node was held back by one.
async fn execute_composite(
    composite: Arc<Composite>,
    ctx: ExecutionContext,
) -> Result<(), ExecutionError> {
    let nodes: Vec<OperationTree> = composite.nodes().map(|(_, node)| node.clone()).collect();
    let dependents = composite.dependents();
    let mut waiting: Vec<usize> = composite
        .nodes()
        .map(|(index, _)| composite.dependencies(index).len())
        .collect();
    let mut started = vec![false; nodes.len()];

    let mut tasks: JoinSet<(usize, Result<(), ExecutionError>)> = JoinSet::new();
    let mut first_error: Option<ExecutionError> = None;
    let mut cancelled = false;
    let mut aborted = false;

    for index in 0..nodes.len() {
        if waiting[index] == 0 {
            cancelled |= !spawn_node(&mut tasks, &nodes, index, &ctx, &mut started);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = match joined {
            Ok(done) => done,
            Err(err) => {
                // The node is unknown, so nothing more may be scheduled.
                aborted = true;
                first_error.get_or_insert_with(|| {
                    ExecutionError::internal(format!("Composite task failed: {err}"))
                });
                continue;
            }
        };

        match outcome {
            Ok(()) => {
                for &dependent in &dependents[index] {
                    waiting[dependent] -= 1;
                    if waiting[dependent] == 0 && !aborted {
                        cancelled |=
                            !spawn_node(&mut tasks, &nodes, dependent, &ctx, &mut started);
                    }
                }
            }
            Err(err) if err.is_cancelled() => cancelled = true,
            Err(err) => {
                debug!(error = %err, "skipping dependents of failed node");
                first_error.get_or_insert(err);
            }
        }
    }

    let never_started: usize = nodes
        .iter()
        .zip(&started)
        .filter(|(_, started)| !**started)
        .map(|(node, _)| node.leaf_count())
        .sum();
    if never_started > 0 {
        ctx.update(|p| p.skip_leaves(never_started));
    }

    match first_error {
        Some(err) => Err(err),
        None if cancelled => Err(ExecutionError::cancelled()),
        None => Ok(()),
    }
}

/// Start a node unless cancellation was requested. Returns whether it started.
fn spawn_node(
    tasks: &mut JoinSet<(usize, Result<(), ExecutionError>)>,
    nodes: &[OperationTree],
    index: usize,
    ctx: &ExecutionContext,
    started: &mut [bool],
) -> bool {
    if ctx.is_cancelled() {
        return false;
    }

    started[index] = true;
    let node = nodes[index].clone();
    let ctx = ctx.clone();
    tasks.spawn(async move { (index, execute_tree(node, ctx).await) });
    true
}
