//! Async handles wrapping operation trees.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hivesync_core::{ExecutionError, FileError};

use crate::executor::{ExecutionContext, execute_result, execute_tree};
use crate::operation::{BoxFuture, OperationTree, ResultOperationTree};
use crate::progress::ExecutionProgress;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a handle.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleState<T> {
    /// Created, not yet submitted.
    Pending,
    /// Dispatched to its own task.
    Running,
    /// Finished successfully, with the tree's result.
    Completed(T),
    /// A leaf failed; dependents of it were skipped.
    Failed(ExecutionError),
    /// Stopped by a cancellation request.
    Cancelled,
}

impl<T> HandleState<T> {
    /// Check if the state is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_) | Self::Cancelled)
    }

    /// Short name of the state, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

type Job<T> =
    Box<dyn FnOnce(ExecutionContext) -> BoxFuture<'static, Result<T, ExecutionError>> + Send>;

struct Shared<T> {
    id: HandleId,
    label: String,
    state: watch::Sender<HandleState<T>>,
    progress: Arc<watch::Sender<ExecutionProgress>>,
    cancel: CancellationToken,
    submitted: AtomicBool,
    job: Mutex<Option<Job<T>>>,
}

/// Caller-held reference to asynchronously executed work.
///
/// `OperationHandle<()>` wraps trees without a result; `OperationHandle<T>`
/// wraps result-bearing trees. Clones refer to the same work, and equality
/// compares identity only.
pub struct OperationHandle<T = ()> {
    shared: Arc<Shared<T>>,
}

/// Wrap a tree in a pending handle. Nothing runs until it is submitted.
pub fn wrap(tree: OperationTree) -> OperationHandle<()> {
    let label = tree.label();
    let total = tree.leaf_count();
    OperationHandle::new(label, total, Box::new(move |ctx| execute_tree(tree, ctx)))
}

/// Wrap a result-bearing tree in a pending handle.
pub fn wrap_with_result<T>(tree: ResultOperationTree<T>) -> OperationHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    let label = tree.label().to_string();
    OperationHandle::new(label, 1, Box::new(move |ctx| execute_result(tree, ctx)))
}

impl<T> OperationHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(label: String, total: usize, job: Job<T>) -> Self {
        let (state, _) = watch::channel(HandleState::Pending);
        let (progress, _) = watch::channel(ExecutionProgress::new(total));
        Self {
            shared: Arc::new(Shared {
                id: HandleId::next(),
                label,
                state,
                progress: Arc::new(progress),
                cancel: CancellationToken::new(),
                submitted: AtomicBool::new(false),
                job: Mutex::new(Some(job)),
            }),
        }
    }

    /// Identity of this handle.
    pub fn id(&self) -> HandleId {
        self.shared.id
    }

    /// Label of the wrapped tree.
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Current state.
    pub fn state(&self) -> HandleState<T> {
        self.shared.state.borrow().clone()
    }

    /// Check if the handle was not submitted yet.
    pub fn is_pending(&self) -> bool {
        matches!(*self.shared.state.borrow(), HandleState::Pending)
    }

    /// Check if the handle was ever started.
    pub fn is_submitted(&self) -> bool {
        self.shared.submitted.load(Ordering::Acquire)
    }

    /// Check if the handle reached a final state.
    pub fn is_finished(&self) -> bool {
        self.shared.state.borrow().is_terminal()
    }

    /// Current leaf counts.
    pub fn progress(&self) -> ExecutionProgress {
        self.shared.progress.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<HandleState<T>> {
        self.shared.state.subscribe()
    }

    /// Watch progress changes.
    pub fn subscribe_progress(&self) -> watch::Receiver<ExecutionProgress> {
        self.shared.progress.subscribe()
    }

    /// Request cancellation.
    ///
    /// A pending handle is cancelled at once. A running one stops starting
    /// new leaves; leaves already running finish and nothing is rolled back.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();

        let was_pending = self.shared.state.send_if_modified(|state| {
            if matches!(state, HandleState::Pending) {
                *state = HandleState::Cancelled;
                true
            } else {
                false
            }
        });

        if was_pending {
            self.take_job();
            debug!(handle = %self.id(), "cancelled before start");
        }
    }

    /// Wait until the handle reaches a final state and return it.
    ///
    /// Never returns for a handle that is never submitted.
    pub async fn wait(&self) -> HandleState<T> {
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(HandleState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Wait for completion and return the tree's result.
    pub async fn result(&self) -> Result<T, ExecutionError> {
        match self.wait().await {
            HandleState::Completed(value) => Ok(value),
            HandleState::Failed(err) => Err(err),
            HandleState::Cancelled => Err(ExecutionError::cancelled()),
            state @ (HandleState::Pending | HandleState::Running) => Err(ExecutionError::internal(
                format!("Handle {} stopped while {}", self.id(), state.name()),
            )),
        }
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// Move the handle to `Running` and spawn its job on `runtime`.
    ///
    /// Returns `Ok(false)` without doing anything if the handle was already
    /// started. A handle cancelled before it was ever started is rejected.
    /// `on_finish` runs once the final state is published.
    pub(crate) fn start(
        &self,
        runtime: &tokio::runtime::Handle,
        on_finish: impl FnOnce(HandleId) + Send + 'static,
    ) -> Result<bool, FileError> {
        let started = self.shared.state.send_if_modified(|state| {
            if matches!(state, HandleState::Pending) {
                *state = HandleState::Running;
                self.shared.submitted.store(true, Ordering::Release);
                true
            } else {
                false
            }
        });
        if !started {
            if self.is_submitted() {
                return Ok(false);
            }
            return Err(FileError::invalid_argument(format!(
                "Handle {} is {} and cannot be started",
                self.id(),
                self.shared.state.borrow().name()
            )));
        }

        let Some(job) = self.take_job() else {
            self.shared
                .state
                .send_replace(HandleState::Failed(ExecutionError::internal("Handle has no work")));
            return Err(FileError::invalid_argument(format!(
                "Handle {} has no work to run",
                self.id()
            )));
        };

        let shared = Arc::clone(&self.shared);
        let ctx = ExecutionContext::new(shared.cancel.clone(), Arc::clone(&shared.progress));

        runtime.spawn(async move {
            let final_state = match job(ctx).await {
                Ok(value) => HandleState::Completed(value),
                Err(err) if err.is_cancelled() => HandleState::Cancelled,
                Err(err) => HandleState::Failed(err),
            };

            info!(
                handle = %shared.id,
                label = %shared.label,
                state = final_state.name(),
                "operation finished"
            );
            shared.state.send_replace(final_state);
            on_finish(shared.id);
        });

        Ok(true)
    }

    fn take_job(&self) -> Option<Job<T>> {
        self.shared
            .job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<T> Clone for OperationHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> PartialEq for OperationHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shared.id == other.shared.id
    }
}

impl<T> Eq for OperationHandle<T> {}

impl<T> Hash for OperationHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shared.id.hash(state);
    }
}

impl<T> fmt::Debug for OperationHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.shared.id)
            .field("label", &self.shared.label)
            .field("state", &self.shared.state.borrow().name())
            .finish()
    }
}
