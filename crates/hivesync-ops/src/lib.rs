//! Operation orchestration for hivesync.
//!
//! This crate turns file requests into dependency-ordered operation trees,
//! wraps them in cancellable handles and runs each handle on its own tokio
//! task. Directory operations are planned from a preorder snapshot: creation
//! runs parents before children, deletion runs children before parents.
//!
//! The per-file work itself comes from an injected [`OperationBuilder`].

mod builder;
mod executor;
mod handle;
mod manager;
mod operation;
mod plan;
mod progress;
mod registry;

pub use builder::OperationBuilder;
pub use handle::{HandleId, HandleState, OperationHandle, wrap, wrap_with_result};
pub use manager::FileManager;
pub use operation::{
    BoxFuture, Composite, CompositionOrder, NodeIndex, Operation, OperationTree, ResultOperation,
    ResultOperationTree,
};
pub use plan::{build_create_tree, build_delete_tree};
pub use progress::ExecutionProgress;
pub use registry::{InFlightEntry, Preconditions, SubmissionRegistry};
