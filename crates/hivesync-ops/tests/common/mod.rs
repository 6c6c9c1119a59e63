//! Recording fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::{Barrier, Notify};

use hivesync_core::{ExecutionError, FileError, NetworkContext, OperationRequest};
use hivesync_ops::{
    BoxFuture, HandleState, Operation, OperationBuilder, OperationHandle, OperationTree,
    ResultOperation, ResultOperationTree,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(String),
    Finish(String),
}

/// Ordered start/finish events of every leaf.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self, label: &str) -> bool {
        self.position(&Event::Start(label.to_string())).is_some()
    }

    pub fn finished(&self, label: &str) -> bool {
        self.position(&Event::Finish(label.to_string())).is_some()
    }

    /// Whether `first` finished before `second` started.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        let finish = self.position(&Event::Finish(first.to_string()));
        let start = self.position(&Event::Start(second.to_string()));
        matches!((finish, start), (Some(finish), Some(start)) if finish < start)
    }

    fn position(&self, event: &Event) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }
}

/// Extra behavior attached to the leaf of one path.
#[derive(Clone)]
pub enum Hook {
    /// Block until notified.
    Gate(Arc<Notify>),
    /// Meet other leaves at a barrier.
    Barrier(Arc<Barrier>),
    /// Fail with a remote error.
    Fail,
}

struct RecordedOp {
    label: String,
    log: Arc<EventLog>,
    hook: Option<Hook>,
}

impl Operation for RecordedOp {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self) -> BoxFuture<'_, Result<(), ExecutionError>> {
        Box::pin(async move {
            self.log.push(Event::Start(self.label.clone()));
            match &self.hook {
                Some(Hook::Gate(gate)) => gate.notified().await,
                Some(Hook::Barrier(barrier)) => {
                    barrier.wait().await;
                }
                Some(Hook::Fail) => {
                    return Err(ExecutionError::remote("store rejected the entry"));
                }
                None => tokio::task::yield_now().await,
            }
            self.log.push(Event::Finish(self.label.clone()));
            Ok(())
        })
    }
}

struct ListOp {
    files: Vec<PathBuf>,
    log: Arc<EventLog>,
}

impl ResultOperation<Vec<PathBuf>> for ListOp {
    fn label(&self) -> &str {
        "list"
    }

    fn execute(&self) -> BoxFuture<'_, Result<Vec<PathBuf>, ExecutionError>> {
        Box::pin(async move {
            self.log.push(Event::Start("list".to_string()));
            self.log.push(Event::Finish("list".to_string()));
            Ok(self.files.clone())
        })
    }
}

/// Builder producing one recorded leaf per request.
#[derive(Default)]
pub struct RecordingBuilder {
    pub log: Arc<EventLog>,
    requests: Mutex<Vec<OperationRequest>>,
    hooks: Mutex<HashMap<PathBuf, Hook>>,
    files: Vec<PathBuf>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    pub fn hook(&self, path: impl Into<PathBuf>, hook: Hook) {
        self.hooks.lock().unwrap().insert(path.into(), hook);
    }

    /// Block the leaf of `path` until the returned gate is notified.
    pub fn gate(&self, path: impl Into<PathBuf>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.hook(path, Hook::Gate(Arc::clone(&gate)));
        gate
    }

    pub fn requests(&self) -> Vec<OperationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a leaf directly, bypassing the request log.
    pub fn leaf(&self, request: &OperationRequest) -> OperationTree {
        let hook = request
            .path()
            .and_then(|path| self.hooks.lock().unwrap().get(path).cloned());
        OperationTree::leaf(RecordedOp {
            label: request.to_string(),
            log: Arc::clone(&self.log),
            hook,
        })
    }
}

impl OperationBuilder for RecordingBuilder {
    fn build(
        &self,
        request: &OperationRequest,
        _network: &Arc<dyn NetworkContext>,
    ) -> Result<OperationTree, FileError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.leaf(request))
    }

    fn build_list(
        &self,
        _network: &Arc<dyn NetworkContext>,
    ) -> Result<ResultOperationTree<Vec<PathBuf>>, FileError> {
        Ok(ResultOperationTree::new(ListOp {
            files: self.files.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

/// `<temp>/a` holding `b` and `c/d`.
pub fn scenario_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("a");
    fs::create_dir_all(root.join("c")).unwrap();
    fs::write(root.join("b"), "bee").unwrap();
    fs::write(root.join("c/d"), "dee").unwrap();
    (temp, root)
}

pub fn add_label(path: &Path) -> String {
    OperationRequest::add(path).to_string()
}

pub fn delete_label(path: &Path) -> String {
    OperationRequest::delete(path).to_string()
}

/// Wait for a handle to finish, failing the test after [`TIMEOUT`].
pub async fn finish<T>(handle: &OperationHandle<T>) -> HandleState<T>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::time::timeout(TIMEOUT, handle.wait())
        .await
        .expect("handle did not finish in time")
}

/// Poll until `label` has started.
pub async fn wait_started(log: &EventLog, label: &str) {
    tokio::time::timeout(TIMEOUT, async {
        while !log.started(label) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("leaf did not start in time");
}
