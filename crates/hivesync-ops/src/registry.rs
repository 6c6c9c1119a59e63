//! Fail-fast submission of handles and tracking of in-flight work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hivesync_core::{FileError, NetworkContext};

use crate::handle::{HandleId, OperationHandle};

/// Which connectivity requirements a submission must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preconditions {
    /// Session, peer connection and network.
    #[default]
    Standard,
    /// Network reachability only.
    NetworkOnly,
}

impl Preconditions {
    /// Check the requirements in order: session, peer, network.
    pub fn check(self, network: &dyn NetworkContext) -> Result<(), FileError> {
        if self == Self::Standard {
            if !network.has_active_session() {
                return Err(FileError::NoSession);
            }
            if !network.is_peer_connected() {
                return Err(FileError::NoPeerConnection);
            }
        }
        if !network.is_network_reachable() {
            return Err(FileError::NoNetwork);
        }
        Ok(())
    }
}

/// Snapshot of one registered handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InFlightEntry {
    pub id: HandleId,
    pub label: String,
    pub submitted_at: DateTime<Utc>,
}

struct Registration {
    entry: InFlightEntry,
    cancel: CancellationToken,
}

/// Accepts handles for execution once their preconditions hold.
///
/// Cloning is cheap; clones share the same in-flight set.
#[derive(Clone)]
pub struct SubmissionRegistry {
    network: Arc<dyn NetworkContext>,
    runtime: tokio::runtime::Handle,
    in_flight: Arc<DashMap<HandleId, Registration>>,
}

impl SubmissionRegistry {
    /// Create a registry that spawns on the current tokio runtime.
    pub fn new(network: Arc<dyn NetworkContext>) -> Result<Self, FileError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| FileError::Runtime {
            message: err.to_string(),
        })?;
        Ok(Self::with_runtime(network, runtime))
    }

    /// Create a registry that spawns on `runtime`.
    pub fn with_runtime(network: Arc<dyn NetworkContext>, runtime: tokio::runtime::Handle) -> Self {
        Self {
            network,
            runtime,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// The connectivity view checked on submission.
    pub fn network(&self) -> &Arc<dyn NetworkContext> {
        &self.network
    }

    /// Check preconditions without submitting anything.
    pub fn check(&self, preconditions: Preconditions) -> Result<(), FileError> {
        preconditions.check(self.network.as_ref())
    }

    /// Submit a handle under the standard preconditions.
    pub fn submit<T>(&self, handle: OperationHandle<T>) -> Result<OperationHandle<T>, FileError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.submit_with(handle, Preconditions::Standard)
    }

    /// Submit a handle and start it.
    ///
    /// Submitting a handle that was already started returns it unchanged, so
    /// calls can be chained. A handle cancelled before it was ever started is
    /// rejected with `InvalidArgument`. On error nothing is registered.
    pub fn submit_with<T>(
        &self,
        handle: OperationHandle<T>,
        preconditions: Preconditions,
    ) -> Result<OperationHandle<T>, FileError>
    where
        T: Clone + Send + Sync + 'static,
    {
        if let Err(err) = self.check(preconditions) {
            warn!(handle = %handle.id(), label = handle.label(), error = %err, "submission rejected");
            return Err(err);
        }

        let in_flight = Arc::clone(&self.in_flight);
        let started = handle.start(&self.runtime, move |id| {
            in_flight.remove(&id);
        })?;
        if !started {
            debug!(handle = %handle.id(), "handle already submitted");
            return Ok(handle);
        }

        let id = handle.id();
        self.in_flight.insert(
            id,
            Registration {
                entry: InFlightEntry {
                    id,
                    label: handle.label().to_string(),
                    submitted_at: Utc::now(),
                },
                cancel: handle.cancel_token(),
            },
        );
        // The job may have finished before it was registered.
        if handle.is_finished() {
            self.in_flight.remove(&id);
        }

        info!(handle = %id, label = handle.label(), "operation submitted");
        Ok(handle)
    }

    /// Number of handles submitted and not yet finished.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Snapshot of the in-flight handles, oldest first.
    pub fn in_flight(&self) -> Vec<InFlightEntry> {
        let mut entries: Vec<InFlightEntry> = self
            .in_flight
            .iter()
            .map(|registration| registration.entry.clone())
            .collect();
        entries.sort_by_key(|entry| (entry.submitted_at, entry.id));
        entries
    }

    /// Check if a handle is still in flight.
    pub fn contains(&self, id: HandleId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Request cancellation of every in-flight handle.
    pub fn cancel_all(&self) {
        let mut count = 0;
        for registration in self.in_flight.iter() {
            registration.cancel.cancel();
            count += 1;
        }
        debug!(count, "cancelled in-flight operations");
    }
}

impl std::fmt::Debug for SubmissionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionRegistry")
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
