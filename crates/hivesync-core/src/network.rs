//! Session and connectivity state seen by the orchestration layer.

use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only view of the network/session layer.
///
/// All checks must be fast, local and non-blocking; they are consulted on
/// the caller's thread before any work is scheduled.
pub trait NetworkContext: Send + Sync {
    /// Whether a user session is bound to the local peer.
    fn has_active_session(&self) -> bool;

    /// Whether the local peer is connected to at least one remote peer.
    fn is_peer_connected(&self) -> bool;

    /// Whether the network layer is initialized and reachable.
    fn is_network_reachable(&self) -> bool;
}

/// Atomic flags a network layer flips as it connects and logs in.
#[derive(Debug, Default)]
pub struct NetworkStatus {
    session: AtomicBool,
    peer_connected: AtomicBool,
    reachable: AtomicBool,
}

impl NetworkStatus {
    /// Create a status with everything down.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a status with a session, a peer connection and a reachable network.
    pub fn online() -> Self {
        Self {
            session: AtomicBool::new(true),
            peer_connected: AtomicBool::new(true),
            reachable: AtomicBool::new(true),
        }
    }

    /// Record whether a session is bound.
    pub fn set_session(&self, active: bool) {
        self.session.store(active, Ordering::Release);
    }

    /// Record whether a remote peer is connected.
    pub fn set_peer_connected(&self, connected: bool) {
        self.peer_connected.store(connected, Ordering::Release);
    }

    /// Record whether the network layer is reachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }
}

impl NetworkContext for NetworkStatus {
    fn has_active_session(&self) -> bool {
        self.session.load(Ordering::Acquire)
    }

    fn is_peer_connected(&self) -> bool {
        self.peer_connected.load(Ordering::Acquire)
    }

    fn is_network_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }
}
