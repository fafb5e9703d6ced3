//! Reachability checks performed before any transport call.
//!
//! A [`ConnectivityGuard`] answers one question synchronously: should the
//! client attempt the network at all? When it answers `false` the fetch fails
//! immediately with [`TransportError::NotConnected`](crate::TransportError::NotConnected),
//! without touching the transport or the cache.
//!
//! # Example
//!
//! ```ignore
//! use cryptocoins_net::connectivity::NetworkMonitor;
//!
//! let monitor = Arc::new(NetworkMonitor::new());
//! monitor.start()?;
//!
//! let client = FetchClient::builder().connectivity(monitor.clone()).build()?;
//! ```

mod interface;
mod monitor;

use std::sync::atomic::{AtomicBool, Ordering};

pub use interface::{InterfaceConnectivity, InterfaceSnapshot, check_online_state};
pub use monitor::{MonitorError, NetworkMonitor};

/// Synchronous reachability predicate.
///
/// Implementations must not block.
pub trait ConnectivityGuard: Send + Sync {
    /// Check whether the network should be attempted.
    fn is_connected(&self) -> bool;
}

impl<F> ConnectivityGuard for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_connected(&self) -> bool {
        self()
    }
}

/// A guard that always reports connectivity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConnected;

impl ConnectivityGuard for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }
}

/// A guard driven by an explicit flag.
#[derive(Debug)]
pub struct StaticConnectivity {
    connected: AtomicBool,
}

impl StaticConnectivity {
    /// Create a guard with the given initial state.
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    /// Update the reported state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

impl Default for StaticConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityGuard for StaticConnectivity {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
