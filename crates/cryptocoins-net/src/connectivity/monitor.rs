//! Background reachability tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cryptocoins_core::logging::targets;
use parking_lot::Mutex;

use super::ConnectivityGuard;
use super::interface::check_online_state;

/// Failure to start watching interface changes.
#[derive(Debug, thiserror::Error)]
#[error("Failed to watch network interfaces: {0}")]
pub struct MonitorError(String);

/// Tracks online state and refreshes it when interfaces change.
///
/// Until [`start`](Self::start) is called the state is the one observed at
/// construction. Checks read an atomic and never block.
///
/// # Example
///
/// ```ignore
/// let monitor = NetworkMonitor::new();
/// monitor.start()?;
/// if !monitor.is_online() {
///     println!("offline");
/// }
/// ```
pub struct NetworkMonitor {
    online: Arc<AtomicBool>,
    // Dropping the handle stops the watcher.
    watcher: Mutex<Option<netwatcher::WatchHandle>>,
}

impl NetworkMonitor {
    /// Create a monitor seeded with the current interface state.
    pub fn new() -> Self {
        Self {
            online: Arc::new(AtomicBool::new(check_online_state())),
            watcher: Mutex::new(None),
        }
    }

    /// Check if the network is currently considered online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Re-read the interface table now.
    pub fn refresh(&self) -> bool {
        update_online_state(&self.online, check_online_state())
    }

    /// Start watching for interface changes.
    ///
    /// Calling this on a running monitor does nothing.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut watcher = self.watcher.lock();
        if watcher.is_some() {
            return Ok(());
        }

        let online = Arc::clone(&self.online);
        let handle = netwatcher::watch_interfaces(move |update| {
            tracing::trace!(
                target: targets::CONNECTIVITY,
                added = update.diff.added.len(),
                removed = update.diff.removed.len(),
                "Interface change"
            );
            update_online_state(&online, check_online_state());
        })
        .map_err(|e| MonitorError(e.to_string()))?;

        *watcher = Some(handle);
        tracing::debug!(target: targets::CONNECTIVITY, "Network monitor started");
        Ok(())
    }

    /// Stop watching for interface changes.
    pub fn stop(&self) {
        if self.watcher.lock().take().is_some() {
            tracing::debug!(target: targets::CONNECTIVITY, "Network monitor stopped");
        }
    }

    /// Check if the monitor is watching for changes.
    pub fn is_running(&self) -> bool {
        self.watcher.lock().is_some()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for NetworkMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkMonitor")
            .field("online", &self.is_online())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ConnectivityGuard for NetworkMonitor {
    fn is_connected(&self) -> bool {
        self.is_online()
    }
}

fn update_online_state(online: &AtomicBool, now_online: bool) -> bool {
    let was_online = online.swap(now_online, Ordering::AcqRel);
    if was_online != now_online {
        if now_online {
            tracing::info!(target: targets::CONNECTIVITY, "Network is now online");
        } else {
            tracing::warn!(target: targets::CONNECTIVITY, "Network is now offline");
        }
    }
    now_online
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_online_state_stores_latest() {
        let online = AtomicBool::new(false);
        assert!(update_online_state(&online, true));
        assert!(online.load(Ordering::Acquire));
        assert!(!update_online_state(&online, false));
        assert!(!online.load(Ordering::Acquire));
    }

    #[test]
    fn test_new_monitor_is_not_running() {
        let monitor = NetworkMonitor::new();
        assert!(!monitor.is_running());
        assert_eq!(monitor.is_connected(), monitor.is_online());
        monitor.stop();
        assert!(!monitor.is_running());
    }
}
