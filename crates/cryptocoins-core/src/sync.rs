//! Counting synchronization for groups of background tasks.
//!
//! [`TaskGroup`] tracks a number of outstanding units of work. Callers
//! [`enter`](TaskGroup::enter) before starting a unit and
//! [`leave`](TaskGroup::leave) when it finishes. Other threads can block until
//! the count drains to zero, or register a callback that runs when it does.
//!
//! # Example
//!
//! ```
//! use cryptocoins_core::sync::{TaskGroup, WaitResult};
//! use std::time::Duration;
//!
//! let group = TaskGroup::new();
//! group.enter();
//!
//! let worker = group.clone();
//! std::thread::spawn(move || worker.leave());
//!
//! assert_eq!(group.wait_timeout(Duration::from_secs(5)), WaitResult::Success);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::logging::targets;

/// Outcome of a bounded wait on a [`TaskGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// All pending tasks left the group before the deadline.
    Success,
    /// The deadline passed with tasks still pending.
    TimedOut,
}

impl WaitResult {
    /// Check whether the wait timed out.
    pub fn is_timed_out(self) -> bool {
        self == Self::TimedOut
    }
}

type CompletionHandler = Arc<dyn Fn() + Send + Sync>;

struct GroupInner {
    pending: AtomicUsize,
    // Guards transitions of `pending` so waiters cannot miss a wakeup.
    lock: Mutex<Option<CompletionHandler>>,
    drained: Condvar,
}

/// A counting latch over a set of pending tasks.
///
/// The group is cheaply cloneable; clones share the same counter.
#[derive(Clone)]
pub struct TaskGroup {
    inner: Arc<GroupInner>,
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGroup {
    /// Create an empty task group.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GroupInner {
                pending: AtomicUsize::new(0),
                lock: Mutex::new(None),
                drained: Condvar::new(),
            }),
        }
    }

    /// Number of tasks that have entered but not yet left.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Register the start of a task.
    pub fn enter(&self) {
        let _guard = self.inner.lock.lock();
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Register the completion of a task.
    ///
    /// Calling `leave` on an empty group does nothing. When the count drops to
    /// zero, waiters are released and the completion handler (if any) runs on
    /// the calling thread.
    pub fn leave(&self) {
        let handler = {
            let guard = self.inner.lock.lock();
            if self.inner.pending.load(Ordering::Acquire) == 0 {
                tracing::trace!(target: targets::SYNC, "leave() on an empty task group ignored");
                return;
            }
            if self.inner.pending.fetch_sub(1, Ordering::AcqRel) != 1 {
                return;
            }
            self.inner.drained.notify_all();
            guard.clone()
        };

        if let Some(handler) = handler {
            handler();
        }
    }

    /// Set the handler invoked each time the pending count drops to zero.
    ///
    /// Replaces any previously registered handler.
    pub fn notify<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.lock.lock() = Some(Arc::new(handler));
    }

    /// Block until no tasks are pending.
    pub fn wait(&self) {
        let mut guard = self.inner.lock.lock();
        while self.inner.pending.load(Ordering::Acquire) > 0 {
            self.inner.drained.wait(&mut guard);
        }
    }

    /// Block until no tasks are pending or `timeout` elapses.
    ///
    /// A timeout too large to represent as a deadline waits without bound.
    pub fn wait_timeout(&self, timeout: Duration) -> WaitResult {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return WaitResult::Success;
        };
        let mut guard = self.inner.lock.lock();
        while self.inner.pending.load(Ordering::Acquire) > 0 {
            if self.inner.drained.wait_until(&mut guard, deadline).timed_out() {
                return if self.inner.pending.load(Ordering::Acquire) == 0 {
                    WaitResult::Success
                } else {
                    WaitResult::TimedOut
                };
            }
        }
        WaitResult::Success
    }
}

impl std::fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGroup")
            .field("pending", &self.pending())
            .finish()
    }
}
