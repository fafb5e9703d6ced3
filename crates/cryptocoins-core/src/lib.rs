//! Core primitives for CryptoCoins.
//!
//! This crate provides the small set of process-level building blocks shared by
//! the rest of the workspace:
//!
//! - **Task groups**: A counting latch for waiting on a batch of background work
//! - **Logging targets**: `tracing` target names used across the workspace
//!
//! # Task Group Example
//!
//! ```
//! use cryptocoins_core::TaskGroup;
//! use std::thread;
//!
//! let group = TaskGroup::new();
//!
//! for _ in 0..4 {
//!     group.enter();
//!     let group = group.clone();
//!     thread::spawn(move || {
//!         // Background work...
//!         group.leave();
//!     });
//! }
//!
//! group.wait();
//! assert_eq!(group.pending(), 0);
//! ```

pub mod logging;
pub mod sync;

pub use sync::{TaskGroup, WaitResult};
