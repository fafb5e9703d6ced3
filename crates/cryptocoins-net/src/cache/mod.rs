//! Response cache used as a fallback when the network fails.
//!
//! The cache stores the most recent successful raw body per endpoint across
//! two bounded tiers: a small in-memory tier and a larger on-disk tier. Reads
//! prefer memory. A hit is served as-is; freshness is never revalidated.
//!
//! # Example
//!
//! ```ignore
//! use cryptocoins_net::cache::{CacheConfig, ResponseCache, TieredCache};
//!
//! let cache = TieredCache::from_config(&CacheConfig::default());
//! cache.put("https://api.example.com/coins", body);
//! let cached = cache.get("https://api.example.com/coins");
//! ```

mod disk;
mod memory;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use cryptocoins_core::logging::targets;
use parking_lot::Mutex;
use serde::Deserialize;

pub use disk::{DiskTier, entry_file_name};
pub use memory::MemoryTier;

/// Default memory tier capacity: 10 MiB.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10 * 1024 * 1024;
/// Default disk tier capacity: 50 MiB.
pub const DEFAULT_DISK_CAPACITY: u64 = 50 * 1024 * 1024;

/// Storage for the last successful response body per cache key.
///
/// Implementations must be safe to call concurrently. Each call is atomic on
/// its own; sequences of calls are not.
pub trait ResponseCache: Send + Sync {
    /// Look up the body stored for `key`.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Store `body` for `key`, replacing any previous body.
    fn put(&self, key: &str, body: Bytes);
}

/// Configuration for a [`TieredCache`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memory tier capacity in bytes.
    pub memory_capacity: usize,
    /// Disk tier capacity in bytes. Zero disables the disk tier.
    pub disk_capacity: u64,
    /// Disk tier directory. `None` uses the platform cache directory.
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            disk_capacity: DEFAULT_DISK_CAPACITY,
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Resolve the disk directory, falling back to the platform cache dir.
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Get the default disk cache directory.
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "cryptocoins")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".cache/cryptocoins"))
        .join("network-cache")
}

/// A two-tier response cache.
///
/// Writes to the same key are serialized by a per-key lock that covers both
/// tiers, so after concurrent writers finish, both tiers hold the body of the
/// last writer to complete.
pub struct TieredCache {
    memory: Mutex<MemoryTier>,
    disk: Option<DiskTier>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TieredCache {
    /// Create a memory-only cache.
    pub fn in_memory(memory_capacity: usize) -> Self {
        Self {
            memory: Mutex::new(MemoryTier::new(memory_capacity)),
            disk: None,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache with both tiers.
    pub fn with_disk(memory_capacity: usize, disk: DiskTier) -> Self {
        Self {
            disk: Some(disk),
            ..Self::in_memory(memory_capacity)
        }
    }

    /// Build a cache from configuration.
    ///
    /// If the disk tier cannot be opened the cache runs memory-only.
    pub fn from_config(config: &CacheConfig) -> Self {
        if config.disk_capacity == 0 {
            return Self::in_memory(config.memory_capacity);
        }

        let directory = config.resolved_directory();
        match DiskTier::open(&directory, config.disk_capacity) {
            Ok(disk) => Self::with_disk(config.memory_capacity, disk),
            Err(err) => {
                tracing::warn!(
                    target: targets::CACHE,
                    "Disk cache unavailable at {}: {}; using memory only",
                    directory.display(),
                    err
                );
                Self::in_memory(config.memory_capacity)
            }
        }
    }

    /// Get the disk tier, if configured.
    pub fn disk(&self) -> Option<&DiskTier> {
        self.disk.as_ref()
    }

    /// Check whether the memory tier holds `key`.
    pub fn memory_contains(&self, key: &str) -> bool {
        self.memory.lock().contains(key)
    }

    /// Bytes held by the memory tier.
    pub fn memory_used(&self) -> usize {
        self.memory.lock().used()
    }

    /// Remove `key` from both tiers.
    pub fn remove(&self, key: &str) {
        self.with_key_lock(key, || {
            self.memory.lock().remove(key);
            if let Some(disk) = &self.disk {
                if let Err(err) = disk.remove(key) {
                    tracing::warn!(target: targets::CACHE, "Failed to remove disk entry for {}: {}", key, err);
                }
            }
        });
    }

    /// Drop every entry from the memory tier.
    pub fn clear_memory(&self) {
        self.memory.lock().clear();
    }

    fn with_key_lock<R>(&self, key: &str, f: impl FnOnce() -> R) -> R {
        let lock = self
            .key_locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock();
            f()
        };

        // Clones are only taken under the map lock, so a count of one here
        // means no other caller holds the entry.
        let mut locks = self.key_locks.lock();
        drop(lock);
        if locks.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(key);
        }
        result
    }
}

impl ResponseCache for TieredCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        if let Some(body) = self.memory.lock().get(key) {
            tracing::trace!(target: targets::CACHE, "Memory hit for {}", key);
            return Some(body);
        }

        let disk = self.disk.as_ref()?;
        self.with_key_lock(key, || {
            // A writer may have landed while we waited for the key lock.
            if let Some(body) = self.memory.lock().get(key) {
                return Some(body);
            }
            match disk.get(key) {
                Ok(Some(body)) => {
                    tracing::trace!(target: targets::CACHE, "Disk hit for {}", key);
                    self.memory.lock().insert(key, body.clone());
                    Some(body)
                }
                Ok(None) => None,
                Err(err) => {
                    tracing::warn!(target: targets::CACHE, "Failed to read disk entry for {}: {}", key, err);
                    None
                }
            }
        })
    }

    fn put(&self, key: &str, body: Bytes) {
        self.with_key_lock(key, || {
            if !self.memory.lock().insert(key, body.clone()) {
                tracing::debug!(
                    target: targets::CACHE,
                    "Body for {} ({} bytes) exceeds the memory tier",
                    key,
                    body.len()
                );
            }
            if let Some(disk) = &self.disk {
                if let Err(err) = disk.put(key, &body) {
                    tracing::warn!(target: targets::CACHE, "Failed to write disk entry for {}: {}", key, err);
                }
            }
        });
    }
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("memory", &*self.memory.lock())
            .field("disk", &self.disk)
            .finish()
    }
}
