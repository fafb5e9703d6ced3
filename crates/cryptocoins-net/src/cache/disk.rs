//! Byte-bounded on-disk cache tier.
//!
//! Each body lives in its own file named after the SHA-256 of the cache key.
//! Writes go through a temporary file in the same directory followed by an
//! atomic rename, so readers never observe a partially written body.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use cryptocoins_core::logging::targets;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Compute the file name used for a cache key.
pub fn entry_file_name(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_entry_file_name(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Default)]
struct DiskIndex {
    used: u64,
    tick: u64,
    // file name -> (size, last_used tick)
    entries: HashMap<String, (u64, u64)>,
    recency: BTreeMap<u64, String>,
}

impl DiskIndex {
    fn touch(&mut self, name: &str) {
        self.tick += 1;
        let tick = self.tick;
        if let Some((_, last_used)) = self.entries.get_mut(name) {
            self.recency.remove(last_used);
            *last_used = tick;
            self.recency.insert(tick, name.to_string());
        }
    }

    fn record(&mut self, name: &str, size: u64) {
        self.forget(name);
        self.tick += 1;
        self.used += size;
        self.entries.insert(name.to_string(), (size, self.tick));
        self.recency.insert(self.tick, name.to_string());
    }

    fn forget(&mut self, name: &str) {
        if let Some((size, last_used)) = self.entries.remove(name) {
            self.recency.remove(&last_used);
            self.used -= size;
        }
    }

    fn pop_oldest_except(&mut self, keep: Option<&str>) -> Option<String> {
        let victim = self
            .recency
            .values()
            .find(|name| Some(name.as_str()) != keep)
            .cloned()?;
        self.forget(&victim);
        Some(victim)
    }
}

/// A directory-backed LRU store bounded by total body size.
pub struct DiskTier {
    directory: PathBuf,
    capacity: u64,
    index: Mutex<DiskIndex>,
}

impl DiskTier {
    /// Open (creating if needed) a disk tier in `directory`.
    ///
    /// Existing entries are indexed oldest-modified first and trimmed to
    /// `capacity`.
    pub fn open(directory: impl Into<PathBuf>, capacity: u64) -> io::Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        let mut existing = Vec::new();
        for entry in fs::read_dir(&directory)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_entry_file_name(&name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            existing.push((modified, name, metadata.len()));
        }
        existing.sort();

        let mut index = DiskIndex::default();
        for (_, name, size) in existing {
            index.record(&name, size);
        }

        let tier = Self {
            directory,
            capacity,
            index: Mutex::new(index),
        };
        tier.evict_over_capacity(None);

        tracing::debug!(
            target: targets::CACHE,
            directory = %tier.directory.display(),
            entries = tier.len(),
            used = tier.used(),
            "Opened disk cache tier"
        );
        Ok(tier)
    }

    /// The directory holding the entries.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Configured capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes currently held.
    pub fn used(&self) -> u64 {
        self.index.lock().used
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.index.lock().entries.len()
    }

    /// Check if the tier is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a body, marking it most recently used.
    pub fn get(&self, key: &str) -> io::Result<Option<Bytes>> {
        let name = entry_file_name(key);
        match fs::read(self.directory.join(&name)) {
            Ok(body) => {
                self.index.lock().touch(&name);
                Ok(Some(Bytes::from(body)))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.index.lock().forget(&name);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Write a body, evicting least recently used entries beyond capacity.
    ///
    /// Returns `Ok(false)` when the body alone exceeds the capacity.
    pub fn put(&self, key: &str, body: &[u8]) -> io::Result<bool> {
        let name = entry_file_name(key);
        if body.len() as u64 > self.capacity {
            self.remove_file(&name)?;
            return Ok(false);
        }

        let mut temp = tempfile::NamedTempFile::new_in(&self.directory)?;
        temp.write_all(body)?;
        temp.as_file().sync_data()?;
        temp.persist(self.directory.join(&name))
            .map_err(|err| err.error)?;

        self.index.lock().record(&name, body.len() as u64);
        self.evict_over_capacity(Some(&name));
        Ok(true)
    }

    /// Remove an entry.
    pub fn remove(&self, key: &str) -> io::Result<()> {
        self.remove_file(&entry_file_name(key))
    }

    fn remove_file(&self, name: &str) -> io::Result<()> {
        self.index.lock().forget(name);
        match fs::remove_file(self.directory.join(name)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    fn evict_over_capacity(&self, keep: Option<&str>) {
        loop {
            let victim = {
                let mut index = self.index.lock();
                if index.used <= self.capacity {
                    return;
                }
                match index.pop_oldest_except(keep) {
                    Some(victim) => victim,
                    None => return,
                }
            };
            if let Err(err) = fs::remove_file(self.directory.join(&victim)) {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(target: targets::CACHE, "Failed to evict cache file {}: {}", victim, err);
                }
            }
        }
    }
}

impl std::fmt::Debug for DiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskTier")
            .field("directory", &self.directory)
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .finish()
    }
}
