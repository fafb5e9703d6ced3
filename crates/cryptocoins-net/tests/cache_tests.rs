//! Integration tests for the tiered response cache.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use cryptocoins_net::cache::{CacheConfig, DiskTier, ResponseCache, TieredCache, entry_file_name};

#[test]
fn test_disk_hit_is_promoted_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let key = "https://example.com/crypto";

    {
        let cache = TieredCache::with_disk(1024, DiskTier::open(dir.path(), 4096).unwrap());
        cache.put(key, Bytes::from_static(b"[1, 2, 3]"));
    }
    assert!(dir.path().join(entry_file_name(key)).exists());

    // A fresh process starts with an empty memory tier.
    let cache = TieredCache::with_disk(1024, DiskTier::open(dir.path(), 4096).unwrap());
    assert!(!cache.memory_contains(key));
    assert_eq!(cache.get(key), Some(Bytes::from_static(b"[1, 2, 3]")));
    assert!(cache.memory_contains(key));
}

#[test]
fn test_memory_tier_is_preferred() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TieredCache::with_disk(1024, DiskTier::open(dir.path(), 4096).unwrap());
    let key = "https://example.com/crypto";

    cache.put(key, Bytes::from_static(b"first"));
    // Overwrite the disk copy behind the cache's back.
    std::fs::write(dir.path().join(entry_file_name(key)), b"stale").unwrap();
    assert_eq!(cache.get(key), Some(Bytes::from_static(b"first")));
}

#[test]
fn test_body_larger_than_memory_is_served_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TieredCache::with_disk(8, DiskTier::open(dir.path(), 4096).unwrap());
    let body = Bytes::from(vec![7u8; 64]);

    cache.put("big", body.clone());
    assert!(!cache.memory_contains("big"));
    assert_eq!(cache.get("big"), Some(body));
}

#[test]
fn test_remove_clears_both_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TieredCache::with_disk(1024, DiskTier::open(dir.path(), 4096).unwrap());

    cache.put("k", Bytes::from_static(b"v"));
    cache.remove("k");
    assert_eq!(cache.get("k"), None);
    assert!(cache.disk().unwrap().is_empty());
}

#[test]
fn test_from_config_uses_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        memory_capacity: 1024,
        disk_capacity: 4096,
        directory: Some(dir.path().join("network-cache")),
    };

    let cache = TieredCache::from_config(&config);
    cache.put("k", Bytes::from_static(b"v"));
    let disk = cache.disk().expect("disk tier should be enabled");
    assert_eq!(disk.directory(), dir.path().join("network-cache"));
    assert_eq!(disk.len(), 1);
}

#[test]
fn test_unusable_directory_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("occupied");
    std::fs::write(&file, b"not a directory").unwrap();

    let cache = TieredCache::from_config(&CacheConfig {
        directory: Some(file),
        ..CacheConfig::default()
    });
    assert!(cache.disk().is_none());
    cache.put("k", Bytes::from_static(b"v"));
    assert_eq!(cache.get("k"), Some(Bytes::from_static(b"v")));
}

#[test]
fn test_concurrent_same_key_writes_agree_across_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(TieredCache::with_disk(
        1024 * 1024,
        DiskTier::open(dir.path(), 1024 * 1024).unwrap(),
    ));
    let key = "https://example.com/crypto";

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for round in 0..20 {
                    cache.put(key, Bytes::from(format!("writer-{i}-round-{round}")));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let from_memory = cache.get(key).unwrap();
    let from_disk = cache.disk().unwrap().get(key).unwrap().unwrap();
    assert_eq!(from_memory, from_disk);
    assert!(from_memory.ends_with(b"round-19"));
}
