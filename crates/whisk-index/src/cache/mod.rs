//! Project metadata caching with TTL support.

use dashmap::DashMap;
use std::time::{Duration, SystemTime};

use crate::api::ProjectMetadata;

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    /// Cached project document
    pub metadata: ProjectMetadata,
    /// When the entry was stored
    pub stored_at: SystemTime,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl MetadataEntry {
    /// Create new cache entry with default TTL (1 hour)
    pub fn new(metadata: ProjectMetadata) -> Self {
        Self::with_ttl(metadata, Duration::from_secs(3600))
    }

    /// Create cache entry with custom TTL
    pub fn with_ttl(metadata: ProjectMetadata, ttl: Duration) -> Self {
        Self {
            metadata,
            stored_at: SystemTime::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }

    /// Get age of cache entry
    pub fn age(&self) -> Option<Duration> {
        self.stored_at.elapsed().ok()
    }
}

/// In-process metadata cache. Keys combine the index URL with the
/// canonical project name, so a project found on an extra index never
/// shadows the primary's document.
#[derive(Debug, Default)]
pub struct MetadataCache {
    cache: DashMap<String, MetadataEntry>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get cached metadata if fresh
    pub fn get(&self, key: &str) -> Option<ProjectMetadata> {
        let entry = self.cache.get(key)?;
        if entry.is_fresh() {
            Some(entry.metadata.clone())
        } else {
            drop(entry);
            // Remove stale entry
            self.cache.remove(key);
            None
        }
    }

    /// Store metadata with default TTL
    pub fn insert(&self, key: String, metadata: ProjectMetadata) {
        self.cache.insert(key, MetadataEntry::new(metadata));
    }

    /// Store metadata with custom TTL
    pub fn insert_with_ttl(&self, key: String, metadata: ProjectMetadata, ttl: Duration) {
        self.cache.insert(key, MetadataEntry::with_ttl(metadata, ttl));
    }

    /// Check if a project document is cached and fresh
    pub fn contains_fresh(&self, key: &str) -> bool {
        self.cache
            .get(key)
            .map(|entry| entry.is_fresh())
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut fresh_count = 0;
        let mut stale_count = 0;

        for entry in self.cache.iter() {
            if entry.is_fresh() {
                fresh_count += 1;
            } else {
                stale_count += 1;
            }
        }

        CacheStats {
            total_entries: self.cache.len(),
            fresh_entries: fresh_count,
            stale_entries: stale_count,
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove stale entries, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let mut removed = 0;
        self.cache.retain(|_, entry| {
            if entry.is_fresh() {
                true
            } else {
                removed += 1;
                false
            }
        });
        removed
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries
    pub stale_entries: usize,
}
