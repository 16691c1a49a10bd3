//! Wheel cache index for metadata management.
//!
//! Tracks digests, sizes and access times for cached wheels. The index
//! is advisory: wheels dropped into the directory by external tooling
//! are still found by the store's directory scan.

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use whisk_core::error::WhiskError;

use super::digest::ArtifactDigest;
use crate::CacheResult;

/// Metadata for one cached wheel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelEntry {
    /// Blake3 digest of the wheel file
    pub digest: ArtifactDigest,
    /// Size in bytes
    pub size: u64,
    /// When the entry was stored (unix timestamp)
    pub stored_at: i64,
    /// When the entry was last used (unix timestamp)
    pub last_accessed: i64,
}

impl WheelEntry {
    pub fn new(digest: ArtifactDigest, size: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            digest,
            size,
            stored_at: now,
            last_accessed: now,
        }
    }

    /// Update last accessed time
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now().timestamp();
    }

    /// Age since last use, in seconds
    pub fn idle_seconds(&self) -> i64 {
        Utc::now().timestamp() - self.last_accessed
    }
}

/// Index over the wheel directory, keyed by wheel filename
#[derive(Debug)]
pub struct WheelIndex {
    entries: Arc<DashMap<String, WheelEntry>>,
    index_path: PathBuf,
}

impl WheelIndex {
    /// Load existing index or create new one
    pub fn load_or_create<P: AsRef<Path>>(index_path: P) -> CacheResult<Self> {
        let index_path = index_path.as_ref().to_path_buf();
        let entries = Arc::new(DashMap::new());

        if index_path.exists() {
            if let Ok(content) = fs::read_to_string(&index_path) {
                if let Ok(loaded) = serde_json::from_str::<Vec<(String, WheelEntry)>>(&content) {
                    for (key, entry) in loaded {
                        entries.insert(key, entry);
                    }
                }
                // An unreadable index is rebuilt from scratch
            }
        }

        Ok(Self {
            entries,
            index_path,
        })
    }

    pub fn insert(&self, filename: String, entry: WheelEntry) {
        self.entries.insert(filename, entry);
    }

    /// Get an entry, refreshing its access time
    pub fn touch(&self, filename: &str) -> Option<WheelEntry> {
        let mut entry = self.entries.get(filename)?.clone();
        entry.touch();
        self.entries.insert(filename.to_string(), entry.clone());
        Some(entry)
    }

    pub fn get(&self, filename: &str) -> Option<WheelEntry> {
        self.entries.get(filename).map(|entry| entry.clone())
    }

    pub fn remove(&self, filename: &str) -> Option<WheelEntry> {
        self.entries.remove(filename).map(|(_, entry)| entry)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Save index to disk
    pub fn save(&self) -> CacheResult<()> {
        let entries: Vec<(String, WheelEntry)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let content = serde_json::to_string_pretty(&entries).map_err(|e| {
            WhiskError::io(
                format!("Failed to serialize wheel index: {}", e),
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;

        if let Some(parent) = self.index_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| WhiskError::io("Failed to create index directory".to_string(), e))?;
        }

        fs::write(&self.index_path, content)
            .map_err(|e| WhiskError::io("Failed to write wheel index".to_string(), e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheels::digest::compute_digest;
    use tempfile::tempdir;

    #[test]
    fn test_index_operations() {
        let temp_dir = tempdir().unwrap();
        let index_path = temp_dir.path().join("index.json");

        let index = WheelIndex::load_or_create(&index_path).unwrap();
        let entry = WheelEntry::new(compute_digest(b"wheel"), 5);

        index.insert("pkg-1.0-py3-none-any.whl".to_string(), entry.clone());
        let retrieved = index.get("pkg-1.0-py3-none-any.whl").unwrap();
        assert_eq!(retrieved.digest, entry.digest);
        assert_eq!(retrieved.size, 5);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_persistence() {
        let temp_dir = tempdir().unwrap();
        let index_path = temp_dir.path().join("index.json");

        {
            let index = WheelIndex::load_or_create(&index_path).unwrap();
            let entry = WheelEntry::new(compute_digest(b"wheel"), 1024);
            index.insert("pkg-1.0-py3-none-any.whl".to_string(), entry);
            index.save().unwrap();
        }

        {
            let index = WheelIndex::load_or_create(&index_path).unwrap();
            let retrieved = index.get("pkg-1.0-py3-none-any.whl").unwrap();
            assert_eq!(retrieved.size, 1024);
        }
    }

    #[test]
    fn test_corrupt_index_starts_fresh() {
        let temp_dir = tempdir().unwrap();
        let index_path = temp_dir.path().join("index.json");
        fs::write(&index_path, "not json at all").unwrap();

        let index = WheelIndex::load_or_create(&index_path).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_touch_refreshes_access() {
        let temp_dir = tempdir().unwrap();
        let index = WheelIndex::load_or_create(temp_dir.path().join("index.json")).unwrap();

        let mut entry = WheelEntry::new(compute_digest(b"wheel"), 5);
        entry.last_accessed -= 1000;
        index.insert("pkg-1.0-py3-none-any.whl".to_string(), entry);

        let touched = index.touch("pkg-1.0-py3-none-any.whl").unwrap();
        assert!(touched.idle_seconds() < 1000);
    }
}
