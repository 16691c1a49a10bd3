//! Wheel store implementation.
//!
//! Writes are atomic per entry: content goes to a temporary file in the
//! cache directory and is renamed into place, so readers (including
//! concurrent whisk invocations sharing the cache) never observe a
//! partially-written wheel. The store is append-only; entries are only
//! removed by an explicit prune.

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use whisk_core::error::WhiskError;
use whisk_core::types::{PackageName, PlatformTags, SpecifierSet, WheelFilename};

use super::digest::compute_digest;
use super::index::{WheelEntry, WheelIndex};
use crate::CacheResult;

/// A wheel found in the local cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedWheel {
    pub filename: WheelFilename,
    pub path: Utf8PathBuf,
}

/// The wheel cache directory
#[derive(Debug)]
pub struct WheelStore {
    root_path: Utf8PathBuf,
    index: Arc<WheelIndex>,
}

impl WheelStore {
    /// Open (creating if necessary) a wheel store
    pub fn new<P: AsRef<Utf8Path>>(root_path: P) -> CacheResult<Self> {
        let root_path = root_path.as_ref().to_path_buf();

        fs::create_dir_all(&root_path)
            .map_err(|e| WhiskError::io("Failed to create wheel cache directory".to_string(), e))?;

        let index_path = root_path.join("index.json");
        let index = Arc::new(WheelIndex::load_or_create(index_path)?);

        Ok(Self { root_path, index })
    }

    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    fn path_for(&self, filename: &WheelFilename) -> Utf8PathBuf {
        self.root_path.join(filename.to_string())
    }

    /// Check if a wheel is cached
    pub fn contains(&self, filename: &WheelFilename) -> bool {
        self.path_for(filename).exists()
    }

    /// All wheels currently in the cache directory, sorted by filename.
    /// Files that are not wheels (the index, stray downloads) are
    /// ignored; pre-populated wheels are found without an index entry.
    pub fn list(&self) -> CacheResult<Vec<WheelFilename>> {
        let mut names: Vec<String> = fs::read_dir(&self.root_path)
            .map_err(|e| WhiskError::io("Failed to read wheel cache directory".to_string(), e))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        Ok(names
            .iter()
            .filter_map(|name| WheelFilename::from_str(name).ok())
            .collect())
    }

    /// Find the best cached wheel for a requirement: highest satisfying
    /// version (then highest build tag) among platform-compatible wheels.
    pub fn find(
        &self,
        name: &PackageName,
        specifiers: &SpecifierSet,
        tags: &PlatformTags,
    ) -> CacheResult<Option<CachedWheel>> {
        let best = self
            .list()?
            .into_iter()
            .filter(|wheel| &wheel.canonical_name() == name)
            .filter(|wheel| specifiers.matches(&wheel.version))
            .filter(|wheel| tags.supports(wheel))
            .max_by(|a, b| {
                (&a.version, build_tag_rank(a))
                    .cmp(&(&b.version, build_tag_rank(b)))
            });

        Ok(best.map(|filename| {
            let _ = self.index.touch(&filename.to_string());
            CachedWheel {
                path: self.path_for(&filename),
                filename,
            }
        }))
    }

    /// Store wheel content atomically. Re-adding an existing wheel is a
    /// no-op returning the cached entry.
    pub fn add_bytes(&self, filename: &WheelFilename, content: &[u8]) -> CacheResult<CachedWheel> {
        let path = self.path_for(filename);
        let key = filename.to_string();

        if path.exists() {
            let _ = self.index.touch(&key);
            return Ok(CachedWheel {
                filename: filename.clone(),
                path,
            });
        }

        // Temporary-then-rename keeps concurrent readers from seeing a
        // partial artifact
        let mut temp = tempfile::NamedTempFile::new_in(&self.root_path)
            .map_err(|e| WhiskError::io("Failed to create temporary wheel file".to_string(), e))?;
        temp.write_all(content)
            .map_err(|e| WhiskError::io("Failed to write wheel content".to_string(), e))?;
        temp.persist(&path).map_err(|e| {
            WhiskError::io("Failed to persist wheel into cache".to_string(), e.error)
        })?;

        let entry = WheelEntry::new(compute_digest(content), content.len() as u64);
        self.index.insert(key, entry);
        self.index.save()?;

        Ok(CachedWheel {
            filename: filename.clone(),
            path,
        })
    }

    /// Store an already-built wheel file (e.g. a build tool's output)
    pub fn add_file(&self, filename: &WheelFilename, source: &Path) -> CacheResult<CachedWheel> {
        let content = fs::read(source)
            .map_err(|e| WhiskError::io(format!("Failed to read {}", source.display()), e))?;
        self.add_bytes(filename, &content)
    }

    /// Read back a cached wheel's content
    pub fn read(&self, filename: &WheelFilename) -> CacheResult<Vec<u8>> {
        let path = self.path_for(filename);
        fs::read(&path).map_err(|e| WhiskError::io(format!("Failed to read {}", path), e))
    }

    /// Verify indexed wheels against their recorded digests, in
    /// parallel. Returns the filenames that are missing or corrupt.
    pub fn verify(&self) -> CacheResult<Vec<String>> {
        let mut corrupt: Vec<String> = self
            .index
            .filenames()
            .par_iter()
            .filter_map(|name| {
                let entry = self.index.get(name)?;
                let path = self.root_path.join(name);
                match fs::read(&path) {
                    Ok(content) if compute_digest(&content) == entry.digest => None,
                    _ => Some(name.clone()),
                }
            })
            .collect();
        corrupt.sort();
        Ok(corrupt)
    }

    /// Remove wheels unused for longer than `max_idle_days`
    pub fn prune(&self, max_idle_days: i64) -> CacheResult<PruneResult> {
        let max_idle_seconds = max_idle_days * 24 * 60 * 60;
        let mut result = PruneResult::default();

        for name in self.index.filenames() {
            let Some(entry) = self.index.get(&name) else {
                continue;
            };
            if entry.idle_seconds() <= max_idle_seconds {
                continue;
            }

            let path = self.root_path.join(&name);
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!("Warning: failed to remove {}: {}", path, e);
                    continue;
                }
            }
            self.index.remove(&name);
            result.entries_removed += 1;
            result.freed_space += entry.size;
        }

        self.index.save()?;
        Ok(result)
    }
}

/// Build tags order numerically by their leading digits
fn build_tag_rank(wheel: &WheelFilename) -> u64 {
    wheel
        .build_tag
        .as_deref()
        .map(|tag| {
            let digits: String = tag.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .unwrap_or(0)
}

/// Result of a prune operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneResult {
    /// Number of wheels removed
    pub entries_removed: usize,
    /// Bytes freed
    pub freed_space: u64,
}

impl PruneResult {
    /// Format freed space in human-readable form
    pub fn format_freed_space(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = self.freed_space as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.freed_space, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }
}
