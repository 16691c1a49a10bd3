//! Source-distribution extraction.
//!
//! Sdists are gzipped tarballs; extraction validates every entry path so
//! a hostile archive cannot write outside the destination directory.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;

use whisk_core::error::WhiskError;
use whisk_core::utils::path::is_safe_path;

use crate::CacheResult;

/// Extract a gzipped sdist tarball into a destination directory
pub fn extract_sdist<R: Read>(reader: R, dest_dir: &Path) -> CacheResult<()> {
    let gz_decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(gz_decoder);

    fs::create_dir_all(dest_dir)
        .map_err(|e| WhiskError::io("Failed to create extraction directory".to_string(), e))?;

    let entries = archive
        .entries()
        .map_err(|e| WhiskError::io("Failed to read sdist archive".to_string(), e))?;

    for entry_result in entries {
        let mut entry =
            entry_result.map_err(|e| WhiskError::io("Failed to read sdist entry".to_string(), e))?;

        let entry_path = entry
            .path()
            .map_err(|e| WhiskError::io("Failed to read sdist entry path".to_string(), e))?
            .into_owned();
        let safe_path = validate_extract_path(&entry_path, dest_dir)?;

        match entry.header().entry_type() {
            tar::EntryType::Regular => {
                extract_regular_file(&mut entry, &safe_path)?;
            },
            tar::EntryType::Directory => {
                fs::create_dir_all(&safe_path)
                    .map_err(|e| WhiskError::io("Failed to create directory".to_string(), e))?;
            },
            tar::EntryType::Symlink | tar::EntryType::Link => {
                extract_symlink(&mut entry, &safe_path, dest_dir)?;
            },
            _ => {
                // Skip device nodes and other special entries
                continue;
            },
        }

        if let Ok(mode) = entry.header().mode() {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if safe_path.exists() {
                    let permissions = fs::Permissions::from_mode(mode);
                    let _ = fs::set_permissions(&safe_path, permissions);
                }
            }
            #[cfg(not(unix))]
            let _ = mode;
        }
    }

    Ok(())
}

/// Validate an archive entry path against directory traversal
fn validate_extract_path(entry_path: &Path, dest_dir: &Path) -> CacheResult<PathBuf> {
    if !is_safe_path(entry_path) {
        return Err(WhiskError::IntegrityFailure {
            package: "sdist".to_string(),
            expected: "safe relative path".to_string(),
            actual: format!("traversal attempt: {}", entry_path.display()),
        });
    }

    let mut safe_path = dest_dir.to_path_buf();
    for component in entry_path.components() {
        if let std::path::Component::Normal(name) = component {
            safe_path.push(name);
        }
    }

    if !safe_path.starts_with(dest_dir) {
        return Err(WhiskError::IntegrityFailure {
            package: "sdist".to_string(),
            expected: "path within destination".to_string(),
            actual: format!("path escapes: {}", entry_path.display()),
        });
    }

    Ok(safe_path)
}

/// Extract a regular file, streaming without buffering into memory
fn extract_regular_file<R: Read>(entry: &mut tar::Entry<R>, dest_path: &Path) -> CacheResult<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| WhiskError::io("Failed to create parent directory".to_string(), e))?;
    }

    let mut file = fs::File::create(dest_path)
        .map_err(|e| WhiskError::io("Failed to create extracted file".to_string(), e))?;

    std::io::copy(entry, &mut file)
        .map_err(|e| WhiskError::io("Failed to extract file content".to_string(), e))?;

    Ok(())
}

/// Extract a symlink after validating that its target stays inside the
/// destination
fn extract_symlink<R: Read>(
    entry: &mut tar::Entry<R>,
    dest_path: &Path,
    dest_dir: &Path,
) -> CacheResult<()> {
    let Ok(Some(target_path)) = entry.link_name() else {
        return Ok(());
    };

    if target_path.is_absolute() {
        return Err(WhiskError::IntegrityFailure {
            package: "sdist".to_string(),
            expected: "relative symlink".to_string(),
            actual: "absolute symlink target".to_string(),
        });
    }

    let resolved_target = dest_path.parent().unwrap_or(dest_dir).join(&target_path);
    if !resolved_target.starts_with(dest_dir) {
        return Err(WhiskError::IntegrityFailure {
            package: "sdist".to_string(),
            expected: "symlink within destination".to_string(),
            actual: "symlink escapes destination".to_string(),
        });
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| WhiskError::io("Failed to create parent directory".to_string(), e))?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target_path, dest_path)
            .map_err(|e| WhiskError::io("Failed to create symlink".to_string(), e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;
    use tempfile::tempdir;

    fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let gz_encoder = GzEncoder::new(&mut data, Compression::default());
            let mut tar_builder = Builder::new(gz_encoder);

            for (path, content) in entries {
                let mut header = tar::Header::new_gnu();
                // `set_path` rejects `..`, so write the raw name bytes directly in
                // order to craft traversal entries the extractor must reject.
                let name_bytes = path.as_bytes();
                let gnu = header.as_gnu_mut().unwrap();
                gnu.name[..name_bytes.len()].copy_from_slice(name_bytes);
                header.set_size(content.len() as u64);
                header.set_cksum();
                tar_builder.append(&header, content.as_bytes()).unwrap();
            }

            tar_builder.finish().unwrap();
        }
        data
    }

    #[test]
    fn test_extract_simple_sdist() {
        let temp_dir = tempdir().unwrap();
        let extract_dir = temp_dir.path().join("extract");

        let data = build_archive(&[
            ("pkg-1.0/setup.py", "from setuptools import setup"),
            ("pkg-1.0/pkg/__init__.py", ""),
        ]);

        extract_sdist(std::io::Cursor::new(data), &extract_dir).unwrap();

        let setup = extract_dir.join("pkg-1.0/setup.py");
        assert!(setup.exists());
        assert_eq!(
            fs::read_to_string(setup).unwrap(),
            "from setuptools import setup"
        );
        assert!(extract_dir.join("pkg-1.0/pkg/__init__.py").exists());
    }

    #[test]
    fn test_traversal_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let extract_dir = temp_dir.path().join("extract");

        let data = build_archive(&[("pkg/../../escape.txt", "gotcha")]);

        let result = extract_sdist(std::io::Cursor::new(data), &extract_dir);
        assert!(result.is_err());
        assert!(!temp_dir.path().join("escape.txt").exists());
    }
}
