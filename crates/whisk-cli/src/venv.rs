//! Target environment access.
//!
//! The environment's installed-package state is read-only input for
//! conflict detection. On failure the environment is marked invalid by
//! rewinding its modification time more than a day into the past, so
//! make-style staleness checks treating it as an output rebuild it.

use std::fs;
use std::time::{Duration, SystemTime};

use camino::Utf8Path;
use walkdir::WalkDir;

use whisk_config::Settings;
use whisk_core::error::{WhiskError, WhiskResult};
use whisk_core::types::{EnvironmentState, InstalledPackage};
use whisk_index::{DistInspector, WheelMetadataInspector};

/// How far back an invalidated environment's mtime is set
const INVALIDATION_REWIND: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Read the installed packages of the target environment from its
/// `site-packages/*.dist-info/METADATA` records
pub fn read_environment(settings: &Settings) -> WhiskResult<EnvironmentState> {
    let site_packages = settings.site_packages();
    if !site_packages.as_std_path().is_dir() {
        return Ok(EnvironmentState::default());
    }

    let mut packages = Vec::new();

    for entry in WalkDir::new(&site_packages)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            WhiskError::io(
                format!("Failed to scan {}", site_packages),
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }
        let dir_name = entry.file_name().to_string_lossy();
        if !dir_name.ends_with(".dist-info") {
            continue;
        }

        let metadata_path = entry.path().join("METADATA");
        let Ok(text) = fs::read_to_string(&metadata_path) else {
            tracing::debug!("no METADATA in {}", dir_name);
            continue;
        };

        match WheelMetadataInspector::from_text(&text).and_then(|m| m.project()) {
            Ok((name, version)) => {
                packages.push(InstalledPackage::new(
                    &name,
                    version,
                    site_packages.to_string(),
                ));
            },
            Err(e) => {
                tracing::debug!("skipping {}: {}", dir_name, e);
            },
        }
    }

    Ok(EnvironmentState::new(packages))
}

/// Mark the environment invalid by sending its mtime back in time
pub fn mark_invalid(venv: &Utf8Path) -> WhiskResult<()> {
    let dir = fs::File::open(venv.as_std_path())
        .map_err(|e| WhiskError::io(format!("Failed to open {}", venv), e))?;

    let past = SystemTime::now() - INVALIDATION_REWIND;
    dir.set_modified(past)
        .map_err(|e| WhiskError::io(format!("Failed to rewind mtime of {}", venv), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::collections::HashMap;
    use std::str::FromStr;
    use whisk_config::WhiskToml;
    use whisk_core::types::{PackageName, Version};

    fn settings_for(venv: &Utf8Path) -> Settings {
        let mut env = HashMap::new();
        env.insert("WHISK_VENV".to_string(), venv.to_string());
        Settings::assemble(WhiskToml::default(), &env).unwrap()
    }

    #[test]
    fn test_read_environment_missing_venv() {
        let dir = tempfile::tempdir().unwrap();
        let venv = Utf8PathBuf::from_path_buf(dir.path().join("venv")).unwrap();
        let state = read_environment(&settings_for(&venv)).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_read_environment_parses_dist_info() {
        let dir = tempfile::tempdir().unwrap();
        let venv = Utf8PathBuf::from_path_buf(dir.path().join("venv")).unwrap();
        let settings = settings_for(&venv);

        let site = settings.site_packages();
        let dist_info = site.join("many_versions_package-3.dist-info");
        fs::create_dir_all(&dist_info).unwrap();
        fs::write(
            dist_info.join("METADATA"),
            "Metadata-Version: 2.1\nName: many-versions-package\nVersion: 3\n",
        )
        .unwrap();
        // A non-dist-info directory is ignored
        fs::create_dir_all(site.join("many_versions_package")).unwrap();

        let state = read_environment(&settings).unwrap();
        assert_eq!(state.len(), 1);

        let installed = state.get(&PackageName::new("many-versions-package")).unwrap();
        assert_eq!(installed.version, Version::from_str("3").unwrap());
        assert_eq!(installed.location, site.to_string());
    }

    #[test]
    fn test_mark_invalid_rewinds_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let venv = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        mark_invalid(&venv).unwrap();

        let modified = fs::metadata(dir.path()).unwrap().modified().unwrap();
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        // More than one day in the past, per the staleness contract
        assert!(age > Duration::from_secs(24 * 60 * 60));
    }
}
