//! Wheel building.
//!
//! Building is an external, potentially slow subprocess per
//! distribution; whisk only defines the capability and a thin shim that
//! shells out to the environment's pip. Cache writes happen in the
//! caller (the finder), so a builder never touches the wheel cache.

use std::fs;
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use whisk_core::error::WhiskError;

use crate::IndexResult;

/// Capability to turn a source tree into a built wheel file
pub trait WheelBuilder: Send + Sync {
    /// Build a wheel from `source`, placing it in `out_dir`; returns the
    /// path of the built wheel
    fn build(
        &self,
        source: &Path,
        out_dir: &Path,
    ) -> impl std::future::Future<Output = IndexResult<PathBuf>> + Send;
}

/// Builder that shells out to `pip wheel`
#[derive(Debug, Clone)]
pub struct PipWheelBuilder {
    pip_executable: Utf8PathBuf,
}

impl PipWheelBuilder {
    pub fn new(pip_executable: impl Into<Utf8PathBuf>) -> Self {
        Self {
            pip_executable: pip_executable.into(),
        }
    }
}

impl WheelBuilder for PipWheelBuilder {
    async fn build(&self, source: &Path, out_dir: &Path) -> IndexResult<PathBuf> {
        let output = tokio::process::Command::new(self.pip_executable.as_str())
            .arg("wheel")
            .arg("--no-deps")
            .arg("--wheel-dir")
            .arg(out_dir)
            .arg(source)
            .output()
            .await
            .map_err(|e| WhiskError::io(format!("Failed to run {}", self.pip_executable), e))?;

        if !output.status.success() {
            return Err(WhiskError::WheelBuild {
                package: source.display().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        newest_wheel_in(out_dir).ok_or_else(|| WhiskError::WheelBuild {
            package: source.display().to_string(),
            message: "build reported success but produced no wheel".to_string(),
        })
    }
}

/// The most recently modified wheel in a directory
fn newest_wheel_in(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "whl").unwrap_or(false))
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|meta| meta.modified())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_newest_wheel_in() {
        let dir = tempfile::tempdir().unwrap();
        assert!(newest_wheel_in(dir.path()).is_none());

        fs::write(dir.path().join("not-a-wheel.txt"), b"x").unwrap();
        assert!(newest_wheel_in(dir.path()).is_none());

        let mut file = fs::File::create(dir.path().join("pkg-1.0-py3-none-any.whl")).unwrap();
        file.write_all(b"wheel").unwrap();

        let found = newest_wheel_in(dir.path()).unwrap();
        assert!(found.ends_with("pkg-1.0-py3-none-any.whl"));
    }
}
