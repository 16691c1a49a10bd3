//! The external installer interface.
//!
//! Whisk decides *what* gets installed; putting files into the
//! environment is the installer process's job. The default
//! implementation shells out to the environment's pip with dependency
//! resolution disabled, since the graph is already resolved.

use camino::Utf8PathBuf;

use whisk_core::error::{WhiskError, WhiskResult};
use whisk_core::types::{DistKind, ResolvedCandidate};

/// Capability to install resolved candidates, in the given order
pub trait Installer {
    fn install(
        &self,
        candidates: &[&ResolvedCandidate],
    ) -> impl std::future::Future<Output = WhiskResult<()>> + Send;
}

/// Installer that shells out to `pip install --no-deps`
#[derive(Debug, Clone)]
pub struct PipInstaller {
    pip_executable: Utf8PathBuf,
}

impl PipInstaller {
    pub fn new(pip_executable: impl Into<Utf8PathBuf>) -> Self {
        Self {
            pip_executable: pip_executable.into(),
        }
    }

    /// Arguments for one candidate: editables install with `-e`
    fn candidate_args(candidate: &ResolvedCandidate) -> Vec<String> {
        match candidate.kind {
            DistKind::Editable => vec!["-e".to_string(), candidate.location.clone()],
            _ => vec![candidate.location.clone()],
        }
    }
}

impl Installer for PipInstaller {
    async fn install(&self, candidates: &[&ResolvedCandidate]) -> WhiskResult<()> {
        if candidates.is_empty() {
            return Ok(());
        }

        let mut command = tokio::process::Command::new(self.pip_executable.as_str());
        command.arg("install").arg("--no-deps");
        for candidate in candidates {
            command.args(Self::candidate_args(candidate));
        }

        let output = command
            .output()
            .await
            .map_err(|e| WhiskError::io(format!("Failed to run {}", self.pip_executable), e))?;

        if !output.status.success() {
            return Err(WhiskError::io(
                "pip install failed".to_string(),
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use whisk_core::types::Version;

    #[test]
    fn test_candidate_args() {
        let wheel = ResolvedCandidate::new(
            "pkg",
            Version::from_str("1.0").unwrap(),
            "/cache/pkg-1.0-py3-none-any.whl".to_string(),
            DistKind::CachedWheel,
        );
        assert_eq!(
            PipInstaller::candidate_args(&wheel),
            vec!["/cache/pkg-1.0-py3-none-any.whl"]
        );

        let editable = ResolvedCandidate::new(
            "local",
            Version::from_str("1").unwrap(),
            "tmp/local_package".to_string(),
            DistKind::Editable,
        );
        assert_eq!(
            PipInstaller::candidate_args(&editable),
            vec!["-e", "tmp/local_package"]
        );
    }
}
