//! Installer settings.
//!
//! Everything that used to be ambient process state in pip wrappers
//! (target environment, cache directory, index URLs, interpreter tags)
//! lives in an explicit Settings object handed to each component, so
//! isolated test runs never fight over globals.
//!
//! Precedence: built-in defaults < `whisk.toml` < `WHISK_*` environment
//! variables < command-line flags (applied by the CLI).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use url::Url;
use whisk_core::error::WhiskError;
use whisk_core::types::PlatformTags;

use crate::ConfigResult;

/// On-disk configuration (`whisk.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiskToml {
    /// Install behavior
    #[serde(default)]
    pub install: InstallSection,

    /// Wheel cache configuration
    #[serde(default)]
    pub cache: CacheSection,
}

/// `[install]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallSection {
    /// Target virtualenv directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv: Option<String>,

    /// Primary package index
    #[serde(skip_serializing_if = "Option::is_none", rename = "index-url")]
    pub index_url: Option<String>,

    /// Extra indexes, queried after the primary
    #[serde(default, rename = "extra-index-urls")]
    pub extra_index_urls: Vec<String>,

    /// Interpreter version for wheel tag matching, e.g. "3.11"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// Platform tag for wheel matching, e.g. "manylinux_2_17_x86_64"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// `[cache]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Wheel cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Resolved installer settings passed to every component
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub venv: Utf8PathBuf,
    pub cache_dir: Utf8PathBuf,
    pub index_url: String,
    pub extra_index_urls: Vec<String>,
    pub python: (u32, u32),
    pub platform: String,
}

impl Settings {
    pub const DEFAULT_INDEX_URL: &'static str = "https://pypi.org/pypi";

    /// Load settings for a working directory: defaults, then
    /// `whisk.toml` if present, then environment overrides.
    pub fn load(cwd: &Path) -> ConfigResult<Self> {
        let file = WhiskToml::load(&cwd.join("whisk.toml"))?;
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::assemble(file, &env)
    }

    /// Assemble settings from parsed file content and an environment
    /// map (injectable for tests)
    pub fn assemble(file: WhiskToml, env: &HashMap<String, String>) -> ConfigResult<Self> {
        let venv = env
            .get("WHISK_VENV")
            .cloned()
            .or(file.install.venv)
            .unwrap_or_else(|| "venv".to_string());

        let cache_dir = env
            .get("WHISK_CACHE_DIR")
            .cloned()
            .or(file.cache.dir)
            .map(Utf8PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        let index_url = env
            .get("WHISK_INDEX_URL")
            .cloned()
            .or(file.install.index_url)
            .unwrap_or_else(|| Self::DEFAULT_INDEX_URL.to_string());

        let mut extra_index_urls = file.install.extra_index_urls;
        if let Some(extra) = env.get("WHISK_EXTRA_INDEX_URL") {
            extra_index_urls.extend(extra.split_whitespace().map(|s| s.to_string()));
        }

        for candidate in std::iter::once(&index_url).chain(extra_index_urls.iter()) {
            Url::parse(candidate).map_err(|e| WhiskError::SettingsValidation {
                field: "index-url".to_string(),
                reason: format!("'{}': {}", candidate, e),
            })?;
        }

        let python = parse_python_version(
            env.get("WHISK_PYTHON")
                .cloned()
                .or(file.install.python)
                .as_deref(),
        )?;

        let platform = env
            .get("WHISK_PLATFORM")
            .cloned()
            .or(file.install.platform)
            .unwrap_or_else(|| "linux_x86_64".to_string());

        Ok(Self {
            venv: Utf8PathBuf::from(venv),
            cache_dir,
            index_url,
            extra_index_urls,
            python,
            platform,
        })
    }

    /// Compatibility tags for candidate selection
    pub fn platform_tags(&self) -> PlatformTags {
        PlatformTags::cpython(self.python.0, self.python.1, &self.platform)
    }

    /// The environment's site-packages directory
    pub fn site_packages(&self) -> Utf8PathBuf {
        self.venv
            .join("lib")
            .join(format!("python{}.{}", self.python.0, self.python.1))
            .join("site-packages")
    }
}

impl WhiskToml {
    /// Load a whisk.toml, returning defaults when the file is absent
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| WhiskError::io(format!("Failed to read {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| WhiskError::SettingsValidation {
            field: "whisk.toml".to_string(),
            reason: e.to_string(),
        })
    }
}

fn default_cache_dir() -> Utf8PathBuf {
    let home = dirs::home_dir()
        .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."));
    home.join(".whisk").join("wheels")
}

fn parse_python_version(text: Option<&str>) -> ConfigResult<(u32, u32)> {
    let Some(text) = text else {
        return Ok((3, 11));
    };
    let invalid = || WhiskError::SettingsValidation {
        field: "python".to_string(),
        reason: format!("'{}' is not a MAJOR.MINOR version", text),
    };
    let (major, minor) = text.split_once('.').ok_or_else(invalid)?;
    Ok((
        major.parse().map_err(|_| invalid())?,
        minor.parse().map_err(|_| invalid())?,
    ))
}
