//! Wheel filename parsing.
//!
//! `{distribution}-{version}(-{build})?-{python}-{abi}-{platform}.whl`,
//! parsed from the right since the build tag is optional. The embedded
//! version is authoritative for direct-URL installs.

use std::fmt;
use std::str::FromStr;

use super::name::PackageName;
use super::version::Version;

/// Parsed components of a wheel filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    /// Distribution name as embedded (underscores, per the wheel spec)
    pub distribution: String,
    pub version: Version,
    /// Optional numeric-prefixed build tag
    pub build_tag: Option<String>,
    /// Dot-separated compressed tag sets
    pub python_tags: Vec<String>,
    pub abi_tags: Vec<String>,
    pub platform_tags: Vec<String>,
}

impl WheelFilename {
    /// Canonical name of the embedded distribution
    pub fn canonical_name(&self) -> PackageName {
        PackageName::new(&self.distribution)
    }

    /// Stem without the `.whl` suffix
    pub fn stem(&self) -> String {
        let mut parts = vec![self.distribution.clone(), self.version.to_string()];
        if let Some(build) = &self.build_tag {
            parts.push(build.clone());
        }
        parts.push(self.python_tags.join("."));
        parts.push(self.abi_tags.join("."));
        parts.push(self.platform_tags.join("."));
        parts.join("-")
    }
}

impl FromStr for WheelFilename {
    type Err = String;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| format!("'{}' is not a wheel filename", filename))?;

        let parts: Vec<&str> = stem.split('-').collect();
        if parts.len() < 5 || parts.len() > 6 {
            return Err(format!(
                "'{}' does not match name-version[-build]-python-abi-platform.whl",
                filename
            ));
        }

        let (distribution, version_str, build_tag) = if parts.len() == 6 {
            (parts[0], parts[1], Some(parts[2].to_string()))
        } else {
            (parts[0], parts[1], None)
        };

        if let Some(build) = &build_tag {
            if !build.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(format!("build tag '{}' must start with a digit", build));
            }
        }

        let version = Version::from_str(version_str)
            .map_err(|e| format!("bad version in '{}': {}", filename, e))?;

        let tags = &parts[parts.len() - 3..];
        let split_tags = |t: &str| t.split('.').map(|s| s.to_string()).collect::<Vec<_>>();

        Ok(Self {
            distribution: distribution.to_string(),
            version,
            build_tag,
            python_tags: split_tags(tags[0]),
            abi_tags: split_tags(tags[1]),
            platform_tags: split_tags(tags[2]),
        })
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.whl", self.stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_universal_wheel() {
        let wheel = WheelFilename::from_str("wheeled_package-0.2.0-py2.py3-none-any.whl").unwrap();
        assert_eq!(wheel.distribution, "wheeled_package");
        assert_eq!(wheel.version, Version::from_str("0.2.0").unwrap());
        assert_eq!(wheel.build_tag, None);
        assert_eq!(wheel.python_tags, vec!["py2", "py3"]);
        assert_eq!(wheel.abi_tags, vec!["none"]);
        assert_eq!(wheel.platform_tags, vec!["any"]);
        assert_eq!(wheel.canonical_name().as_str(), "wheeled-package");
    }

    #[test]
    fn test_parse_platform_wheel_with_build_tag() {
        let wheel =
            WheelFilename::from_str("fast_ext-1.4-1-cp311-cp311-manylinux_2_17_x86_64.whl")
                .unwrap();
        assert_eq!(wheel.build_tag, Some("1".to_string()));
        assert_eq!(wheel.python_tags, vec!["cp311"]);
        assert_eq!(wheel.platform_tags, vec!["manylinux_2_17_x86_64"]);
    }

    #[test]
    fn test_round_trip() {
        for name in [
            "wheeled_package-0.2.0-py2.py3-none-any.whl",
            "fast_ext-1.4-1-cp311-cp311-manylinux_2_17_x86_64.whl",
        ] {
            let wheel = WheelFilename::from_str(name).unwrap();
            assert_eq!(wheel.to_string(), name);
        }
    }

    #[test]
    fn test_rejects_non_wheels() {
        assert!(WheelFilename::from_str("package-1.0.tar.gz").is_err());
        assert!(WheelFilename::from_str("short-1.0.whl").is_err());
        assert!(WheelFilename::from_str("a-1-2-3-4-5-6.whl").is_err());
        assert!(WheelFilename::from_str("pkg-1.0-x-py3-none-any.whl").is_err());
    }
}
