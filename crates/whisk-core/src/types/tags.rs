//! Interpreter/platform compatibility tags.
//!
//! A wheel is installable when each of its tag sets intersects the
//! environment's supported tags.

use super::wheel::WheelFilename;

/// Tags supported by the target interpreter and platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTags {
    pub python: Vec<String>,
    pub abi: Vec<String>,
    pub platform: Vec<String>,
}

impl PlatformTags {
    pub fn new(python: Vec<String>, abi: Vec<String>, platform: Vec<String>) -> Self {
        Self {
            python,
            abi,
            platform,
        }
    }

    /// Tags for a CPython interpreter on the given platform, including
    /// the universal fallbacks
    pub fn cpython(major: u32, minor: u32, platform: &str) -> Self {
        let cp = format!("cp{}{}", major, minor);
        Self {
            python: vec![cp.clone(), format!("py{}", major)],
            abi: vec![cp, "abi3".to_string(), "none".to_string()],
            platform: vec![platform.to_string(), "any".to_string()],
        }
    }

    /// Check whether a wheel's tags are supported here
    pub fn supports(&self, wheel: &WheelFilename) -> bool {
        let overlaps = |ours: &[String], theirs: &[String]| {
            theirs.iter().any(|tag| ours.iter().any(|t| t == tag))
        };
        overlaps(&self.python, &wheel.python_tags)
            && overlaps(&self.abi, &wheel.abi_tags)
            && overlaps(&self.platform, &wheel.platform_tags)
    }
}

impl Default for PlatformTags {
    fn default() -> Self {
        Self::cpython(3, 11, "linux_x86_64")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_universal_wheel_always_supported() {
        let tags = PlatformTags::default();
        let wheel = WheelFilename::from_str("wheeled_package-0.2.0-py2.py3-none-any.whl").unwrap();
        assert!(tags.supports(&wheel));
    }

    #[test]
    fn test_platform_wheel_matching() {
        let tags = PlatformTags::cpython(3, 11, "manylinux_2_17_x86_64");
        let native =
            WheelFilename::from_str("fast_ext-1.4-cp311-cp311-manylinux_2_17_x86_64.whl").unwrap();
        assert!(tags.supports(&native));

        let other = WheelFilename::from_str("fast_ext-1.4-cp311-cp311-win_amd64.whl").unwrap();
        assert!(!tags.supports(&other));

        let wrong_python = WheelFilename::from_str("fast_ext-1.4-cp39-cp39-any.whl").unwrap();
        assert!(!tags.supports(&wrong_python));
    }
}
