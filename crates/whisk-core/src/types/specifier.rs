//! Version specifiers (`==`, `!=`, `<=`, `>=`, `<`, `>`, `~=`, `==N.*`).
//!
//! A SpecifierSet keeps the text it was parsed from: diagnostic lines
//! must print constraints exactly as the user (or a package's metadata)
//! wrote them, e.g. `many-versions-package<2`.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use std::str::FromStr;

use super::version::{Version, VersionError};

/// Comparison operator for a single specifier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Archive,
    Deserialize,
    Serialize,
    SerdeDeserialize,
    SerdeSerialize,
)]
#[archive(check_bytes)]
pub enum Op {
    Eq,         // ==1.0
    Ne,         // !=1.0
    Le,         // <=1.0
    Ge,         // >=1.0
    Lt,         // <1.0
    Gt,         // >1.0
    Compatible, // ~=1.2.3
}

/// Single version comparator
#[derive(Debug, Clone, PartialEq, Eq, Archive, Deserialize, Serialize)]
#[archive(check_bytes)]
pub struct Specifier {
    pub op: Op,
    pub version: Version,
    /// `==1.*` style prefix match (only with Eq/Ne)
    pub star: bool,
}

/// Comma-joined set of specifiers; empty means "any version"
#[derive(Debug, Clone, PartialEq, Eq, Archive, Deserialize, Serialize)]
#[archive(check_bytes)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
    raw: String,
}

impl Specifier {
    fn parse(input: &str) -> Result<Self, VersionError> {
        let input = input.trim();
        let (op, version_str) = if let Some(stripped) = input.strip_prefix("==") {
            (Op::Eq, stripped)
        } else if let Some(stripped) = input.strip_prefix("!=") {
            (Op::Ne, stripped)
        } else if let Some(stripped) = input.strip_prefix("<=") {
            (Op::Le, stripped)
        } else if let Some(stripped) = input.strip_prefix(">=") {
            (Op::Ge, stripped)
        } else if let Some(stripped) = input.strip_prefix("~=") {
            (Op::Compatible, stripped)
        } else if let Some(stripped) = input.strip_prefix('<') {
            (Op::Lt, stripped)
        } else if let Some(stripped) = input.strip_prefix('>') {
            (Op::Gt, stripped)
        } else if let Some(stripped) = input.strip_prefix('=') {
            // Lone "=pkg==1" typo-form is not accepted; "=1.0" is
            (Op::Eq, stripped)
        } else {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        };

        let version_str = version_str.trim();
        let (version_str, star) = match version_str.strip_suffix(".*") {
            Some(prefix) if matches!(op, Op::Eq | Op::Ne) => (prefix, true),
            _ => (version_str, false),
        };

        let version = Version::from_str(version_str)?;
        Ok(Specifier { op, version, star })
    }

    /// Check if a version matches this comparator
    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Eq if self.star => version.release_starts_with(&self.version.release),
            Op::Ne if self.star => !version.release_starts_with(&self.version.release),
            Op::Eq => version == &self.version,
            Op::Ne => version != &self.version,
            Op::Le => version <= &self.version,
            Op::Ge => version >= &self.version,
            Op::Lt => version < &self.version,
            Op::Gt => version > &self.version,
            Op::Compatible => self.matches_compatible(version),
        }
    }

    /// `~=X.Y.Z` means `>=X.Y.Z, ==X.Y.*`
    fn matches_compatible(&self, version: &Version) -> bool {
        if version < &self.version {
            return false;
        }
        let prefix_len = self.version.release.len().saturating_sub(1);
        if prefix_len == 0 {
            // `~=N` has no compatible-release meaning; treat as >=N
            return true;
        }
        version.release_starts_with(&self.version.release[..prefix_len])
    }
}

impl SpecifierSet {
    /// The unconstrained set
    pub fn any() -> Self {
        Self {
            specifiers: Vec::new(),
            raw: String::new(),
        }
    }

    /// Parse a comma-joined specifier list such as `>=1.0,<2`
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let raw: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if raw.is_empty() {
            return Ok(Self::any());
        }

        let mut specifiers = Vec::new();
        for part in raw.split(',') {
            if part.is_empty() {
                return Err(VersionError::InvalidFormat {
                    input: input.to_string(),
                });
            }
            specifiers.push(Specifier::parse(part)?);
        }

        Ok(Self { specifiers, raw })
    }

    /// Check if a version satisfies every comparator in the set
    pub fn matches(&self, version: &Version) -> bool {
        self.specifiers.iter().all(|spec| spec.matches(version))
    }

    /// True when the set places no constraint at all
    pub fn is_any(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// True for a single `==N` pin (the wheel-cache fast path)
    pub fn pinned_version(&self) -> Option<&Version> {
        match self.specifiers.as_slice() {
            [spec] if spec.op == Op::Eq && !spec.star => Some(&spec.version),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }
}

impl FromStr for SpecifierSet {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    #[test]
    fn test_exact_pin() {
        let set = SpecifierSet::parse("==1.0").unwrap();
        assert!(set.matches(&version("1.0")));
        assert!(set.matches(&version("1.0.0")));
        assert!(!set.matches(&version("1.0.1")));
        assert_eq!(set.pinned_version(), Some(&version("1.0")));
    }

    #[test]
    fn test_range_operators() {
        let set = SpecifierSet::parse("<2").unwrap();
        assert!(set.matches(&version("1.9.9")));
        assert!(!set.matches(&version("2")));
        assert!(!set.matches(&version("3")));

        let set = SpecifierSet::parse(">=0.2.1").unwrap();
        assert!(set.matches(&version("0.2.1")));
        assert!(set.matches(&version("0.3")));
        assert!(!set.matches(&version("0.1.0")));
    }

    #[test]
    fn test_comma_joined_set() {
        let set = SpecifierSet::parse(">=1.0, <2.0").unwrap();
        assert!(set.matches(&version("1.5")));
        assert!(!set.matches(&version("2.0")));
        assert!(!set.matches(&version("0.9")));
        // Whitespace is not part of the canonical text
        assert_eq!(set.to_string(), ">=1.0,<2.0");
    }

    #[test]
    fn test_wildcard() {
        let set = SpecifierSet::parse("==1.4.*").unwrap();
        assert!(set.matches(&version("1.4")));
        assert!(set.matches(&version("1.4.9")));
        assert!(!set.matches(&version("1.5.0")));

        let set = SpecifierSet::parse("!=1.4.*").unwrap();
        assert!(!set.matches(&version("1.4.2")));
        assert!(set.matches(&version("1.5")));
    }

    #[test]
    fn test_compatible_release() {
        let set = SpecifierSet::parse("~=1.2.3").unwrap();
        assert!(set.matches(&version("1.2.3")));
        assert!(set.matches(&version("1.2.9")));
        assert!(!set.matches(&version("1.3.0")));
        assert!(!set.matches(&version("1.2.2")));
    }

    #[test]
    fn test_not_equal() {
        let set = SpecifierSet::parse("!=3").unwrap();
        assert!(!set.matches(&version("3")));
        assert!(!set.matches(&version("3.0")));
        assert!(set.matches(&version("2")));
    }

    #[test]
    fn test_any() {
        let set = SpecifierSet::any();
        assert!(set.is_any());
        assert!(set.matches(&version("0.0.1")));
        assert_eq!(set.to_string(), "");
        assert_eq!(set.pinned_version(), None);
    }

    #[test]
    fn test_display_preserves_text() {
        for text in ["<2", "==1.0", ">=0.2.1", "~=1.2.3", "==1.*"] {
            assert_eq!(SpecifierSet::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_invalid_specifiers() {
        assert!(SpecifierSet::parse("^1.0").is_err());
        assert!(SpecifierSet::parse("==").is_err());
        assert!(SpecifierSet::parse(">=1.0,,<2").is_err());
        // Star only combines with == and !=
        assert!(SpecifierSet::parse(">=1.*").is_err());
    }
}
