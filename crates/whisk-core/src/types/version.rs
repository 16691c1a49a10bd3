//! Version handling (PEP 440 subset) with rkyv support.
//!
//! Covers the forms real distributions use: `N!`, dotted releases of any
//! length, pre-releases (`a`/`b`/`rc` and their long spellings), `.postN`,
//! `.devN` and `+local` labels. Release segments compare zero-padded, so
//! `1.0` and `1.0.0` are the same version.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parsed distribution version
#[derive(Debug, Clone, Archive, Deserialize, Serialize, SerdeDeserialize, SerdeSerialize)]
#[archive(check_bytes)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<Prerelease>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<String>,
}

/// Pre-release segment (`a1`, `b2`, `rc3`)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Archive, Deserialize, Serialize, SerdeDeserialize,
    SerdeSerialize,
)]
#[archive(check_bytes)]
pub struct Prerelease {
    pub kind: PreKind,
    pub number: u64,
}

/// Pre-release phase, in precedence order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Archive,
    Deserialize,
    Serialize,
    SerdeDeserialize,
    SerdeSerialize,
)]
#[archive(check_bytes)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

/// Version parsing errors
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },
}

impl Version {
    /// Create a release-only version
    pub fn new(release: &[u64]) -> Self {
        Self {
            epoch: 0,
            release: release.to_vec(),
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Check if this is a pre-release or dev version
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Compare release segments only, zero-padded to equal length
    pub fn cmp_release(&self, other: &[u64]) -> Ordering {
        cmp_release(&self.release, other)
    }

    /// Check whether the release starts with `prefix`, zero-padded
    /// (`==1.2.*` style matching)
    pub fn release_starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, seg)| self.release.get(i).copied().unwrap_or(0) == *seg)
    }

    /// Precedence rank of the pre/dev phase: dev < pre < final
    fn phase(&self) -> (u8, u8, u64) {
        match (&self.pre, self.dev) {
            (None, Some(_)) => (0, 0, 0),
            (Some(p), _) => (1, p.kind as u8, p.number),
            (None, None) => (2, 0, 0),
        }
    }

    /// Post rank: a plain release sorts before any `.postN`
    fn post_rank(&self) -> (u8, u64) {
        self.post.map_or((0, 0), |n| (1, n))
    }

    /// Dev rank within an otherwise-equal version: `.devN` sorts first
    fn dev_rank(&self) -> (u8, u64) {
        self.dev.map_or((1, 0), |n| (0, n))
    }
}

fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

// Local labels are carried for display but ignored for precedence,
// so Eq/Ord are hand-written rather than derived.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| cmp_release(&self.release, &other.release))
            .then_with(|| self.phase().cmp(&other.phase()))
            .then_with(|| self.post_rank().cmp(&other.post_rank()))
            .then_with(|| self.dev_rank().cmp(&other.dev_rank()))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let input = lowered.strip_prefix('v').unwrap_or(&lowered);

        // Split off the local label
        let (version_part, local) = match input.split_once('+') {
            Some((v, l)) if !l.is_empty() => (v, Some(l.to_string())),
            Some((v, _)) => (v, None),
            None => (input, None),
        };

        // Epoch
        let (epoch, rest) = match version_part.split_once('!') {
            Some((e, r)) => {
                let epoch = e.parse().map_err(|_| VersionError::InvalidNumber {
                    component: e.to_string(),
                })?;
                (epoch, r)
            },
            None => (0, version_part),
        };

        // Release: leading digits and dots
        let release_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let release_str = rest[..release_end].trim_end_matches('.');
        let suffix = &rest[release_end..];

        if release_str.is_empty() {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }

        let mut release = Vec::new();
        for segment in release_str.split('.') {
            let value = segment.parse().map_err(|_| VersionError::InvalidNumber {
                component: segment.to_string(),
            })?;
            release.push(value);
        }

        let (pre, suffix) = take_pre(suffix);
        let (post, suffix) = take_post(suffix);
        let (dev, suffix) = take_dev(suffix);

        if !strip_separators(suffix).is_empty() {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

fn strip_separators(s: &str) -> &str {
    s.trim_start_matches(['.', '-', '_'])
}

/// Consume an optional number, returning 0 when the marker is bare
fn take_number(s: &str) -> (u64, &str) {
    let s = strip_separators(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        (0, s)
    } else {
        (s[..end].parse().unwrap_or(u64::MAX), &s[end..])
    }
}

fn take_pre(s: &str) -> (Option<Prerelease>, &str) {
    // Longer spellings first so "alpha" is not read as "a"
    const MARKERS: &[(&str, PreKind)] = &[
        ("alpha", PreKind::Alpha),
        ("beta", PreKind::Beta),
        ("preview", PreKind::Rc),
        ("pre", PreKind::Rc),
        ("rc", PreKind::Rc),
        ("a", PreKind::Alpha),
        ("b", PreKind::Beta),
        ("c", PreKind::Rc),
    ];
    let stripped = strip_separators(s);
    for (marker, kind) in MARKERS {
        if let Some(rest) = stripped.strip_prefix(marker) {
            let (number, rest) = take_number(rest);
            return (Some(Prerelease { kind: *kind, number }), rest);
        }
    }
    (None, s)
}

fn take_post(s: &str) -> (Option<u64>, &str) {
    let stripped = strip_separators(s);
    for marker in ["post", "rev", "r"] {
        if let Some(rest) = stripped.strip_prefix(marker) {
            let (number, rest) = take_number(rest);
            return (Some(number), rest);
        }
    }
    // Bare "-N" counts as a post release
    if s.starts_with('-') && stripped.starts_with(|c: char| c.is_ascii_digit()) {
        let (number, rest) = take_number(stripped);
        return (Some(number), rest);
    }
    (None, s)
}

fn take_dev(s: &str) -> (Option<u64>, &str) {
    let stripped = strip_separators(s);
    if let Some(rest) = stripped.strip_prefix("dev") {
        let (number, rest) = take_number(rest);
        return (Some(number), rest);
    }
    (None, s)
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }

        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;

        if let Some(pre) = &self.pre {
            let kind = match pre.kind {
                PreKind::Alpha => "a",
                PreKind::Beta => "b",
                PreKind::Rc => "rc",
            };
            write!(f, "{}{}", kind, pre.number)?;
        }

        if let Some(post) = self.post {
            write!(f, ".post{}", post)?;
        }

        if let Some(dev) = self.dev {
            write!(f, ".dev{}", dev)?;
        }

        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }

        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn version_round_trip(
            release in prop::collection::vec(0u64..1000, 1..5),
            pre_number in prop::option::of(0u64..100),
            post in prop::option::of(0u64..100),
            dev in prop::option::of(0u64..100),
        ) {
            let original = Version {
                epoch: 0,
                release: release.clone(),
                pre: pre_number.map(|number| Prerelease { kind: PreKind::Beta, number }),
                post,
                dev,
                local: None,
            };

            let serialized = original.to_string();
            let parsed = Version::from_str(&serialized).unwrap();

            prop_assert_eq!(parsed.release, original.release);
            prop_assert_eq!(parsed.pre, original.pre);
            prop_assert_eq!(parsed.post, original.post);
            prop_assert_eq!(parsed.dev, original.dev);
        }
    }

    proptest! {
        #[test]
        fn version_comparison_transitivity(
            a in prop::collection::vec(0u64..20, 1..4),
            b in prop::collection::vec(0u64..20, 1..4),
            c in prop::collection::vec(0u64..20, 1..4),
        ) {
            let a = Version::new(&a);
            let b = Version::new(&b);
            let c = Version::new(&c);

            if a < b && b < c {
                prop_assert!(a < c, "Transitivity violated: {} < {} < {} but {} >= {}", a, b, c, a, c);
            }

            if a > b && b > c {
                prop_assert!(a > c, "Transitivity violated: {} > {} > {} but {} <= {}", a, b, c, a, c);
            }
        }
    }
}
