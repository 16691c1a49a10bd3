//! Requirement specifications with provenance chains.
//!
//! A Requirement records what was asked for (`name[extras]specifiers`),
//! where the distribution comes from, and *why* it was requested: the
//! provenance chain lists the parent requirements leading back to a root
//! (`many-versions-package<2 (from conflicting_package->-r requirements.txt (line 3))`).

use std::fmt;

use super::name::PackageName;
use super::specifier::SpecifierSet;

/// Where a requirement's distribution comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSource {
    /// Resolved through the package indexes
    Index,
    /// A direct wheel URL; never expanded through an index lookup
    DirectUrl(String),
    /// An editable local path or VCS source (`-e ...`)
    Editable(String),
}

/// One step of a provenance chain. Links created from a parent
/// requirement carry its canonical name; root markers such as
/// `-r requirements.txt (line 3)` do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceLink {
    pub label: String,
    pub package: Option<PackageName>,
}

impl ProvenanceLink {
    /// Root marker for a requirement read from a file
    pub fn file(path: &str, line: usize) -> Self {
        Self {
            label: format!("-r {} (line {})", path, line),
            package: None,
        }
    }
}

/// A requested package with constraint and provenance. Immutable once
/// built; the graph only ever collects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Project name as written
    pub name: String,
    /// Canonical name used for keying and comparisons
    pub canonical: PackageName,
    pub extras: Vec<String>,
    pub specifiers: SpecifierSet,
    pub source: RequirementSource,
    pub chain: Vec<ProvenanceLink>,
}

impl Requirement {
    /// Create an index-sourced requirement with an empty chain
    pub fn new(name: &str, specifiers: SpecifierSet) -> Self {
        Self {
            name: name.to_string(),
            canonical: PackageName::new(name),
            extras: Vec::new(),
            specifiers,
            source: RequirementSource::Index,
            chain: Vec::new(),
        }
    }

    /// Parse a bare requirement such as `pkg`, `pkg==1.0` or
    /// `pkg[extra1,extra2]>=1.0,<2`. Environment markers after `;` are
    /// accepted and ignored.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.split(';').next().unwrap_or("").trim();
        if text.is_empty() {
            return Err("empty requirement".to_string());
        }

        let name_end = text
            .find(|c: char| "[<>=!~ \t".contains(c))
            .unwrap_or(text.len());
        let name = &text[..name_end];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c))
        {
            return Err(format!("invalid project name in '{}'", text));
        }

        let mut rest = text[name_end..].trim_start();
        let mut extras = Vec::new();
        if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or_else(|| format!("unclosed extras in '{}'", text))?;
            extras = stripped[..close]
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            rest = stripped[close + 1..].trim_start();
        }

        let specifiers = SpecifierSet::parse(rest).map_err(|e| e.to_string())?;

        Ok(Self {
            name: name.to_string(),
            canonical: PackageName::new(name),
            extras,
            specifiers,
            source: RequirementSource::Index,
            chain: Vec::new(),
        })
    }

    /// Attach a distribution source
    pub fn with_source(mut self, source: RequirementSource) -> Self {
        self.source = source;
        self
    }

    /// Attach a provenance chain
    pub fn with_chain(mut self, chain: Vec<ProvenanceLink>) -> Self {
        self.chain = chain;
        self
    }

    /// Build the chain for a dependency discovered under this
    /// requirement: the parent comes first, then the parent's own chain.
    pub fn child_chain(&self) -> Vec<ProvenanceLink> {
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.push(ProvenanceLink {
            label: self.display_bare(),
            package: Some(self.canonical.clone()),
        });
        chain.extend(self.chain.iter().cloned());
        chain
    }

    /// A root requirement was given directly by the user (possibly via
    /// a requirements file); its chain contains no package links.
    pub fn is_root(&self) -> bool {
        self.chain.iter().all(|link| link.package.is_none())
    }

    /// Whether `canonical` appears among the chain's package links,
    /// i.e. the requirement refers back to one of its own ancestors.
    pub fn chain_contains_self(&self) -> bool {
        self.chain
            .iter()
            .any(|link| link.package.as_ref() == Some(&self.canonical))
    }

    /// `name[extras]specifiers` without the provenance suffix
    pub fn display_bare(&self) -> String {
        let mut out = self.name.clone();
        if !self.extras.is_empty() {
            out.push('[');
            out.push_str(&self.extras.join(","));
            out.push(']');
        }
        out.push_str(&self.specifiers.to_string());
        out
    }

    /// The `->`-joined chain, or None for chainless requirements
    pub fn provenance(&self) -> Option<String> {
        if self.chain.is_empty() {
            return None;
        }
        let labels: Vec<&str> = self.chain.iter().map(|link| link.label.as_str()).collect();
        Some(labels.join("->"))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_bare())?;
        if let Some(chain) = self.provenance() {
            write!(f, " (from {})", chain)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("dependant_package").unwrap();
        assert_eq!(req.name, "dependant_package");
        assert_eq!(req.canonical.as_str(), "dependant-package");
        assert!(req.specifiers.is_any());
        assert!(req.extras.is_empty());
        assert!(req.is_root());
    }

    #[test]
    fn test_parse_with_specifiers() {
        let req = Requirement::parse("many-versions-package<2").unwrap();
        assert_eq!(req.display_bare(), "many-versions-package<2");

        let req = Requirement::parse("pure_python_package==0.1.0").unwrap();
        assert_eq!(req.display_bare(), "pure_python_package==0.1.0");

        let req = Requirement::parse("pkg >= 1.0, < 2").unwrap();
        assert_eq!(req.display_bare(), "pkg>=1.0,<2");
    }

    #[test]
    fn test_parse_extras_and_markers() {
        let req = Requirement::parse("pkg[security,tests]>=1.0").unwrap();
        assert_eq!(req.extras, vec!["security", "tests"]);
        assert_eq!(req.display_bare(), "pkg[security,tests]>=1.0");

        let req = Requirement::parse("pkg==1.0; python_version < '3.9'").unwrap();
        assert_eq!(req.display_bare(), "pkg==1.0");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("bad name==1").is_err());
        assert!(Requirement::parse("pkg[unclosed==1").is_err());
        assert!(Requirement::parse("pkg^1.0").is_err());
    }

    #[test]
    fn test_provenance_display() {
        let root = Requirement::parse("circular-dep-a").unwrap();
        assert_eq!(root.to_string(), "circular-dep-a");

        let dep = Requirement::parse("circular-dep-b==1.0")
            .unwrap()
            .with_chain(root.child_chain());
        assert_eq!(dep.to_string(), "circular-dep-b==1.0 (from circular-dep-a)");
        assert!(!dep.is_root());

        let back = Requirement::parse("circular-dep-a==1.0")
            .unwrap()
            .with_chain(dep.child_chain());
        assert_eq!(
            back.to_string(),
            "circular-dep-a==1.0 (from circular-dep-b==1.0->circular-dep-a)"
        );
        assert!(back.chain_contains_self());
        assert!(!dep.chain_contains_self());
    }

    #[test]
    fn test_file_root_chain() {
        let req = Requirement::parse("conflicting_package")
            .unwrap()
            .with_chain(vec![ProvenanceLink::file("requirements.txt", 3)]);
        assert!(req.is_root());

        let dep = Requirement::parse("many-versions-package<2")
            .unwrap()
            .with_chain(req.child_chain());
        assert_eq!(
            dep.to_string(),
            "many-versions-package<2 (from conflicting_package->-r requirements.txt (line 3))"
        );
    }
}
