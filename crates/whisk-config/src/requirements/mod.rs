//! Requirements-file parsing.
//!
//! Line-oriented input, parsed top to bottom: a requirement specifier,
//! a `-r <path>` include (expanded inline at the point of reference), a
//! `-e <path>` editable source, a direct wheel URL, or a comment. Every
//! root parsed from a file carries a `-r <file> (line <n>)` provenance
//! link so diagnostics can say where a requirement came from.
//!
//! Malformed input is fatal: parsing stops at the first bad line with an
//! error naming the file and line number.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;
use whisk_core::error::WhiskError;
use whisk_core::types::{ProvenanceLink, Requirement, RequirementSource, WheelFilename};

use crate::ConfigResult;

/// Parser for requirements files and command-line requirement arguments
#[derive(Debug, Default)]
pub struct RequirementsParser {
    /// Canonicalized paths already being expanded (include-cycle guard)
    visited: HashSet<PathBuf>,
}

impl RequirementsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a requirements file, expanding nested `-r` includes inline
    pub fn parse_file(&mut self, path: &Path) -> ConfigResult<Vec<Requirement>> {
        let canonical = fs::canonicalize(path)
            .map_err(|e| WhiskError::io(format!("Failed to open {}", path.display()), e))?;
        if !self.visited.insert(canonical) {
            // A file including itself is not an error, just a no-op:
            // everything in it is already queued
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| WhiskError::io(format!("Failed to read {}", path.display()), e))?;

        self.parse_str(&content, &path.to_string_lossy(), path.parent())
    }

    /// Parse requirements text. `file_label` appears in provenance links
    /// and errors; `base_dir` anchors relative include paths.
    pub fn parse_str(
        &mut self,
        content: &str,
        file_label: &str,
        base_dir: Option<&Path>,
    ) -> ConfigResult<Vec<Requirement>> {
        let mut requirements = Vec::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            let parse_error = |message: String| WhiskError::RequirementParse {
                file: file_label.to_string(),
                line: line_no,
                message,
            };

            if let Some(include) = option_value(line, "-r", "--requirement") {
                let include_path = match base_dir {
                    Some(base) => base.join(include),
                    None => PathBuf::from(include),
                };
                requirements.extend(self.parse_file(&include_path)?);
            } else if let Some(target) = option_value(line, "-e", "--editable") {
                let chain = vec![ProvenanceLink::file(file_label, line_no)];
                requirements.push(editable_requirement(target).map_err(parse_error)?.with_chain(chain));
            } else if line.starts_with('-') {
                return Err(parse_error(format!("unsupported option '{}'", line)));
            } else if is_url(line) {
                let chain = vec![ProvenanceLink::file(file_label, line_no)];
                requirements.push(url_requirement(line).map_err(parse_error)?.with_chain(chain));
            } else {
                let chain = vec![ProvenanceLink::file(file_label, line_no)];
                requirements.push(Requirement::parse(line).map_err(parse_error)?.with_chain(chain));
            }
        }

        Ok(requirements)
    }

    /// Parse a requirement given directly on the command line; such
    /// roots carry no provenance chain at all.
    pub fn parse_argument(&mut self, argument: &str) -> ConfigResult<Requirement> {
        let parse_error = |message: String| WhiskError::RequirementParse {
            file: "<argument>".to_string(),
            line: 0,
            message,
        };

        if is_url(argument) {
            url_requirement(argument).map_err(parse_error)
        } else if let Some(target) = option_value(argument, "-e", "--editable") {
            editable_requirement(target).map_err(parse_error)
        } else {
            Requirement::parse(argument).map_err(parse_error)
        }
    }
}

/// Strip a trailing ` #...` comment (a bare `#` starts a comment line)
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #") {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Extract the value of a short/long option, `-r file` or `--requirement=file`
fn option_value<'a>(line: &'a str, short: &str, long: &str) -> Option<&'a str> {
    for prefix in [long, short] {
        if let Some(rest) = line.strip_prefix(prefix) {
            let value = match rest.strip_prefix('=') {
                Some(assigned) => assigned.trim(),
                None if rest.starts_with(char::is_whitespace) => rest.trim(),
                None => continue,
            };
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn is_url(line: &str) -> bool {
    line.starts_with("http://") || line.starts_with("https://") || line.starts_with("file://")
}

/// A direct wheel URL resolves to the exact name and version embedded
/// in the wheel's filename; it is never expanded through an index.
fn url_requirement(line: &str) -> Result<Requirement, String> {
    let url = Url::parse(line).map_err(|e| format!("invalid URL: {}", e))?;
    let filename = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| format!("URL '{}' has no filename", line))?;

    let wheel = WheelFilename::from_str(filename)?;
    let text = format!("{}=={}", wheel.canonical_name(), wheel.version);
    Ok(Requirement::parse(&text)?.with_source(RequirementSource::DirectUrl(line.to_string())))
}

/// An editable source is named after its final path component until its
/// build metadata says otherwise (the distribution inspector reads the
/// authoritative name later).
fn editable_requirement(target: &str) -> Result<Requirement, String> {
    let guessed_name = Path::new(target)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("editable target '{}' has no name", target))?;

    Ok(Requirement::parse(guessed_name)?
        .with_source(RequirementSource::Editable(target.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use whisk_core::types::PackageName;

    fn parse(content: &str) -> Vec<Requirement> {
        RequirementsParser::new()
            .parse_str(content, "requirements.txt", None)
            .unwrap()
    }

    #[test]
    fn test_specifiers_and_comments() {
        let reqs = parse(
            "\n\
             # build tooling\n\
             dependant_package\n\
             conflicting_package  # known trouble\n\
             pure_python_package==0.1.0\n",
        );
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].name, "dependant_package");
        assert_eq!(reqs[1].name, "conflicting_package");
        assert_eq!(reqs[2].display_bare(), "pure_python_package==0.1.0");
    }

    #[test]
    fn test_file_provenance_lines() {
        let reqs = parse("\ndependant_package\nconflicting_package\n");
        // Blank first line: the packages sit on lines 2 and 3
        assert_eq!(
            reqs[0].provenance().unwrap(),
            "-r requirements.txt (line 2)"
        );
        assert_eq!(
            reqs[1].provenance().unwrap(),
            "-r requirements.txt (line 3)"
        );
        assert!(reqs.iter().all(|r| r.is_root()));
    }

    #[test]
    fn test_nested_include() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("base.txt");
        let mut file = fs::File::create(&nested).unwrap();
        writeln!(file, "shared_package==1.0").unwrap();

        let top = dir.path().join("requirements.txt");
        let mut file = fs::File::create(&top).unwrap();
        writeln!(file, "-r base.txt").unwrap();
        writeln!(file, "app_package").unwrap();

        let reqs = RequirementsParser::new().parse_file(&top).unwrap();
        assert_eq!(reqs.len(), 2);
        // Includes are expanded inline at the point of reference
        assert_eq!(reqs[0].name, "shared_package");
        assert!(reqs[0].provenance().unwrap().contains("base.txt"));
        assert_eq!(reqs[1].name, "app_package");
    }

    #[test]
    fn test_self_include_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "-r requirements.txt").unwrap();
        writeln!(file, "plain_package").unwrap();

        let reqs = RequirementsParser::new().parse_file(&path).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "plain_package");
    }

    #[test]
    fn test_editable_line() {
        let reqs = parse("-e tmp/conflicting_package\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].canonical, PackageName::new("conflicting_package"));
        assert_eq!(
            reqs[0].source,
            RequirementSource::Editable("tmp/conflicting_package".to_string())
        );
    }

    #[test]
    fn test_direct_wheel_url() {
        let reqs = parse("https://pypi.test/packages/wheeled_package-0.2.0-py2.py3-none-any.whl\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].display_bare(), "wheeled-package==0.2.0");
        assert!(matches!(reqs[0].source, RequirementSource::DirectUrl(_)));
    }

    #[test]
    fn test_malformed_line_names_position() {
        let err = RequirementsParser::new()
            .parse_str("good_package\npkg===???\n", "requirements.txt", None)
            .unwrap_err();
        match err {
            WhiskError::RequirementParse { file, line, .. } => {
                assert_eq!(file, "requirements.txt");
                assert_eq!(line, 2);
            },
            other => panic!("expected RequirementParse, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_option_is_an_error() {
        let err = RequirementsParser::new()
            .parse_str("--hash=sha256:abc\n", "requirements.txt", None)
            .unwrap_err();
        assert!(matches!(err, WhiskError::RequirementParse { line: 1, .. }));
    }

    #[test]
    fn test_argument_has_no_chain() {
        let req = RequirementsParser::new()
            .parse_argument("circular-dep-a")
            .unwrap();
        assert!(req.chain.is_empty());
        assert_eq!(req.to_string(), "circular-dep-a");
    }
}
