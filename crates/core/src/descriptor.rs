//! Package descriptor format and parser.
//!
//! A descriptor is a line-oriented `key: value` text file carrying the
//! metadata for one package revision. `name` and `version` are required;
//! unknown or duplicated keys are surfaced as warnings rather than errors so
//! that mirrored descriptors from newer upstreams still ingest.

use crate::package::{PackageId, PackageName, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A fatal descriptor parse error, annotated with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct DescriptorError {
    pub line: usize,
    pub message: String,
}

impl DescriptorError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A non-fatal parse notice, annotated with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorWarning {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for DescriptorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A parsed package descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: PackageName,
    pub version: Version,
    pub synopsis: Option<String>,
    pub license: Option<String>,
    pub maintainer: Option<String>,
    pub description: Option<String>,
}

impl Descriptor {
    /// The package identifier this descriptor declares.
    pub fn package_id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.version.clone())
    }

    /// Parse descriptor text from raw bytes.
    ///
    /// Returns the parsed descriptor together with any warnings, or the first
    /// fatal error. The caller keeps the raw bytes; this function never
    /// reserializes.
    pub fn parse(raw: &[u8]) -> Result<(Self, Vec<DescriptorWarning>), DescriptorError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| DescriptorError::new(1, format!("descriptor is not UTF-8: {e}")))?;

        let mut name: Option<PackageName> = None;
        let mut version: Option<Version> = None;
        let mut synopsis: Option<String> = None;
        let mut license: Option<String> = None;
        let mut maintainer: Option<String> = None;
        let mut description: Option<String> = None;
        let mut warnings = Vec::new();
        let mut last_line = 0;

        for (idx, raw_line) in text.lines().enumerate() {
            let lineno = idx + 1;
            last_line = lineno;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| {
                DescriptorError::new(lineno, format!("expected 'key: value', got: {raw_line}"))
            })?;
            let key = key.trim();
            let value = value.trim();

            let mut duplicate = |field: &str| {
                warnings.push(DescriptorWarning {
                    line: lineno,
                    message: format!("duplicate field '{field}' ignored"),
                });
            };

            match key {
                "name" => {
                    if name.is_some() {
                        duplicate("name");
                    } else {
                        name = Some(PackageName::new(value).map_err(|e| {
                            DescriptorError::new(lineno, format!("invalid name: {e}"))
                        })?);
                    }
                }
                "version" => {
                    if version.is_some() {
                        duplicate("version");
                    } else {
                        version = Some(Version::parse(value).map_err(|e| {
                            DescriptorError::new(lineno, format!("invalid version: {e}"))
                        })?);
                    }
                }
                "synopsis" => {
                    if synopsis.is_some() {
                        duplicate("synopsis");
                    } else {
                        synopsis = Some(value.to_string());
                    }
                }
                "license" => {
                    if license.is_some() {
                        duplicate("license");
                    } else {
                        license = Some(value.to_string());
                    }
                }
                "maintainer" => {
                    if maintainer.is_some() {
                        duplicate("maintainer");
                    } else {
                        maintainer = Some(value.to_string());
                    }
                }
                "description" => {
                    if description.is_some() {
                        duplicate("description");
                    } else {
                        description = Some(value.to_string());
                    }
                }
                other => warnings.push(DescriptorWarning {
                    line: lineno,
                    message: format!("unknown field '{other}'"),
                }),
            }
        }

        let name = name
            .ok_or_else(|| DescriptorError::new(last_line.max(1), "missing field: name"))?;
        let version = version
            .ok_or_else(|| DescriptorError::new(last_line.max(1), "missing field: version"))?;

        Ok((
            Self {
                name,
                version,
                synopsis,
                license,
                maintainer,
                description,
            },
            warnings,
        ))
    }
}
