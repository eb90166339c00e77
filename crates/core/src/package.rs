//! Package identifiers and versions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A package name: dash-separated alphanumeric segments.
///
/// Each segment must contain at least one non-digit character so that the
/// rendered `name-version` form can be split back unambiguously.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Create from a string, validating format.
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidPackageName(
                "name cannot be empty".to_string(),
            ));
        }
        for segment in name.split('-') {
            if segment.is_empty() {
                return Err(crate::Error::InvalidPackageName(format!(
                    "empty segment in name: {name}"
                )));
            }
            if !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(crate::Error::InvalidPackageName(format!(
                    "invalid character in name: {name}"
                )));
            }
            if segment.chars().all(|c| c.is_ascii_digit()) {
                return Err(crate::Error::InvalidPackageName(format!(
                    "all-digit segment in name: {name}"
                )));
            }
        }
        Ok(Self(name))
    }

    /// Get the name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageName({self})")
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A package version: dot-separated numeric components.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(Vec<u64>);

impl Version {
    /// Parse from a dotted string like "1.2.3".
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidVersion(
                "version cannot be empty".to_string(),
            ));
        }
        let components = s
            .split('.')
            .map(|c| {
                if c.is_empty() || !c.chars().all(|ch| ch.is_ascii_digit()) {
                    return Err(crate::Error::InvalidVersion(format!(
                        "invalid version component '{c}' in {s}"
                    )));
                }
                c.parse::<u64>()
                    .map_err(|e| crate::Error::InvalidVersion(format!("{s}: {e}")))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self(components))
    }

    /// Get the numeric components.
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({self})")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join("."))
    }
}

/// A fully qualified package identifier (name plus version).
///
/// The canonical display form `name-version` is used for storage-path
/// derivation and for addressing packages in request paths.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    name: PackageName,
    version: Version,
}

impl PackageId {
    /// Create from components.
    pub fn new(name: PackageName, version: Version) -> Self {
        Self { name, version }
    }

    /// Parse the canonical `name-version` form.
    ///
    /// The version is the suffix after the last dash; the name rule (no
    /// all-digit segments) guarantees the split is unambiguous.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let (name, version) = s.rsplit_once('-').ok_or_else(|| {
            crate::Error::InvalidPackageId(format!("expected name-version, got: {s}"))
        })?;
        let name = PackageName::new(name)
            .map_err(|e| crate::Error::InvalidPackageId(format!("{s}: {e}")))?;
        let version = Version::parse(version)
            .map_err(|e| crate::Error::InvalidPackageId(format!("{s}: {e}")))?;
        Ok(Self { name, version })
    }

    /// Get the package name.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// Get the version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Canonical tarball filename, e.g. `foo-1.0.tar.gz`.
    pub fn tarball_filename(&self) -> String {
        format!("{self}.tar.gz")
    }

    /// Canonical descriptor filename, e.g. `foo.pkg`.
    pub fn descriptor_filename(&self) -> String {
        format!("{}.pkg", self.name)
    }

    /// Canonical descriptor path inside a tarball, e.g. `foo-1.0/foo.pkg`.
    pub fn descriptor_entry_path(&self) -> String {
        format!("{self}/{}.pkg", self.name)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}
