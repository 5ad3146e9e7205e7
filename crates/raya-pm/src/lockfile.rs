//! Lockfile management (raya.lock)
//!
//! Provides structures and parsing for Raya lockfiles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during lockfile operations
#[derive(Debug, Error)]
pub enum LockfileError {
    /// Failed to read lockfile
    #[error("Failed to read lockfile: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse lockfile: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize lockfile
    #[error("Failed to serialize lockfile: {0}")]
    SerializeError(String),

    /// Validation error
    #[error("Invalid lockfile: {0}")]
    ValidationError(String),

    /// Checksum mismatch
    #[error("Checksum mismatch for package {package}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        package: String,
        expected: String,
        actual: String,
    },
}

/// Lockfile format version
pub const LOCKFILE_VERSION: u32 = 1;

/// Lockfile (raya.lock)
///
/// Records exact versions and checksums of all dependencies for reproducible builds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lockfile {
    /// Lockfile format version
    pub version: u32,

    /// Root package name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Locked packages
    #[serde(default)]
    pub packages: Vec<LockedPackage>,
}

/// A locked package with exact version and checksum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedPackage {
    /// Package name
    pub name: String,

    /// Exact version
    pub version: String,

    /// SHA-256 checksum (hex-encoded)
    pub checksum: String,

    /// Package source
    pub source: Source,

    /// Direct dependencies of this package
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

/// Package source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    /// Registry package
    Registry {
        /// Registry URL (optional, defaults to official registry)
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },

    /// Git repository
    Git {
        /// Git repository URL
        url: String,

        /// Git revision (commit hash)
        rev: String,
    },

    /// Local path
    Path {
        /// Relative or absolute path
        path: String,
    },

    /// URL import (direct HTTP/HTTPS)
    Url {
        /// Original URL
        url: String,
    },
}

impl Lockfile {
    /// Create a new empty lockfile
    pub fn new(root: Option<String>) -> Self {
        Self {
            version: LOCKFILE_VERSION,
            root,
            packages: Vec::new(),
        }
    }

    /// Parse a lockfile from a file
    pub fn from_file(path: &Path) -> Result<Self, LockfileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a lockfile from a string
    pub fn from_str(content: &str) -> Result<Self, LockfileError> {
        let lockfile: Lockfile = toml::from_str(content)?;
        lockfile.validate()?;
        Ok(lockfile)
    }

    /// Validate the lockfile
    pub fn validate(&self) -> Result<(), LockfileError> {
        // Check version
        if self.version != LOCKFILE_VERSION {
            return Err(LockfileError::ValidationError(format!(
                "Unsupported lockfile version: {} (expected {})",
                self.version, LOCKFILE_VERSION
            )));
        }

        // Validate each package
        for pkg in &self.packages {
            if pkg.name.is_empty() {
                return Err(LockfileError::ValidationError(
                    "Package name cannot be empty".to_string(),
                ));
            }

            if pkg.version.is_empty() {
                return Err(LockfileError::ValidationError(format!(
                    "Package '{}' has empty version",
                    pkg.name
                )));
            }

            if pkg.checksum.is_empty() {
                return Err(LockfileError::ValidationError(format!(
                    "Package '{}' has empty checksum",
                    pkg.name
                )));
            }

            // Validate checksum is valid hex
            if pkg.checksum.len() != 64 || !pkg.checksum.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(LockfileError::ValidationError(format!(
                    "Package '{}' has invalid checksum (must be 64 hex characters)",
                    pkg.name
                )));
            }
        }

        Ok(())
    }

    /// Write lockfile to a file
    pub fn to_file(&self, path: &Path) -> Result<(), LockfileError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LockfileError::SerializeError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Add a locked package
    pub fn add_package(&mut self, package: LockedPackage) {
        // Remove existing package with same name if present
        self.packages.retain(|p| p.name != package.name);
        self.packages.push(package);
    }

    /// Get a locked package by name
    pub fn get_package(&self, name: &str) -> Option<&LockedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Get all package names
    pub fn package_names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    /// Build a dependency map (package name -> dependencies)
    pub fn dependency_map(&self) -> HashMap<String, Vec<String>> {
        self.packages
            .iter()
            .map(|p| (p.name.clone(), p.dependencies.clone()))
            .collect()
    }

    /// Sort packages by name (for deterministic output)
    pub fn sort_packages(&mut self) {
        self.packages.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Verify checksums for all packages
    pub fn verify_checksums(&self, verify_fn: impl Fn(&str, &str) -> Result<String, String>) -> Result<(), LockfileError> {
        for pkg in &self.packages {
            match verify_fn(&pkg.name, &pkg.version) {
                Ok(actual_checksum) => {
                    if actual_checksum != pkg.checksum {
                        return Err(LockfileError::ChecksumMismatch {
                            package: pkg.name.clone(),
                            expected: pkg.checksum.clone(),
                            actual: actual_checksum,
                        });
                    }
                }
                Err(e) => {
                    return Err(LockfileError::ValidationError(format!(
                        "Failed to verify checksum for {}: {}",
                        pkg.name, e
                    )));
                }
            }
        }
        Ok(())
    }
}

impl LockedPackage {
    /// Create a new locked package
    pub fn new(name: String, version: String, checksum: String, source: Source) -> Self {
        Self {
            name,
            version,
            checksum,
            source,
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency
    pub fn add_dependency(&mut self, dep: String) {
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
    }

    /// Check if this is a registry package
    pub fn is_registry(&self) -> bool {
        matches!(self.source, Source::Registry { .. })
    }

    /// Check if this is a git package
    pub fn is_git(&self) -> bool {
        matches!(self.source, Source::Git { .. })
    }

    /// Check if this is a path package
    pub fn is_path(&self) -> bool {
        matches!(self.source, Source::Path { .. })
    }

    /// Check if this is a URL package
    pub fn is_url(&self) -> bool {
        matches!(self.source, Source::Url { .. })
    }
}

impl Source {
    /// Create a registry source
    pub fn registry(url: Option<String>) -> Self {
        Source::Registry { url }
    }

    /// Create a git source
    pub fn git(url: String, rev: String) -> Self {
        Source::Git { url, rev }
    }

    /// Create a path source
    pub fn path(path: impl Into<String>) -> Self {
        Source::Path { path: path.into() }
    }

    /// Create a URL source
    pub fn url(url: impl Into<String>) -> Self {
        Source::Url { url: url.into() }
    }
}
