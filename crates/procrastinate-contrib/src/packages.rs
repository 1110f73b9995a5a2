//! In-memory package metadata
//!
//! [`PackageIndex`] answers [`PackageMetadata`] queries from a fixed list of
//! packages, typically parsed from the host build's `Cargo.lock`. Names are
//! compared the way Cargo compares crate names: `-` and `_` are equivalent.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use procrastinate_core::{
    HostConfigurationError, PackageMetadata, PackageNotFoundError, PackageSpec,
};

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    /// `None` for locatable modules without distribution metadata.
    version: Option<String>,
    origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
    source: Option<String>,
}

fn normalize(name: &str) -> String {
    name.trim().replace('-', "_").to_lowercase()
}

/// Numeric components of a version, for ordering (`"1.0.120"` -> `[1, 0, 120]`).
/// Non-numeric components count as `0`.
fn version_key(version: &str) -> Vec<u64> {
    version
        .split(['.', '-', '+'])
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

/// Package metadata from an explicit package list.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: BTreeMap<String, PackageEntry>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an installed distribution.
    pub fn with_package(mut self, name: &str, version: &str) -> Self {
        self.insert(name, Some(version.to_string()), None);
        self
    }

    /// Add a locatable module that has no distribution metadata.
    pub fn with_module(mut self, name: &str) -> Self {
        self.insert(name, None, None);
        self
    }

    fn insert(&mut self, name: &str, version: Option<String>, origin: Option<String>) {
        self.packages.insert(
            normalize(name),
            PackageEntry {
                name: name.to_string(),
                version,
                origin,
            },
        );
    }

    /// Parse the `[[package]]` entries of a `Cargo.lock` document.
    ///
    /// When a crate is locked at several versions the highest one is kept,
    /// whatever the order of the entries.
    pub fn from_cargo_lock(contents: &str) -> Result<Self, HostConfigurationError> {
        let lockfile: Lockfile = toml::from_str(contents)
            .map_err(|e| HostConfigurationError::InvalidMetadata(e.to_string()))?;

        let mut index = PackageIndex::new();
        for package in lockfile.package {
            let newer = match index.packages.get(&normalize(&package.name)) {
                Some(PackageEntry {
                    version: Some(locked),
                    ..
                }) => version_key(&package.version) > version_key(locked),
                _ => true,
            };
            if newer {
                index.insert(&package.name, Some(package.version), package.source);
            }
        }
        tracing::debug!(packages = index.len(), "Loaded package index from lockfile");
        Ok(index)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostConfigurationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            HostConfigurationError::InvalidMetadata(format!("{}: {}", path.display(), e))
        })?;
        Self::from_cargo_lock(&contents)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageMetadata for PackageIndex {
    fn find_spec(&self, name: &str) -> Option<PackageSpec> {
        self.packages.get(&normalize(name)).map(|entry| PackageSpec {
            name: entry.name.clone(),
            origin: entry.origin.clone(),
        })
    }

    fn version(&self, name: &str) -> Result<String, PackageNotFoundError> {
        self.packages
            .get(&normalize(name))
            .and_then(|entry| entry.version.clone())
            .ok_or_else(|| PackageNotFoundError::new(name))
    }
}
