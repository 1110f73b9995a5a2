//! Hooks and traits for host framework integration
//!
//! This module provides the trait interfaces the integration layer reads the
//! host framework through, without depending on any particular framework.
//! The host (or a test) implements these traits; every method is a plain read
//! against an already-synchronized source, so implementations must be
//! `Send + Sync`.

use serde_json::Value;

use crate::error::{HostConfigurationError, PackageNotFoundError};
use crate::models::ConnectorParams;

/// Read access to the host's settings store.
pub trait SettingsStore: Send + Sync {
    /// Look up a fully-qualified setting key.
    ///
    /// Returns `Ok(None)` when the key is not set. An `Err` means the store
    /// itself is misconfigured and is propagated unchanged by callers.
    fn lookup(&self, key: &str) -> Result<Option<Value>, HostConfigurationError>;
}

/// The host's registry of configured database connections.
pub trait ConnectionRegistry: Send + Sync {
    /// Raw driver parameters for the connection named `alias`.
    ///
    /// Must fail when the alias is unknown. The returned mapping is owned by
    /// the caller and may be modified freely.
    fn get_connection_params(&self, alias: &str)
        -> Result<ConnectorParams, HostConfigurationError>;
}

/// Locatable package (module) found by [`PackageMetadata::find_spec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    /// Where the package was found (lockfile, registry, ...), if known.
    pub origin: Option<String>,
}

/// The host environment's installed-package metadata.
pub trait PackageMetadata: Send + Sync {
    /// Locate a package by name. Absence is a normal `None`.
    fn find_spec(&self, name: &str) -> Option<PackageSpec>;

    /// Version string of an installed distribution.
    fn version(&self, name: &str) -> Result<String, PackageNotFoundError>;
}

impl<T: SettingsStore + ?Sized> SettingsStore for std::sync::Arc<T> {
    fn lookup(&self, key: &str) -> Result<Option<Value>, HostConfigurationError> {
        (**self).lookup(key)
    }
}

impl<T: ConnectionRegistry + ?Sized> ConnectionRegistry for std::sync::Arc<T> {
    fn get_connection_params(
        &self,
        alias: &str,
    ) -> Result<ConnectorParams, HostConfigurationError> {
        (**self).get_connection_params(alias)
    }
}

impl<T: PackageMetadata + ?Sized> PackageMetadata for std::sync::Arc<T> {
    fn find_spec(&self, name: &str) -> Option<PackageSpec> {
        (**self).find_spec(name)
    }

    fn version(&self, name: &str) -> Result<String, PackageNotFoundError> {
        (**self).version(name)
    }
}
