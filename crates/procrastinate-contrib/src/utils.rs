//! Lifecycle-free helpers usable at any time
//!
//! - [`connector_params`]: connector keyword parameters for a host connection alias
//! - [`get_setting`]: namespaced setting lookup with a default
//! - [`package_is_installed`] / [`package_is_version`]: feature detection

use procrastinate_core::models::ConnectorParams;
use procrastinate_core::{
    ConnectionRegistry, HostConfigurationError, PackageMetadata, PackageNotFoundError,
};

pub use procrastinate_core::config::get_setting;

/// Alias used when the caller does not name a connection.
pub const DEFAULT_DATABASE_ALIAS: &str = "default";

/// Driver-level parameters the host adds that the connector constructor does
/// not accept.
// Fixed list: a new driver-only key added by the host would pass through.
pub const EXCLUDED_CONNECTOR_KEYS: [&str; 2] = ["cursor_factory", "context"];

/// Parameters for the connection `alias`, in a form suitable to be passed
/// to the connector constructor.
///
/// The host's raw parameters are fetched on every call (no caching); only the
/// [`EXCLUDED_CONNECTOR_KEYS`] are removed, everything else is returned as-is.
/// An unknown alias fails with the registry's own error.
pub fn connector_params(
    registry: &dyn ConnectionRegistry,
    alias: &str,
) -> Result<ConnectorParams, HostConfigurationError> {
    let mut params = registry.get_connection_params(alias)?;
    for key in EXCLUDED_CONNECTOR_KEYS {
        params.remove(key);
    }
    tracing::debug!(alias = %alias, keys = params.len(), "Adapted connector parameters");
    Ok(params)
}

/// Whether the host environment can locate package `name`. Never fails.
pub fn package_is_installed(metadata: &dyn PackageMetadata, name: &str) -> bool {
    metadata.find_spec(name).is_some()
}

/// Whether the installed version of `name` has major version `major`.
///
/// Only the leading dotted component is compared (`"2.5.1"` is major `2`).
/// An empty version string is `false`. Only the single version reported by
/// `metadata` is checked; [`PackageIndex`](crate::PackageIndex) reports the
/// highest locked version of a crate locked at several. A package without
/// metadata fails with [`PackageNotFoundError`]; use [`package_is_installed`]
/// first for a non-failing check.
pub fn package_is_version(
    metadata: &dyn PackageMetadata,
    name: &str,
    major: u64,
) -> Result<bool, PackageNotFoundError> {
    let version = metadata.version(name)?;
    if version.is_empty() {
        return Ok(false);
    }
    let leading = version.split('.').next().unwrap_or_default();
    Ok(leading == major.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use procrastinate_core::PackageSpec;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    struct StaticRegistry(HashMap<&'static str, Value>);

    impl ConnectionRegistry for StaticRegistry {
        fn get_connection_params(
            &self,
            alias: &str,
        ) -> Result<ConnectorParams, HostConfigurationError> {
            match self.0.get(alias) {
                Some(Value::Object(map)) => Ok(map.clone()),
                _ => Err(HostConfigurationError::UnknownAlias(alias.to_string())),
            }
        }
    }

    struct StaticPackages(HashMap<&'static str, &'static str>);

    impl PackageMetadata for StaticPackages {
        fn find_spec(&self, name: &str) -> Option<PackageSpec> {
            self.0.get(name).map(|_| PackageSpec {
                name: name.to_string(),
                origin: None,
            })
        }

        fn version(&self, name: &str) -> Result<String, PackageNotFoundError> {
            self.0
                .get(name)
                .map(|v| v.to_string())
                .ok_or_else(|| PackageNotFoundError::new(name))
        }
    }

    fn registry() -> StaticRegistry {
        StaticRegistry(HashMap::from([
            (
                "default",
                json!({"host": "db", "port": 5432, "cursor_factory": "Cursor", "context": "ctx"}),
            ),
            ("replica", json!({"host": "db"})),
        ]))
    }

    #[test]
    fn test_connector_params_strips_excluded_keys() {
        let params = connector_params(&registry(), DEFAULT_DATABASE_ALIAS).unwrap();
        assert_eq!(Value::Object(params), json!({"host": "db", "port": 5432}));
    }

    #[test]
    fn test_connector_params_without_excluded_keys() {
        let params = connector_params(&registry(), "replica").unwrap();
        assert_eq!(Value::Object(params), json!({"host": "db"}));
    }

    #[test]
    fn test_connector_params_unknown_alias() {
        let err = connector_params(&registry(), "missing").unwrap_err();
        assert_eq!(err, HostConfigurationError::UnknownAlias("missing".to_string()));
    }

    #[test]
    fn test_package_is_installed() {
        let packages = StaticPackages(HashMap::from([("serde", "1.0.200")]));
        assert!(package_is_installed(&packages, "serde"));
        assert!(!package_is_installed(&packages, "nonexistent_pkg_xyz"));
    }

    #[test]
    fn test_package_is_version() {
        let packages = StaticPackages(HashMap::from([
            ("two", "2.5.1"),
            ("three", "3.0.0"),
            ("twenty", "20.1"),
            ("empty", ""),
        ]));
        assert!(package_is_version(&packages, "two", 2).unwrap());
        assert!(!package_is_version(&packages, "three", 2).unwrap());
        assert!(!package_is_version(&packages, "twenty", 2).unwrap());
        assert!(!package_is_version(&packages, "empty", 0).unwrap());
    }

    #[test]
    fn test_package_is_version_not_installed() {
        let packages = StaticPackages(HashMap::new());
        let err = package_is_version(&packages, "nonexistent_pkg_xyz", 1).unwrap_err();
        assert_eq!(err, PackageNotFoundError::new("nonexistent_pkg_xyz"));
    }
}
