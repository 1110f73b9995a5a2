//! Connection registry backed by the host's `DATABASES` setting
//!
//! Produces the PostgreSQL driver parameters the host's database backend would
//! open its own connections with, including the driver-only entries that
//! [`connector_params`](crate::connector_params) strips again.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use procrastinate_core::models::ConnectorParams;
use procrastinate_core::{ConnectionRegistry, HostConfigurationError, SettingsStore};

/// Settings key holding the host's connection descriptors.
pub const DATABASES_SETTING: &str = "DATABASES";

const CLIENT_ENCODING: &str = "UTF8";

/// Backend options the host consumes itself and never hands to the driver.
const BACKEND_ONLY_OPTIONS: [&str; 3] = ["isolation_level", "server_side_binding", "assume_role"];

/// One entry of the `DATABASES` setting.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "UPPERCASE")]
struct DatabaseDescriptor {
    name: Option<String>,
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<Value>,
    options: Map<String, Value>,
}

/// [`ConnectionRegistry`] reading `DATABASES` from a settings store.
///
/// The setting is read on every call so configuration changes are picked up
/// immediately.
#[derive(Clone)]
pub struct DatabaseSettingsRegistry {
    settings: Arc<dyn SettingsStore>,
}

impl DatabaseSettingsRegistry {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    fn databases(&self) -> Result<HashMap<String, DatabaseDescriptor>, HostConfigurationError> {
        let Some(raw) = self.settings.lookup(DATABASES_SETTING)? else {
            return Ok(HashMap::new());
        };

        let parsed = match &raw {
            Value::String(text) => serde_json::from_str(text),
            other => serde_json::from_value(other.clone()),
        };

        parsed.map_err(|e| HostConfigurationError::InvalidSetting {
            key: DATABASES_SETTING.to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for DatabaseSettingsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettingsRegistry").finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<Value> {
    value.filter(|v| !v.is_empty()).map(Value::String)
}

impl ConnectionRegistry for DatabaseSettingsRegistry {
    fn get_connection_params(
        &self,
        alias: &str,
    ) -> Result<ConnectorParams, HostConfigurationError> {
        let mut databases = self.databases()?;
        let descriptor = databases
            .remove(alias)
            .ok_or_else(|| HostConfigurationError::UnknownAlias(alias.to_string()))?;

        let server_side_binding = descriptor
            .options
            .get("server_side_binding")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut params = ConnectorParams::new();
        params.insert(
            "client_encoding".to_string(),
            Value::String(CLIENT_ENCODING.to_string()),
        );
        for (key, value) in descriptor.options {
            if !BACKEND_ONLY_OPTIONS.contains(&key.as_str()) {
                params.insert(key, value);
            }
        }

        let fields = [
            ("dbname", non_empty(descriptor.name)),
            ("user", non_empty(descriptor.user)),
            ("password", non_empty(descriptor.password)),
            ("host", non_empty(descriptor.host)),
            (
                "port",
                descriptor
                    .port
                    .filter(|p| !p.is_null() && p.as_str() != Some("")),
            ),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                params.insert(key.to_string(), value);
            }
        }

        let cursor_factory = if server_side_binding {
            "ServerBindingCursor"
        } else {
            "Cursor"
        };
        params.insert(
            "cursor_factory".to_string(),
            Value::String(cursor_factory.to_string()),
        );
        params.insert(
            "context".to_string(),
            Value::String("AdaptersMap".to_string()),
        );

        tracing::trace!(alias = %alias, "Built host connection parameters");
        Ok(params)
    }
}
