//! Configuration module
//!
//! Settings are read from the host framework's settings store under the
//! `PROCRASTINATE_` namespace. Every read goes straight to the store: there is
//! no caching layer, so a change in the store is visible on the next call.
//!
//! Two stores are provided: [`EnvSettings`] (process environment, with `.env`
//! support) and [`SettingsMap`] (in-memory, for hosts that hand over a
//! settings object, and for tests).

use std::collections::BTreeMap;
use std::env;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HostConfigurationError;
use crate::hooks::SettingsStore;
use crate::models::WorkerOptions;

/// Namespace prefix of every integration setting.
pub const SETTINGS_PREFIX: &str = "PROCRASTINATE_";

// Integration defaults
const DATABASE_ALIAS: &str = "default";
const AUTODISCOVER_MODULE_NAME: &str = "tasks";

/// Fully-qualified settings key for `name` (`worker_timeout` -> `PROCRASTINATE_WORKER_TIMEOUT`).
pub fn setting_key(name: &str) -> String {
    format!("{}{}", SETTINGS_PREFIX, name.to_uppercase())
}

/// Read `PROCRASTINATE_<NAME>` from the host settings, falling back to `default`.
///
/// The stored value (or the default) is returned exactly, without coercion or
/// validation. A missing setting is never an error; a failing store is, and
/// its error is returned unchanged.
pub fn get_setting(
    store: &dyn SettingsStore,
    name: &str,
    default: Value,
) -> Result<Value, HostConfigurationError> {
    let key = setting_key(name);
    let value = store.lookup(&key)?;
    tracing::trace!(key = %key, found = value.is_some(), "Resolved setting");
    Ok(value.unwrap_or(default))
}

/// Typed variant of [`get_setting`]; `Ok(None)` when the setting is absent.
///
/// Values stored as strings (environment variables) that do not directly
/// deserialize into `T` are parsed again as JSON, so `"4"` reads as `4` and
/// `'["a","b"]'` as a list.
pub fn get_setting_as<T: DeserializeOwned>(
    store: &dyn SettingsStore,
    name: &str,
) -> Result<Option<T>, HostConfigurationError> {
    let value = get_setting(store, name, Value::Null)?;
    if value.is_null() {
        return Ok(None);
    }

    let parsed = match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(direct_err) => match &value {
            Value::String(raw) => serde_json::from_str::<T>(raw),
            _ => Err(direct_err),
        },
    };

    parsed
        .map(Some)
        .map_err(|e| HostConfigurationError::InvalidSetting {
            key: setting_key(name),
            reason: e.to_string(),
        })
}

/// The integration's own settings, read from the host store.
#[derive(Clone, Debug, PartialEq)]
pub struct ContribSettings {
    /// Connection alias the connector is built from.
    pub database_alias: String,
    /// Name of a registered hook called with the real app once it is ready.
    pub on_app_ready: Option<String>,
    /// Extra modules the app imports to find tasks.
    pub import_paths: Vec<String>,
    /// Module name searched in every host app for task declarations.
    pub autodiscover_module_name: String,
    pub worker_defaults: Option<WorkerOptions>,
    pub periodic_defaults: Option<Value>,
}

impl Default for ContribSettings {
    fn default() -> Self {
        Self {
            database_alias: DATABASE_ALIAS.to_string(),
            on_app_ready: None,
            import_paths: Vec::new(),
            autodiscover_module_name: AUTODISCOVER_MODULE_NAME.to_string(),
            worker_defaults: None,
            periodic_defaults: None,
        }
    }
}

impl ContribSettings {
    pub fn from_store(store: &dyn SettingsStore) -> Result<Self, HostConfigurationError> {
        let defaults = ContribSettings::default();

        let settings = ContribSettings {
            database_alias: get_setting_as(store, "DATABASE_ALIAS")?
                .unwrap_or(defaults.database_alias),
            on_app_ready: get_setting_as::<String>(store, "ON_APP_READY")?
                .filter(|s| !s.is_empty()),
            import_paths: get_setting_as(store, "IMPORT_PATHS")?
                .unwrap_or(defaults.import_paths),
            autodiscover_module_name: get_setting_as(store, "AUTODISCOVER_MODULE_NAME")?
                .unwrap_or(defaults.autodiscover_module_name),
            worker_defaults: get_setting_as(store, "WORKER_DEFAULTS")?,
            periodic_defaults: get_setting_as(store, "PERIODIC_DEFAULTS")?,
        };

        tracing::debug!(
            database_alias = %settings.database_alias,
            on_app_ready = ?settings.on_app_ready,
            import_paths = settings.import_paths.len(),
            "Loaded procrastinate settings"
        );

        Ok(settings)
    }
}

/// Settings store backed by the process environment.
///
/// A `.env` file in the working directory is loaded on construction, as
/// everywhere else in this workspace. Values are returned as JSON strings.
#[derive(Clone, Debug)]
pub struct EnvSettings;

impl EnvSettings {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        EnvSettings
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for EnvSettings {
    fn lookup(&self, key: &str) -> Result<Option<Value>, HostConfigurationError> {
        match env::var(key) {
            Ok(value) => Ok(Some(Value::String(value))),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(HostConfigurationError::InvalidSetting {
                key: key.to_string(),
                reason: "value is not valid unicode".to_string(),
            }),
        }
    }
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct SettingsMap {
    values: RwLock<BTreeMap<String, Value>>,
}

impl SettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON object of `KEY: value` pairs.
    pub fn from_json(settings: Value) -> Result<Self, HostConfigurationError> {
        match settings {
            Value::Object(map) => Ok(Self {
                values: RwLock::new(map.into_iter().collect()),
            }),
            other => Err(HostConfigurationError::SettingsUnavailable(format!(
                "expected a settings object, got {}",
                other
            ))),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }
}

impl SettingsStore for SettingsMap {
    fn lookup(&self, key: &str) -> Result<Option<Value>, HostConfigurationError> {
        Ok(self.values.read().get(key).cloned())
    }
}
