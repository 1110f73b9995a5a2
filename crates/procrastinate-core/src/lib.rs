//! Procrastinate Core Library
//!
//! This crate provides the host-facing pieces of the procrastinate host integration:
//! error types, the provider traits a host framework implements (settings store,
//! connection registry, package metadata), namespaced setting resolution and the
//! job/worker/task models shared with the integration layer.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::{
    get_setting, get_setting_as, setting_key, ContribSettings, EnvSettings, SettingsMap,
    SETTINGS_PREFIX,
};
pub use error::{
    BlueprintError, ContribError, HostConfigurationError, LogLevel, NotReady,
    PackageNotFoundError,
};
pub use hooks::{ConnectionRegistry, PackageMetadata, PackageSpec, SettingsStore};
pub use models::{
    ConfiguredJob, ConnectorParams, JobOptions, TaskDefinition, WorkerOptions, DEFAULT_QUEUE,
};
