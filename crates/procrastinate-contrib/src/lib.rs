//! Procrastinate host integration
//!
//! Lets the task queue take part in a host framework's startup lifecycle:
//!
//! - Before the host signals readiness, [`app()`] returns a [`FutureApp`]: tasks
//!   can be declared on it, but every operational call fails with a
//!   [`NotReady`](procrastinate_core::NotReady) diagnostic.
//! - [`HostIntegration::ready`] builds the real app from the host settings and
//!   connection parameters and swaps it into the [`EntryPoint`].
//! - [`connector_params`], [`get_setting`], [`package_is_installed`] and
//!   [`package_is_version`] carry no lifecycle and can be used at any time.

pub mod app;
pub mod apps;
pub mod connections;
pub mod entry;
pub mod packages;
pub mod placeholder;
pub mod telemetry;
pub mod utils;

pub use app::{App, Blueprint, Operation, SchemaManager};
pub use apps::{AppFactory, HostIntegration, ReadyHook, ReadyHooks};
pub use connections::DatabaseSettingsRegistry;
pub use entry::{app, entry_point, EntryPoint};
pub use packages::PackageIndex;
pub use placeholder::{not_ready, FutureApp};
pub use telemetry::init_telemetry;
pub use utils::{
    connector_params, get_setting, package_is_installed, package_is_version,
    DEFAULT_DATABASE_ALIAS, EXCLUDED_CONNECTOR_KEYS,
};
