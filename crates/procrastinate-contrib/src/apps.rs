//! Host framework ready glue
//!
//! [`HostIntegration::ready`] is what the host calls from its readiness phase:
//! it reads the integration settings, adapts the configured connection,
//! builds the real app through the engine's [`AppFactory`], swaps it into the
//! [`EntryPoint`] and finally runs the optional `PROCRASTINATE_ON_APP_READY` hook.

use std::collections::BTreeMap;
use std::sync::Arc;

use procrastinate_core::models::ConnectorParams;
use procrastinate_core::{
    ConnectionRegistry, ContribError, ContribSettings, HostConfigurationError, SettingsStore,
};

use crate::app::App;
use crate::entry::{entry_point, EntryPoint};
use crate::utils::connector_params;

/// Builds the real, connector-backed app. Implemented by the task-queue engine.
pub trait AppFactory: Send + Sync {
    fn create_app(
        &self,
        params: ConnectorParams,
        settings: &ContribSettings,
    ) -> Result<Arc<dyn App>, ContribError>;
}

/// Callback run with the real app once it is installed.
pub type ReadyHook = Arc<dyn Fn(&dyn App) -> Result<(), ContribError> + Send + Sync>;

/// Named ready hooks, selected through `PROCRASTINATE_ON_APP_READY`.
#[derive(Clone, Default)]
pub struct ReadyHooks {
    hooks: BTreeMap<String, ReadyHook>,
}

impl ReadyHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&dyn App) -> Result<(), ContribError> + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
    }

    pub fn get(&self, name: &str) -> Option<ReadyHook> {
        self.hooks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }
}

impl std::fmt::Debug for ReadyHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.hooks.keys()).finish()
    }
}

/// Host-side wiring of the integration.
#[derive(Clone)]
pub struct HostIntegration {
    settings: Arc<dyn SettingsStore>,
    connections: Arc<dyn ConnectionRegistry>,
    factory: Arc<dyn AppFactory>,
    hooks: ReadyHooks,
}

impl HostIntegration {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        connections: Arc<dyn ConnectionRegistry>,
        factory: Arc<dyn AppFactory>,
    ) -> Self {
        Self {
            settings,
            connections,
            factory,
            hooks: ReadyHooks::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: ReadyHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build the real app and install it in `entry`.
    ///
    /// Configuration problems (unknown alias, unknown hook name, invalid
    /// settings) are reported before anything is swapped, so a failed call
    /// leaves the placeholder in place. The hook runs after the swap, against
    /// the installed app.
    pub fn ready(&self, entry: &EntryPoint) -> Result<Arc<dyn App>, ContribError> {
        if entry.is_ready() {
            return Err(ContribError::AlreadyReady);
        }

        let settings = ContribSettings::from_store(self.settings.as_ref())?;

        let hook = match &settings.on_app_ready {
            Some(name) => Some(
                self.hooks
                    .get(name)
                    .ok_or_else(|| HostConfigurationError::UnknownHook(name.clone()))?,
            ),
            None => None,
        };

        let params = connector_params(self.connections.as_ref(), &settings.database_alias)?;
        let app = self.factory.create_app(params, &settings)?;
        entry.mark_ready(app.clone())?;

        tracing::info!(
            database_alias = %settings.database_alias,
            tasks = app.tasks().len(),
            "Procrastinate app installed"
        );

        if let Some(hook) = hook {
            tracing::debug!(hook = ?settings.on_app_ready, "Running on-app-ready hook");
            hook(app.as_ref())?;
        }

        Ok(app)
    }

    /// [`HostIntegration::ready`] against the process-wide entry point.
    pub fn ready_global(&self) -> Result<Arc<dyn App>, ContribError> {
        self.ready(entry_point())
    }
}

impl std::fmt::Debug for HostIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostIntegration")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::FutureApp;
    use parking_lot::Mutex;
    use procrastinate_core::{SettingsMap, TaskDefinition};
    use serde_json::{json, Value};

    struct MapRegistry(Value);

    impl ConnectionRegistry for MapRegistry {
        fn get_connection_params(
            &self,
            alias: &str,
        ) -> Result<ConnectorParams, HostConfigurationError> {
            self.0
                .get(alias)
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| HostConfigurationError::UnknownAlias(alias.to_string()))
        }
    }

    /// Records the parameters it was built with and hands out placeholder apps.
    #[derive(Default)]
    struct RecordingFactory {
        params: Mutex<Vec<ConnectorParams>>,
    }

    impl AppFactory for RecordingFactory {
        fn create_app(
            &self,
            params: ConnectorParams,
            _settings: &ContribSettings,
        ) -> Result<Arc<dyn App>, ContribError> {
            self.params.lock().push(params);
            Ok(Arc::new(FutureApp::new()))
        }
    }

    fn integration(settings: Value, factory: Arc<RecordingFactory>) -> HostIntegration {
        let connections = MapRegistry(json!({
            "default": {"host": "db", "cursor_factory": "Cursor", "context": "ctx"},
            "queue": {"host": "queue-db"}
        }));
        HostIntegration::new(
            Arc::new(SettingsMap::from_json(settings).unwrap()),
            Arc::new(connections),
            factory,
        )
    }

    #[test]
    fn test_ready_builds_app_from_adapted_params() {
        let factory = Arc::new(RecordingFactory::default());
        let integration = integration(json!({}), factory.clone());
        let entry = EntryPoint::new();

        integration.ready(&entry).unwrap();

        assert!(entry.is_ready());
        let params = factory.params.lock();
        assert_eq!(Value::Object(params[0].clone()), json!({"host": "db"}));
    }

    #[test]
    fn test_ready_uses_database_alias_setting() {
        let factory = Arc::new(RecordingFactory::default());
        let integration = integration(
            json!({"PROCRASTINATE_DATABASE_ALIAS": "queue"}),
            factory.clone(),
        );

        integration.ready(&EntryPoint::new()).unwrap();
        assert_eq!(factory.params.lock()[0]["host"], json!("queue-db"));
    }

    #[test]
    fn test_ready_unknown_alias_keeps_placeholder() {
        let factory = Arc::new(RecordingFactory::default());
        let integration = integration(
            json!({"PROCRASTINATE_DATABASE_ALIAS": "missing"}),
            factory.clone(),
        );
        let entry = EntryPoint::new();

        let err = integration.ready(&entry).unwrap_err();
        assert!(matches!(
            err,
            ContribError::HostConfiguration(HostConfigurationError::UnknownAlias(_))
        ));
        assert!(!entry.is_ready());
        assert!(factory.params.lock().is_empty());
    }

    #[test]
    fn test_ready_runs_hook_with_real_app() {
        let called = Arc::new(Mutex::new(Vec::new()));
        let seen = called.clone();
        let mut hooks = ReadyHooks::new();
        hooks.register("register_periodic", move |app: &dyn App| {
            seen.lock().push(app.tasks().len());
            app.register_task(TaskDefinition::new("periodic_cleanup"))
        });

        let integration = integration(
            json!({"PROCRASTINATE_ON_APP_READY": "register_periodic"}),
            Arc::new(RecordingFactory::default()),
        )
        .with_hooks(hooks);
        let entry = EntryPoint::new();
        entry
            .current()
            .register_task(TaskDefinition::new("send_email"))
            .unwrap();

        let app = integration.ready(&entry).unwrap();
        assert_eq!(*called.lock(), vec![1]);
        assert!(app.get_task("periodic_cleanup").is_some());
        assert!(app.get_task("send_email").is_some());
    }

    #[test]
    fn test_ready_unknown_hook_fails_before_swap() {
        let integration = integration(
            json!({"PROCRASTINATE_ON_APP_READY": "missing_hook"}),
            Arc::new(RecordingFactory::default()),
        );
        let entry = EntryPoint::new();

        let err = integration.ready(&entry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No ready hook is registered under the name 'missing_hook'"
        );
        assert!(!entry.is_ready());
    }

    #[test]
    fn test_ready_twice() {
        let integration = integration(json!({}), Arc::new(RecordingFactory::default()));
        let entry = EntryPoint::new();
        integration.ready(&entry).unwrap();
        assert!(matches!(
            integration.ready(&entry),
            Err(ContribError::AlreadyReady)
        ));
    }
}
