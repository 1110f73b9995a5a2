#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use procrastinate_contrib::{App, AppFactory, Blueprint, SchemaManager};
use procrastinate_core::models::{ConfiguredJob, ConnectorParams, JobOptions, WorkerOptions};
use procrastinate_core::{ContribError, ContribSettings, SettingsMap};

/// Connector-backed app stand-in that records the operations it served.
#[derive(Debug, Default)]
pub struct RecordingApp {
    blueprint: Blueprint,
    pub params: ConnectorParams,
    pub calls: Mutex<Vec<&'static str>>,
}

impl RecordingApp {
    pub fn with_params(params: ConnectorParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().push(operation);
    }
}

#[derive(Debug)]
struct StaticSchema;

impl SchemaManager for StaticSchema {
    fn get_schema(&self) -> String {
        "CREATE TABLE procrastinate_jobs ();".to_string()
    }

    fn apply_schema(&self) -> Result<(), ContribError> {
        Ok(())
    }
}

#[async_trait]
impl App for RecordingApp {
    fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    fn enter(&self) -> Result<(), ContribError> {
        self.record("enter");
        Ok(())
    }

    fn exit(&self) -> Result<(), ContribError> {
        self.record("exit");
        Ok(())
    }

    fn register_builtin_tasks(&self) -> Result<(), ContribError> {
        self.record("register_builtin_tasks");
        Ok(())
    }

    fn worker(&self, options: WorkerOptions) -> Result<WorkerOptions, ContribError> {
        self.record("worker");
        Ok(options)
    }

    async fn check_connection_async(&self) -> Result<bool, ContribError> {
        self.record("check_connection_async");
        Ok(true)
    }

    fn check_connection(&self) -> Result<bool, ContribError> {
        self.record("check_connection");
        Ok(true)
    }

    async fn close_async(&self) -> Result<(), ContribError> {
        self.record("close_async");
        Ok(())
    }

    fn close(&self) -> Result<(), ContribError> {
        self.record("close");
        Ok(())
    }

    fn configure_task(
        &self,
        name: &str,
        options: JobOptions,
    ) -> Result<ConfiguredJob, ContribError> {
        self.record("configure_task");
        let task = self
            .get_task(name)
            .ok_or_else(|| ContribError::Engine(anyhow::anyhow!("unknown task {}", name)))?;
        Ok(task.configure(options))
    }

    async fn open_async(&self) -> Result<(), ContribError> {
        self.record("open_async");
        Ok(())
    }

    fn open(&self) -> Result<(), ContribError> {
        self.record("open");
        Ok(())
    }

    fn perform_import_paths(&self) -> Result<(), ContribError> {
        self.record("perform_import_paths");
        Ok(())
    }

    async fn run_worker_async(&self, _options: WorkerOptions) -> Result<(), ContribError> {
        self.record("run_worker_async");
        Ok(())
    }

    fn run_worker(&self, _options: WorkerOptions) -> Result<(), ContribError> {
        self.record("run_worker");
        Ok(())
    }

    fn schema_manager(&self) -> Result<Arc<dyn SchemaManager>, ContribError> {
        self.record("schema_manager");
        Ok(Arc::new(StaticSchema))
    }

    fn with_connector(&self, params: ConnectorParams) -> Result<Arc<dyn App>, ContribError> {
        self.record("with_connector");
        let app = RecordingApp::with_params(params);
        app.add_tasks_from(&self.blueprint, "")?;
        Ok(Arc::new(app))
    }

    fn will_configure_task(&self) -> Result<(), ContribError> {
        self.record("will_configure_task");
        Ok(())
    }
}

/// Factory building [`RecordingApp`]s and keeping the last one around.
#[derive(Default)]
pub struct RecordingFactory {
    pub created: Mutex<Option<Arc<RecordingApp>>>,
}

impl RecordingFactory {
    pub fn last(&self) -> Option<Arc<RecordingApp>> {
        self.created.lock().clone()
    }
}

impl AppFactory for RecordingFactory {
    fn create_app(
        &self,
        params: ConnectorParams,
        _settings: &ContribSettings,
    ) -> Result<Arc<dyn App>, ContribError> {
        let app = Arc::new(RecordingApp::with_params(params));
        *self.created.lock() = Some(app.clone());
        Ok(app)
    }
}

pub fn settings(values: Value) -> Arc<SettingsMap> {
    Arc::new(SettingsMap::from_json(values).expect("settings must be a JSON object"))
}
