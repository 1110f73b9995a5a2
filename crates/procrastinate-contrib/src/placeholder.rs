//! Placeholder entry point used until the host framework is ready
//!
//! Applications declare tasks at import time, long before the host has loaded
//! its settings and connections. [`FutureApp`] accepts those declarations but
//! refuses every [`Operation`] with a [`NotReady`] error explaining how to
//! reorder the calling code.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use procrastinate_core::models::{
    ConfiguredJob, ConnectorParams, JobOptions, TaskDefinition, WorkerOptions,
};
use procrastinate_core::{ContribError, NotReady};

use crate::app::{App, Blueprint, Operation, SchemaManager};

/// Path application code reaches the entry point through.
const ENTRY_POINT_PATH: &str = "procrastinate_contrib::app()";
/// Name the integration is listed under in the host's installed apps.
const INTEGRATION_NAME: &str = "procrastinate_contrib";

/// Build the diagnostic for a protected operation called too early.
pub fn not_ready(operation: Operation) -> NotReady {
    let base_text = format!(
        "Cannot call {}.{}() before the '{}' host app is ready.",
        ENTRY_POINT_PATH, operation, INTEGRATION_NAME
    );
    let details = format!(
        "If this message appears at import time, the app is not ready yet: \
         move the corresponding code in an app's `ready()` hook. \
         If this message appears in an app's `ready()` hook, \
         make sure `{}` appears before that app when ordering the host's installed apps. \
         Alternatively, use the setting PROCRASTINATE_ON_APP_READY.",
        INTEGRATION_NAME
    );
    NotReady::new(operation.as_str(), format!("{}\n\n{}", base_text, details))
}

fn refuse<T>(operation: Operation) -> Result<T, ContribError> {
    let err = not_ready(operation);
    tracing::warn!(
        operation = operation.as_str(),
        "Protected operation called before the host app is ready"
    );
    Err(err.into())
}

/// Stand-in for the real app before host readiness.
///
/// Declarative calls go to the embedded [`Blueprint`] until
/// [`FutureApp::hand_over`] installs a successor; from then on they are
/// forwarded to it, so a task declared through a stale handle still reaches
/// the real app.
#[derive(Debug, Default)]
pub struct FutureApp {
    blueprint: Blueprint,
    successor: RwLock<Option<Arc<dyn App>>>,
}

impl FutureApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the declared tasks into `app` (no namespace) and forward every
    /// later declaration to it.
    ///
    /// Declarations are blocked while the copy runs, so each one lands either
    /// in the copy or in `app` directly. Returns the number of tasks copied.
    /// On a name clash nothing is forwarded and this placeholder keeps
    /// accepting declarations.
    pub fn hand_over(&self, app: Arc<dyn App>) -> Result<usize, ContribError> {
        let mut successor = self.successor.write();
        if successor.is_some() {
            return Err(ContribError::AlreadyReady);
        }
        app.add_tasks_from(&self.blueprint, "")?;
        *successor = Some(app);
        Ok(self.blueprint.len())
    }

    pub fn is_handed_over(&self) -> bool {
        self.successor.read().is_some()
    }
}

#[async_trait]
impl App for FutureApp {
    /// Tasks declared before the hand-over only.
    fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    fn register_task(&self, task: TaskDefinition) -> Result<(), ContribError> {
        let successor = self.successor.read();
        match successor.as_ref() {
            Some(app) => {
                tracing::debug!(task = %task.name, "Forwarding late task declaration");
                app.register_task(task)
            }
            None => self.blueprint.register_task(task).map_err(Into::into),
        }
    }

    fn tasks(&self) -> Vec<TaskDefinition> {
        match self.successor.read().as_ref() {
            Some(app) => app.tasks(),
            None => self.blueprint.tasks(),
        }
    }

    fn get_task(&self, name: &str) -> Option<TaskDefinition> {
        match self.successor.read().as_ref() {
            Some(app) => app.get_task(name),
            None => self.blueprint.get_task(name),
        }
    }

    fn add_tasks_from(&self, other: &Blueprint, namespace: &str) -> Result<(), ContribError> {
        let successor = self.successor.read();
        match successor.as_ref() {
            Some(app) => app.add_tasks_from(other, namespace),
            None => self
                .blueprint
                .add_tasks_from(other, namespace)
                .map_err(Into::into),
        }
    }

    fn enter(&self) -> Result<(), ContribError> {
        refuse(Operation::Enter)
    }

    fn exit(&self) -> Result<(), ContribError> {
        refuse(Operation::Exit)
    }

    fn register_builtin_tasks(&self) -> Result<(), ContribError> {
        refuse(Operation::RegisterBuiltinTasks)
    }

    fn worker(&self, _options: WorkerOptions) -> Result<WorkerOptions, ContribError> {
        refuse(Operation::Worker)
    }

    async fn check_connection_async(&self) -> Result<bool, ContribError> {
        refuse(Operation::CheckConnectionAsync)
    }

    fn check_connection(&self) -> Result<bool, ContribError> {
        refuse(Operation::CheckConnection)
    }

    async fn close_async(&self) -> Result<(), ContribError> {
        refuse(Operation::CloseAsync)
    }

    fn close(&self) -> Result<(), ContribError> {
        refuse(Operation::Close)
    }

    fn configure_task(
        &self,
        _name: &str,
        _options: JobOptions,
    ) -> Result<ConfiguredJob, ContribError> {
        refuse(Operation::ConfigureTask)
    }

    async fn open_async(&self) -> Result<(), ContribError> {
        refuse(Operation::OpenAsync)
    }

    fn open(&self) -> Result<(), ContribError> {
        refuse(Operation::Open)
    }

    fn perform_import_paths(&self) -> Result<(), ContribError> {
        refuse(Operation::PerformImportPaths)
    }

    async fn run_worker_async(&self, _options: WorkerOptions) -> Result<(), ContribError> {
        refuse(Operation::RunWorkerAsync)
    }

    fn run_worker(&self, _options: WorkerOptions) -> Result<(), ContribError> {
        refuse(Operation::RunWorker)
    }

    fn schema_manager(&self) -> Result<Arc<dyn SchemaManager>, ContribError> {
        refuse(Operation::SchemaManager)
    }

    fn with_connector(&self, _params: ConnectorParams) -> Result<Arc<dyn App>, ContribError> {
        refuse(Operation::WithConnector)
    }

    fn will_configure_task(&self) -> Result<(), ContribError> {
        refuse(Operation::WillConfigureTask)
    }
}
