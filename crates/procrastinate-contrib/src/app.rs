//! The task-queue entry point interface
//!
//! [`App`] is implemented by the real, connector-backed app (provided by the
//! task-queue engine) and by the [`FutureApp`](crate::FutureApp) placeholder.
//! Its methods split in two groups:
//!
//! - declarative: task registration on the embedded [`Blueprint`]; safe at any
//!   time, including before the host is ready.
//! - operational: the methods listed in [`Operation`]; they need a live,
//!   configured connector.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use procrastinate_core::models::{
    ConfiguredJob, ConnectorParams, JobOptions, TaskDefinition, WorkerOptions,
};
use procrastinate_core::{BlueprintError, ContribError};

/// Operations that require a fully configured app.
///
/// Each variant names a required method of [`App`]; [`Operation::invoke`]
/// matches on every variant, so adding one without wiring it fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Enter,
    Exit,
    RegisterBuiltinTasks,
    Worker,
    CheckConnectionAsync,
    CheckConnection,
    CloseAsync,
    Close,
    ConfigureTask,
    OpenAsync,
    Open,
    PerformImportPaths,
    RunWorkerAsync,
    RunWorker,
    SchemaManager,
    WithConnector,
    WillConfigureTask,
}

impl Operation {
    pub const ALL: [Operation; 17] = [
        Operation::Enter,
        Operation::Exit,
        Operation::RegisterBuiltinTasks,
        Operation::Worker,
        Operation::CheckConnectionAsync,
        Operation::CheckConnection,
        Operation::CloseAsync,
        Operation::Close,
        Operation::ConfigureTask,
        Operation::OpenAsync,
        Operation::Open,
        Operation::PerformImportPaths,
        Operation::RunWorkerAsync,
        Operation::RunWorker,
        Operation::SchemaManager,
        Operation::WithConnector,
        Operation::WillConfigureTask,
    ];

    /// Method name on [`App`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Enter => "enter",
            Operation::Exit => "exit",
            Operation::RegisterBuiltinTasks => "register_builtin_tasks",
            Operation::Worker => "worker",
            Operation::CheckConnectionAsync => "check_connection_async",
            Operation::CheckConnection => "check_connection",
            Operation::CloseAsync => "close_async",
            Operation::Close => "close",
            Operation::ConfigureTask => "configure_task",
            Operation::OpenAsync => "open_async",
            Operation::Open => "open",
            Operation::PerformImportPaths => "perform_import_paths",
            Operation::RunWorkerAsync => "run_worker_async",
            Operation::RunWorker => "run_worker",
            Operation::SchemaManager => "schema_manager",
            Operation::WithConnector => "with_connector",
            Operation::WillConfigureTask => "will_configure_task",
        }
    }

    /// Call the matching method on `app` with neutral arguments, discarding
    /// its output.
    ///
    /// `configure_task` is called with the first registered task name (or an
    /// empty name on an empty blueprint); the worker operations get
    /// non-waiting default options.
    pub async fn invoke(self, app: &dyn App) -> Result<(), ContribError> {
        let options = WorkerOptions::default().with_wait(false);
        match self {
            Operation::Enter => app.enter(),
            Operation::Exit => app.exit(),
            Operation::RegisterBuiltinTasks => app.register_builtin_tasks(),
            Operation::Worker => app.worker(options).map(drop),
            Operation::CheckConnectionAsync => app.check_connection_async().await.map(drop),
            Operation::CheckConnection => app.check_connection().map(drop),
            Operation::CloseAsync => app.close_async().await,
            Operation::Close => app.close(),
            Operation::ConfigureTask => {
                let name = app
                    .tasks()
                    .into_iter()
                    .next()
                    .map(|task| task.name)
                    .unwrap_or_default();
                app.configure_task(&name, JobOptions::default()).map(drop)
            }
            Operation::OpenAsync => app.open_async().await,
            Operation::Open => app.open(),
            Operation::PerformImportPaths => app.perform_import_paths(),
            Operation::RunWorkerAsync => app.run_worker_async(options).await,
            Operation::RunWorker => app.run_worker(options),
            Operation::SchemaManager => app.schema_manager().map(drop),
            Operation::WithConnector => app.with_connector(ConnectorParams::new()).map(drop),
            Operation::WillConfigureTask => app.will_configure_task(),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manages the task-queue database schema.
pub trait SchemaManager: Send + Sync + Debug {
    /// SQL of the schema the app expects.
    fn get_schema(&self) -> String;

    fn apply_schema(&self) -> Result<(), ContribError>;
}

/// Declarative task registry.
///
/// Thread-safe: registration takes a short write lock, lookups a read lock.
#[derive(Debug, Default)]
pub struct Blueprint {
    tasks: RwLock<BTreeMap<String, TaskDefinition>>,
}

impl Blueprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its name.
    pub fn register_task(&self, task: TaskDefinition) -> Result<(), BlueprintError> {
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&task.name) {
            return Err(BlueprintError::TaskAlreadyRegistered(task.name));
        }
        tracing::debug!(task = %task.name, queue = %task.queue, "Task registered");
        tasks.insert(task.name.clone(), task);
        Ok(())
    }

    /// All registered tasks, ordered by name.
    pub fn tasks(&self) -> Vec<TaskDefinition> {
        self.tasks.read().values().cloned().collect()
    }

    /// Find a task by name or alias.
    pub fn get_task(&self, name: &str) -> Option<TaskDefinition> {
        let tasks = self.tasks.read();
        tasks.get(name).cloned().or_else(|| {
            tasks
                .values()
                .find(|task| task.aliases.iter().any(|alias| alias == name))
                .cloned()
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Copy every task of `other` into this blueprint under `namespace`.
    ///
    /// Nothing is inserted if any resulting name is already taken.
    pub fn add_tasks_from(&self, other: &Blueprint, namespace: &str) -> Result<(), BlueprintError> {
        let incoming: Vec<TaskDefinition> = other
            .tasks()
            .iter()
            .map(|task| task.namespaced(namespace))
            .collect();

        let mut tasks = self.tasks.write();
        if let Some(taken) = incoming.iter().find(|task| tasks.contains_key(&task.name)) {
            return Err(BlueprintError::TaskAlreadyRegistered(taken.name.clone()));
        }
        for task in incoming {
            tasks.insert(task.name.clone(), task);
        }
        Ok(())
    }
}

/// Public entry point of the task queue.
#[async_trait]
pub trait App: Send + Sync + Debug {
    /// Task registry backing the declarative methods.
    fn blueprint(&self) -> &Blueprint;

    fn register_task(&self, task: TaskDefinition) -> Result<(), ContribError> {
        self.blueprint().register_task(task).map_err(Into::into)
    }

    fn tasks(&self) -> Vec<TaskDefinition> {
        self.blueprint().tasks()
    }

    fn get_task(&self, name: &str) -> Option<TaskDefinition> {
        self.blueprint().get_task(name)
    }

    fn add_tasks_from(&self, other: &Blueprint, namespace: &str) -> Result<(), ContribError> {
        self.blueprint()
            .add_tasks_from(other, namespace)
            .map_err(Into::into)
    }

    /// Open the connector for the duration of a scope; paired with [`App::exit`].
    fn enter(&self) -> Result<(), ContribError>;

    fn exit(&self) -> Result<(), ContribError>;

    /// Register the tasks the engine ships with (job cleanup and the like).
    fn register_builtin_tasks(&self) -> Result<(), ContribError>;

    /// Resolve the effective worker configuration for `options`.
    fn worker(&self, options: WorkerOptions) -> Result<WorkerOptions, ContribError>;

    async fn check_connection_async(&self) -> Result<bool, ContribError>;

    fn check_connection(&self) -> Result<bool, ContribError>;

    async fn close_async(&self) -> Result<(), ContribError>;

    fn close(&self) -> Result<(), ContribError>;

    /// Prepare a job for the task named `name`.
    fn configure_task(&self, name: &str, options: JobOptions)
        -> Result<ConfiguredJob, ContribError>;

    async fn open_async(&self) -> Result<(), ContribError>;

    fn open(&self) -> Result<(), ContribError>;

    /// Load the modules listed in the import paths so their tasks register.
    fn perform_import_paths(&self) -> Result<(), ContribError>;

    async fn run_worker_async(&self, options: WorkerOptions) -> Result<(), ContribError>;

    fn run_worker(&self, options: WorkerOptions) -> Result<(), ContribError>;

    fn schema_manager(&self) -> Result<Arc<dyn SchemaManager>, ContribError>;

    /// A copy of this app bound to a different connector.
    fn with_connector(&self, params: ConnectorParams) -> Result<Arc<dyn App>, ContribError>;

    /// Announce that jobs will be configured by task name from outside the
    /// registered blueprint (e.g. deferring by name from another service).
    fn will_configure_task(&self) -> Result<(), ContribError>;
}
