use serde::{Deserialize, Serialize};

use super::job::{ConfiguredJob, JobOptions};

/// Queue used by tasks that do not name one.
pub const DEFAULT_QUEUE: &str = "default";

/// Declarative description of a task, registered on a blueprint.
///
/// Registration is pure bookkeeping and is allowed before the host is ready;
/// nothing here touches the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(default)]
    pub lock: Option<String>,
    #[serde(default)]
    pub queueing_lock: Option<String>,
    #[serde(default)]
    pub priority: i32,
    /// Number of automatic retries on failure.
    #[serde(default)]
    pub retry: u32,
    #[serde(default)]
    pub pass_context: bool,
    /// Additional names the task can be looked up by.
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_queue() -> String {
    DEFAULT_QUEUE.to_string()
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: default_queue(),
            lock: None,
            queueing_lock: None,
            priority: 0,
            retry: 0,
            pass_context: false,
            aliases: Vec::new(),
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_lock(mut self, lock: impl Into<String>) -> Self {
        self.lock = Some(lock.into());
        self
    }

    pub fn with_queueing_lock(mut self, queueing_lock: impl Into<String>) -> Self {
        self.queueing_lock = Some(queueing_lock.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pass_context(mut self, pass_context: bool) -> Self {
        self.pass_context = pass_context;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Copy of this definition registered under `namespace:name`.
    ///
    /// An empty namespace keeps the name unchanged.
    pub fn namespaced(&self, namespace: &str) -> Self {
        let mut task = self.clone();
        if !namespace.is_empty() {
            task.name = format!("{}:{}", namespace, self.name);
        }
        task
    }

    /// Resolve per-job options against this task's defaults.
    ///
    /// Explicit job options win; anything left unset falls back to the
    /// values declared on the task.
    pub fn configure(&self, options: JobOptions) -> ConfiguredJob {
        ConfiguredJob {
            task_name: self.name.clone(),
            queue: options.queue.unwrap_or_else(|| self.queue.clone()),
            lock: options.lock.or_else(|| self.lock.clone()),
            queueing_lock: options
                .queueing_lock
                .or_else(|| self.queueing_lock.clone()),
            priority: options.priority.unwrap_or(self.priority),
            schedule_in_secs: options.schedule_in_secs,
            task_kwargs: options.task_kwargs,
        }
    }
}
