use serde::{Deserialize, Serialize};
use serde_json::Value;

// Worker defaults
const WORKER_CONCURRENCY: usize = 1;
const FETCH_JOB_POLLING_INTERVAL_SECS: f64 = 5.0;
const ABORT_JOB_POLLING_INTERVAL_SECS: f64 = 5.0;

/// Per-job overrides passed to `App::configure_task`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub queue: Option<String>,
    pub lock: Option<String>,
    pub queueing_lock: Option<String>,
    pub priority: Option<i32>,
    pub schedule_in_secs: Option<u64>,
    pub task_kwargs: Value,
}

/// A job ready to be deferred: task defaults merged with job options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredJob {
    pub task_name: String,
    pub queue: String,
    pub lock: Option<String>,
    pub queueing_lock: Option<String>,
    pub priority: i32,
    pub schedule_in_secs: Option<u64>,
    pub task_kwargs: Value,
}

/// What the worker does with finished jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteJobs {
    #[default]
    Never,
    Successful,
    Always,
}

/// Worker configuration, as accepted by `App::run_worker` and the
/// `PROCRASTINATE_WORKER_DEFAULTS` setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOptions {
    /// Queues to listen to; `None` means all queues.
    pub queues: Option<Vec<String>>,
    pub name: Option<String>,
    pub concurrency: usize,
    /// Keep waiting for new jobs once the queues are empty.
    pub wait: bool,
    pub fetch_job_polling_interval: f64,
    pub abort_job_polling_interval: f64,
    pub shutdown_graceful_timeout: Option<f64>,
    pub listen_notify: bool,
    pub delete_jobs: DeleteJobs,
    pub install_signal_handlers: bool,
    pub additional_context: Option<Value>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            queues: None,
            name: None,
            concurrency: WORKER_CONCURRENCY,
            wait: true,
            fetch_job_polling_interval: FETCH_JOB_POLLING_INTERVAL_SECS,
            abort_job_polling_interval: ABORT_JOB_POLLING_INTERVAL_SECS,
            shutdown_graceful_timeout: None,
            listen_notify: true,
            delete_jobs: DeleteJobs::Never,
            install_signal_handlers: true,
            additional_context: None,
        }
    }
}

impl WorkerOptions {
    pub fn with_queues<I, S>(mut self, queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queues = Some(queues.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_worker_defaults() {
        let options = WorkerOptions::default();
        assert_eq!(options.concurrency, 1);
        assert!(options.wait);
        assert!(options.queues.is_none());
        assert_eq!(options.delete_jobs, DeleteJobs::Never);
    }

    #[test]
    fn test_worker_options_from_partial_json() {
        let options: WorkerOptions =
            serde_json::from_value(json!({"concurrency": 4, "delete_jobs": "successful"}))
                .unwrap();
        assert_eq!(options.concurrency, 4);
        assert_eq!(options.delete_jobs, DeleteJobs::Successful);
        assert!(options.listen_notify);
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        assert_eq!(WorkerOptions::default().with_concurrency(0).concurrency, 1);
    }

    #[test]
    fn test_builders() {
        let options = WorkerOptions::default()
            .with_queues(["emails", "reports"])
            .with_wait(false);
        assert_eq!(
            options.queues,
            Some(vec!["emails".to_string(), "reports".to_string()])
        );
        assert!(!options.wait);
    }
}
