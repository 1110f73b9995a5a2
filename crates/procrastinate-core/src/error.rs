//! Error types module
//!
//! This module provides the error taxonomy of the host integration. Only
//! [`NotReady`] carries diagnostic text written by this layer; host failures
//! ([`HostConfigurationError`], [`PackageNotFoundError`]) are produced by the
//! providers and passed through untouched so the host's own error stays debuggable.
//!
//! [`ContribError`] unifies them for the `App` entry point and the ready glue.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like duplicate registrations
    Debug,
    /// Warning level - for misuse the integrator can fix
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Raised by every protected operation of the placeholder entry point.
///
/// The display form is the full diagnostic: the operation that was invoked,
/// why it is too early, and how to fix the call site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NotReady {
    operation: &'static str,
    message: String,
}

impl NotReady {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Name of the protected operation that was called.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failures reported by the host framework's configuration providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostConfigurationError {
    #[error("The connection '{0}' doesn't exist.")]
    UnknownAlias(String),

    #[error("Invalid value for setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Settings store unavailable: {0}")]
    SettingsUnavailable(String),

    #[error("No ready hook is registered under the name '{0}'")]
    UnknownHook(String),

    #[error("Invalid package metadata: {0}")]
    InvalidMetadata(String),
}

/// The package metadata provider has no distribution with this name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No package metadata was found for {name}")]
pub struct PackageNotFoundError {
    pub name: String,
}

impl PackageNotFoundError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Declarative registration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlueprintError {
    #[error("A task named '{0}' was already registered")]
    TaskAlreadyRegistered(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ContribError {
    #[error(transparent)]
    NotReady(#[from] NotReady),

    #[error(transparent)]
    HostConfiguration(#[from] HostConfigurationError),

    #[error(transparent)]
    PackageNotFound(#[from] PackageNotFoundError),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    #[error("The procrastinate app has already been marked ready")]
    AlreadyReady,

    #[error("Task queue engine error: {0}")]
    Engine(#[source] anyhow::Error),
}

impl From<anyhow::Error> for ContribError {
    fn from(err: anyhow::Error) -> Self {
        ContribError::Engine(err)
    }
}

/// Static metadata for each variant: (error_code, suggested_action, log_level).
fn contrib_error_static_metadata(
    err: &ContribError,
) -> (&'static str, Option<&'static str>, LogLevel) {
    match err {
        ContribError::NotReady(_) => (
            "APP_NOT_READY",
            Some("Move the call into a ready() hook or use PROCRASTINATE_ON_APP_READY"),
            LogLevel::Warn,
        ),
        ContribError::HostConfiguration(HostConfigurationError::UnknownAlias(_)) => (
            "UNKNOWN_CONNECTION_ALIAS",
            Some("Check the alias against the host DATABASES setting"),
            LogLevel::Error,
        ),
        ContribError::HostConfiguration(_) => (
            "HOST_CONFIGURATION_ERROR",
            Some("Check the host settings"),
            LogLevel::Error,
        ),
        ContribError::PackageNotFound(_) => (
            "PACKAGE_NOT_FOUND",
            Some("Check package_is_installed() before asking for a version"),
            LogLevel::Debug,
        ),
        ContribError::Blueprint(_) => (
            "TASK_ALREADY_REGISTERED",
            Some("Give the task a unique name or register it under a namespace"),
            LogLevel::Debug,
        ),
        ContribError::AlreadyReady => ("APP_ALREADY_READY", None, LogLevel::Warn),
        ContribError::Engine(_) => ("ENGINE_ERROR", None, LogLevel::Error),
    }
}

impl ContribError {
    /// Machine-readable error code (e.g., "APP_NOT_READY")
    pub fn error_code(&self) -> &'static str {
        contrib_error_static_metadata(self).0
    }

    /// Suggested action for the integrator
    pub fn suggested_action(&self) -> Option<&'static str> {
        contrib_error_static_metadata(self).1
    }

    /// Log level for this error
    pub fn log_level(&self) -> LogLevel {
        contrib_error_static_metadata(self).2
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, ContribError::NotReady(_))
    }
}
