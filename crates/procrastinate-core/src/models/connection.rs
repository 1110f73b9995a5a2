use serde_json::{Map, Value};

/// Keyword parameters for the task-queue connector constructor, keyed by
/// parameter name.
pub type ConnectorParams = Map<String, Value>;
