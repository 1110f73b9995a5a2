//! Data models shared by the host integration
//!
//! Connector parameters handed to the task-queue connector, and the
//! declarative task/job/worker descriptions exchanged with the `App` entry point.

mod connection;
mod job;
mod task;

pub use connection::*;
pub use job::*;
pub use task::*;
