//! Task values: the unit of work a caller hands off to a worker unit.

use std::sync::Arc;

use serde_json::Value;

/// Error a task may fail with.
///
/// The cause is logged inside the worker unit and then collapsed to a
/// generic failure before it reaches the caller.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// The inputs handed to a task when its unit executes it.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    /// Positional arguments, in call order.
    pub args: Vec<Value>,
    /// Payloads of the buffers transferred with the call, in list order.
    pub buffers: Vec<Vec<u8>>,
}

/// A self-contained unit of work.
///
/// The `Send + Sync + 'static` bounds keep tasks from borrowing the
/// caller's scope: everything a task needs must be owned or arrive through
/// its [`TaskInput`].
pub type TaskFn =
    Arc<dyn Fn(TaskInput) -> std::result::Result<Value, TaskError> + Send + Sync + 'static>;

/// Wrap a closure into a [`TaskFn`].
pub fn task<F>(f: F) -> TaskFn
where
    F: Fn(TaskInput) -> std::result::Result<Value, TaskError> + Send + Sync + 'static,
{
    Arc::new(f)
}
