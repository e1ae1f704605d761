//! Program synthesis: wrapping a task value into a worker entry.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

use crate::message::{CallRequest, UnitReply};
use crate::task::{TaskFn, TaskInput};

/// A runnable program backing a worker unit.
///
/// Cloning is cheap (the task is reference-counted), so a registered
/// program can back a spawned unit while the registration itself stays
/// revocable.
#[derive(Clone)]
pub struct WorkerProgram {
    task: TaskFn,
}

/// Wrap a task value into a program.
///
/// The program's entry services the unit's inbox: each received payload is
/// destructured into positional arguments plus transferred buffers, the
/// task is applied, and the return value is posted back as the reply.
pub fn synthesize(task: TaskFn) -> WorkerProgram {
    WorkerProgram { task }
}

impl WorkerProgram {
    /// Build the entry the unit's thread runs.
    ///
    /// The entry exits when the inbox closes. A raised stop flag suppresses
    /// the reply: the reply channel then closes unanswered, and the caller
    /// observes a failed call instead of a response from a stopped unit.
    pub(crate) fn into_entry(
        self,
        inbox: Receiver<CallRequest>,
        stop: Arc<AtomicBool>,
    ) -> impl FnOnce() + Send + 'static {
        move || {
            while let Ok(request) = inbox.recv() {
                let CallRequest {
                    args,
                    buffers,
                    reply,
                } = request;
                let input = TaskInput { args, buffers };

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.task)(input)));

                if stop.load(Ordering::SeqCst) {
                    tracing::debug!("unit stopped before reply; dropping result");
                    return;
                }

                let message = match outcome {
                    Ok(Ok(value)) => UnitReply::Output { value },
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "task failed");
                        UnitReply::Failed
                    }
                    Err(_) => {
                        tracing::warn!("task panicked");
                        UnitReply::Failed
                    }
                };

                // A closed receiver means the caller dropped the promise.
                let _ = reply.send(message);
            }
        }
    }
}
