//! Live handles to spawned worker units.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::message::CallRequest;

use super::program::WorkerProgram;
use super::tag::UnitTag;

/// Handle to a live worker unit.
///
/// Owned exclusively by the lifecycle manager: created per call, destroyed
/// only via explicit termination or drop. A unit that has answered its call
/// stays live (idle on its inbox) until terminated.
pub struct UnitHandle {
    /// Identity tag, for diagnostics.
    tag: UnitTag,
    /// Inbox sender. `None` once terminated.
    inbox: Option<Sender<CallRequest>>,
    /// Raised on termination; a stopped unit never posts its reply.
    stop: Arc<AtomicBool>,
    /// The unit's thread. Detached on termination if still busy.
    join: Option<JoinHandle<()>>,
    /// Whether [`UnitHandle::terminate`] has run.
    terminated: bool,
}

impl UnitHandle {
    /// Spawn a new unit running `program` on its own thread.
    ///
    /// Thread spawn failure is an allocation failure: the host could not
    /// create the execution context backing the unit.
    pub fn spawn(tag: UnitTag, program: WorkerProgram) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let entry = program.into_entry(rx, stop.clone());

        let join = thread::Builder::new()
            .name(format!("ferry-unit-{tag}"))
            .spawn(entry)
            .map_err(|e| Error::Allocation(format!("failed to spawn unit thread: {}", e)))?;

        tracing::debug!(unit = %tag, "spawned worker unit");

        Ok(Self {
            tag,
            inbox: Some(tx),
            stop,
            join: Some(join),
            terminated: false,
        })
    }

    /// Send one request into the unit's inbox.
    pub(crate) fn send(&self, request: CallRequest) -> Result<()> {
        let inbox = self.inbox.as_ref().ok_or(Error::UnitTerminated)?;
        inbox
            .send(request)
            .map_err(|_| Error::Channel("unit inbox closed".to_string()))
    }

    /// Identity tag, for diagnostics.
    pub fn tag(&self) -> &UnitTag {
        &self.tag
    }

    /// Whether the unit has not been terminated.
    ///
    /// Answering a call does not end a unit's life; only termination does.
    pub fn is_live(&self) -> bool {
        !self.terminated
    }

    /// Stop the unit: raise its stop flag and close its inbox.
    ///
    /// Idempotent. An idle unit exits immediately; a unit still executing
    /// its task keeps running until the task returns, then exits without
    /// posting the reply, so the call's promise settles as failed.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.stop.store(true, Ordering::SeqCst);
        self.inbox = None;

        if let Some(join) = self.join.take() {
            if join.is_finished() {
                let _ = join.join();
            }
            // A busy thread is detached; it exits after its current task.
        }

        tracing::debug!(unit = %self.tag, "terminated worker unit");
    }
}

impl Drop for UnitHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task;
    use crate::unit::synthesize;
    use serde_json::Value;

    fn idle_unit() -> UnitHandle {
        let program = synthesize(task(|_| Ok(Value::Null)));
        UnitHandle::spawn(UnitTag::generate(), program).unwrap()
    }

    #[test]
    fn test_spawned_unit_is_live() {
        let unit = idle_unit();
        assert!(unit.is_live());
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut unit = idle_unit();
        unit.terminate();
        assert!(!unit.is_live());
        unit.terminate();
        assert!(!unit.is_live());
    }

    #[test]
    fn test_thread_carries_unit_tag_name() {
        let program = synthesize(task(|_| {
            let name = thread::current().name().unwrap_or_default().to_string();
            Ok(Value::from(name))
        }));
        let unit = UnitHandle::spawn(UnitTag::generate(), program).unwrap();
        let expected = format!("ferry-unit-{}", unit.tag());

        let promise = crate::bridge::call(&unit, Vec::new(), Vec::new()).unwrap();
        assert_eq!(promise.wait().unwrap(), Value::from(expected));
    }
}
