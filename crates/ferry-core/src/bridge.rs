//! Call bridge: one request in, one settlement out.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::message::{CallRequest, TransferBuf, UnitReply};
use crate::unit::UnitHandle;

/// Generic failure signal for a settled call.
///
/// Every failure cause — task error, task panic, detached transfer buffer,
/// stopped unit — collapses to this value. Causes are logged inside the
/// unit or the bridge, not carried to the caller, so rejection only means
/// "the call did not produce a result".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the call did not produce a result")]
pub struct CallFailed;

/// Single-settlement handle to a call's outcome.
///
/// Settles exactly once: fulfilled with the unit's first reply, failed on
/// the unit's first error event. Await it from async code, or block with
/// [`CallPromise::wait`]. There is no timeout; a unit that never replies
/// leaves the promise pending.
#[derive(Debug)]
pub struct CallPromise {
    reply: oneshot::Receiver<UnitReply>,
}

impl CallPromise {
    /// Block the current thread until the call settles.
    pub fn wait(self) -> std::result::Result<Value, CallFailed> {
        settle(self.reply.blocking_recv())
    }
}

impl Future for CallPromise {
    type Output = std::result::Result<Value, CallFailed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.reply).poll(cx).map(settle)
    }
}

fn settle(
    reply: std::result::Result<UnitReply, oneshot::error::RecvError>,
) -> std::result::Result<Value, CallFailed> {
    match reply {
        Ok(UnitReply::Output { value }) => Ok(value),
        Ok(UnitReply::Failed) => Err(CallFailed),
        // The reply channel closed without a reply: the unit was stopped
        // or never delivered a result.
        Err(_) => Err(CallFailed),
    }
}

/// Send `(args, transfers)` to `unit` as one message and return the promise
/// for its reply.
///
/// The listed buffers are detached by the send: their payloads move to the
/// unit without copying and must not be referenced again. A buffer already
/// detached elsewhere is a transfer violation; the messaging layer surfaces
/// it as an error event, so the promise fails and nothing is sent.
///
/// Precondition: the unit is live. Calling on a terminated unit is
/// [`Error::UnitTerminated`](crate::Error::UnitTerminated).
pub fn call(
    unit: &UnitHandle,
    args: Vec<Value>,
    transfers: Vec<TransferBuf>,
) -> Result<CallPromise> {
    let (tx, rx) = oneshot::channel();
    let promise = CallPromise { reply: rx };

    let mut buffers = Vec::with_capacity(transfers.len());
    for (index, mut buf) in transfers.into_iter().enumerate() {
        match buf.take() {
            Some(payload) => buffers.push(payload),
            None => {
                tracing::warn!(
                    unit = %unit.tag(),
                    index,
                    "transfer violation: buffer already detached"
                );
                drop(tx);
                return Ok(promise);
            }
        }
    }

    tracing::trace!(
        unit = %unit.tag(),
        args = args.len(),
        buffers = buffers.len(),
        "dispatching call"
    );

    unit.send(CallRequest {
        args,
        buffers,
        reply: tx,
    })?;

    Ok(promise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::task::{TaskInput, task};
    use crate::unit::{UnitTag, synthesize};
    use serde_json::json;

    fn spawn_unit(task_fn: crate::task::TaskFn) -> UnitHandle {
        UnitHandle::spawn(UnitTag::generate(), synthesize(task_fn)).unwrap()
    }

    #[test]
    fn test_call_resolves_with_task_value() {
        let unit = spawn_unit(task(|input: TaskInput| {
            let a = input.args[0].as_i64().unwrap_or(0);
            let b = input.args[1].as_i64().unwrap_or(0);
            Ok(Value::from(a + b))
        }));

        let promise = call(&unit, vec![json!(3), json!(4)], Vec::new()).unwrap();
        assert_eq!(promise.wait().unwrap(), json!(7));
    }

    #[test]
    fn test_failing_task_rejects_promise() {
        let unit = spawn_unit(task(|_| Err("boom".into())));
        let promise = call(&unit, Vec::new(), Vec::new()).unwrap();
        assert_eq!(promise.wait(), Err(CallFailed));
    }

    #[test]
    fn test_panicking_task_rejects_promise() {
        let unit = spawn_unit(task(|_| panic!("boom")));
        let promise = call(&unit, Vec::new(), Vec::new()).unwrap();
        assert_eq!(promise.wait(), Err(CallFailed));
    }

    #[test]
    fn test_detached_buffer_rejects_promise() {
        let unit = spawn_unit(task(|_| Ok(Value::Null)));

        let mut buf = TransferBuf::new(vec![1, 2, 3]);
        buf.take();

        let promise = call(&unit, Vec::new(), vec![buf]).unwrap();
        assert_eq!(promise.wait(), Err(CallFailed));
    }

    #[test]
    fn test_call_on_terminated_unit_is_an_error() {
        let mut unit = spawn_unit(task(|_| Ok(Value::Null)));
        unit.terminate();

        let result = call(&unit, Vec::new(), Vec::new());
        assert!(matches!(result, Err(Error::UnitTerminated)));
    }

    #[test]
    fn test_buffers_arrive_by_transfer() {
        let unit = spawn_unit(task(|input: TaskInput| {
            let total: u64 = input
                .buffers
                .iter()
                .flat_map(|b| b.iter())
                .map(|&b| u64::from(b))
                .sum();
            Ok(Value::from(total))
        }));

        let buf = TransferBuf::new(vec![1, 2, 3, 4]);
        let promise = call(&unit, Vec::new(), vec![buf]).unwrap();
        assert_eq!(promise.wait().unwrap(), json!(10));
    }
}
