//! Call lifecycle management: unit creation, tracking, and termination.

use std::collections::HashMap;

use serde_json::Value;

use crate::bridge::{self, CallPromise};
use crate::error::Result;
use crate::message::TransferBuf;
use crate::store::{ProgramId, ProgramStore, StoreLimits};
use crate::task::TaskFn;
use crate::unit::{UnitHandle, UnitTag, synthesize};

/// Identifier for a tracked call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(pub(crate) u64);

impl CallId {
    /// The raw id value, for diagnostics.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// One tracked call: the unit serving it and its backing registration.
struct CallSlot {
    unit: UnitHandle,
    program: ProgramId,
}

/// Owner of all live worker units.
///
/// Every call gets a brand-new unit, tracked under its own [`CallId`] until
/// that call is explicitly terminated or the manager is dropped. Completing
/// a call (success or failure) never tears its unit down on its own, so an
/// unterminated call holds its unit and program registration alive.
pub struct CallManager {
    store: ProgramStore,
    calls: HashMap<CallId, CallSlot>,
    next_call: u64,
}

impl CallManager {
    /// Create a manager with default store limits.
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    /// Create a manager with explicit store limits.
    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            store: ProgramStore::with_limits(limits),
            calls: HashMap::new(),
            next_call: 0,
        }
    }

    /// Start a call: synthesize and register a program for `task`, spawn a
    /// fresh unit bound to it, and dispatch `(args, transfers)`.
    ///
    /// Returns the call's id and the promise for its result. Fails with
    /// [`Error::Allocation`](crate::Error::Allocation) when the program
    /// quota is exhausted or the unit thread cannot be spawned; a failed
    /// start leaves nothing registered.
    pub fn start_call(
        &mut self,
        task: TaskFn,
        args: Vec<Value>,
        transfers: Vec<TransferBuf>,
    ) -> Result<(CallId, CallPromise)> {
        let program = synthesize(task);
        let program_id = self.store.register(program.clone())?;

        let unit = match UnitHandle::spawn(UnitTag::generate(), program) {
            Ok(unit) => unit,
            Err(err) => {
                self.store.revoke(program_id);
                return Err(err);
            }
        };

        let promise = match bridge::call(&unit, args, transfers) {
            Ok(promise) => promise,
            Err(err) => {
                self.store.revoke(program_id);
                return Err(err);
            }
        };

        let id = CallId(self.next_call);
        self.next_call += 1;

        tracing::debug!(call = id.0, unit = %unit.tag(), "started call");
        self.calls.insert(id, CallSlot {
            unit,
            program: program_id,
        });

        Ok((id, promise))
    }

    /// Terminate a tracked call: stop its unit and revoke its program
    /// registration.
    ///
    /// Unknown or already-terminated ids are a no-op. A promise still in
    /// flight for this call settles as failed once its unit stops.
    pub fn terminate(&mut self, id: CallId) {
        if let Some(mut slot) = self.calls.remove(&id) {
            slot.unit.terminate();
            self.store.revoke(slot.program);
            tracing::debug!(call = id.0, "terminated call");
        }
    }

    /// Terminate every tracked call.
    pub fn terminate_all(&mut self) {
        let ids: Vec<CallId> = self.calls.keys().copied().collect();
        for id in ids {
            self.terminate(id);
        }
    }

    /// Number of calls still tracked.
    pub fn live_calls(&self) -> usize {
        self.calls.len()
    }

    /// Number of live program registrations, for leak inspection.
    pub fn live_programs(&self) -> usize {
        self.store.live_count()
    }

    /// The identity tag of a tracked call's unit, for diagnostics.
    pub fn unit_tag(&self, id: CallId) -> Option<&UnitTag> {
        self.calls.get(&id).map(|slot| slot.unit.tag())
    }
}

impl Default for CallManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallManager {
    fn drop(&mut self) {
        self.terminate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskInput, task};
    use serde_json::json;

    #[test]
    fn test_each_call_gets_its_own_unit() {
        let mut manager = CallManager::new();
        let echo = task(|input: TaskInput| Ok(input.args[0].clone()));

        let (first, _) = manager
            .start_call(echo.clone(), vec![json!(1)], Vec::new())
            .unwrap();
        let (second, _) = manager.start_call(echo, vec![json!(2)], Vec::new()).unwrap();

        assert_ne!(first, second);
        assert_ne!(manager.unit_tag(first), manager.unit_tag(second));
        assert_eq!(manager.live_calls(), 2);
        assert_eq!(manager.live_programs(), 2);
    }

    #[test]
    fn test_failed_start_registers_nothing() {
        let mut manager = CallManager::with_limits(StoreLimits { max_programs: 0 });
        let result = manager.start_call(task(|_| Ok(Value::Null)), Vec::new(), Vec::new());
        assert!(result.is_err());
        assert_eq!(manager.live_programs(), 0);
        assert_eq!(manager.live_calls(), 0);
    }

    #[test]
    fn test_terminate_unknown_id_is_a_noop() {
        let mut manager = CallManager::new();
        manager.terminate(CallId(42));
        assert_eq!(manager.live_calls(), 0);
    }
}
