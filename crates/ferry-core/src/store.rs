//! Program store: revocable registrations backing worker units.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::unit::WorkerProgram;

/// Revocable reference to a registered program.
///
/// Valid from registration until [`ProgramStore::revoke`]. The manager
/// revokes each id exactly once, when the owning call is terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramId(u64);

impl ProgramId {
    /// The raw id value, for diagnostics.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Limits applied to a program store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreLimits {
    /// Maximum number of simultaneously registered programs.
    pub max_programs: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self { max_programs: 256 }
    }
}

/// Registry of programs keyed by revocable ids.
///
/// A registration outlives the unit it backs until explicitly revoked.
/// Forgetting to revoke leaks the entry — a bookkeeping leak, not a safety
/// issue — and [`ProgramStore::live_count`] makes such leaks observable.
pub struct ProgramStore {
    programs: HashMap<u64, WorkerProgram>,
    limits: StoreLimits,
    next_id: u64,
}

impl ProgramStore {
    /// Create a store with default limits.
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    /// Create a store with explicit limits.
    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            programs: HashMap::new(),
            limits,
            next_id: 0,
        }
    }

    /// Register a program, returning its revocable id.
    ///
    /// Fails with [`Error::Allocation`] when the registration quota is
    /// exhausted.
    pub fn register(&mut self, program: WorkerProgram) -> Result<ProgramId> {
        if self.programs.len() >= self.limits.max_programs {
            return Err(Error::Allocation(format!(
                "program quota exhausted ({} live registrations)",
                self.programs.len()
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.programs.insert(id, program);
        Ok(ProgramId(id))
    }

    /// Fetch a clone of a registered program.
    pub fn fetch(&self, id: ProgramId) -> Option<WorkerProgram> {
        self.programs.get(&id.0).cloned()
    }

    /// Revoke a registration. Returns whether an entry was removed.
    pub fn revoke(&mut self, id: ProgramId) -> bool {
        let removed = self.programs.remove(&id.0).is_some();
        if !removed {
            tracing::trace!(id = id.0, "revoke of unknown program id");
        }
        removed
    }

    /// Number of live registrations.
    pub fn live_count(&self) -> usize {
        self.programs.len()
    }
}

impl Default for ProgramStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task;
    use crate::unit::synthesize;
    use serde_json::Value;

    fn noop_program() -> WorkerProgram {
        synthesize(task(|_| Ok(Value::Null)))
    }

    #[test]
    fn test_register_fetch_revoke() {
        let mut store = ProgramStore::new();
        let id = store.register(noop_program()).unwrap();
        assert_eq!(store.live_count(), 1);
        assert!(store.fetch(id).is_some());

        assert!(store.revoke(id));
        assert_eq!(store.live_count(), 0);
        assert!(store.fetch(id).is_none());
    }

    #[test]
    fn test_second_revoke_is_a_noop() {
        let mut store = ProgramStore::new();
        let id = store.register(noop_program()).unwrap();
        assert!(store.revoke(id));
        assert!(!store.revoke(id));
    }

    #[test]
    fn test_quota_exhaustion_is_allocation_failure() {
        let mut store = ProgramStore::with_limits(StoreLimits { max_programs: 1 });
        store.register(noop_program()).unwrap();

        let err = store.register(noop_program()).unwrap_err();
        assert!(matches!(err, Error::Allocation(_)));
    }

    #[test]
    fn test_revoking_frees_quota() {
        let mut store = ProgramStore::with_limits(StoreLimits { max_programs: 1 });
        let id = store.register(noop_program()).unwrap();
        store.revoke(id);
        assert!(store.register(noop_program()).is_ok());
    }
}
