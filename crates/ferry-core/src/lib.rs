//! Offload one-shot tasks to worker units.
//!
//! Ferry runs a caller-supplied task on a freshly spawned worker unit so
//! the calling thread stays responsive, and hands back a single-settlement
//! promise for the result. Binary buffers travel to the unit by ownership
//! transfer, never by copy.
//!
//! This crate provides:
//! - Program synthesis and revocable registration backing each unit
//! - Per-call unit lifecycle with explicit termination
//! - A call bridge correlating one request to one reply or failure
//! - Identity tags on every unit for diagnostics
//!
//! # Example
//!
//! ```
//! use ferry_core::{CallManager, TaskInput, task};
//! use serde_json::{Value, json};
//!
//! let add = task(|input: TaskInput| {
//!     let a = input.args[0].as_i64().unwrap_or(0);
//!     let b = input.args[1].as_i64().unwrap_or(0);
//!     Ok(Value::from(a + b))
//! });
//!
//! let mut manager = CallManager::new();
//! let (id, promise) = manager
//!     .start_call(add, vec![json!(3), json!(4)], Vec::new())
//!     .unwrap();
//! assert_eq!(promise.wait().unwrap(), json!(7));
//! manager.terminate(id);
//! ```

pub mod bridge;
pub mod error;
pub mod manager;
pub mod message;
pub mod store;
pub mod task;
pub mod unit;

pub use bridge::{CallFailed, CallPromise};
pub use error::{Error, Result};
pub use manager::{CallId, CallManager};
pub use message::TransferBuf;
pub use store::{ProgramId, ProgramStore, StoreLimits};
pub use task::{TaskError, TaskFn, TaskInput, task};
pub use unit::{UnitHandle, UnitTag, WorkerProgram, synthesize};
