//! Worker units: program synthesis, identity tags, and live handles.
//!
//! A unit is an independently scheduled worker thread that services its
//! inbox by message passing only; no mutable state is shared with the
//! caller.

mod handle;
mod program;
mod tag;

pub use handle::UnitHandle;
pub use program::{WorkerProgram, synthesize};
pub use tag::UnitTag;
