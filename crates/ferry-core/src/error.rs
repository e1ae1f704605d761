//! Error types for ferry-core.

use thiserror::Error;

/// Result type for ferry-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or dispatching a call.
///
/// Failures that happen inside a worker unit never surface here; they
/// collapse into the call's promise settling as failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The host could not allocate the resources backing a unit
    /// (program quota exhausted, or the unit thread failed to spawn).
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// A message was sent to a unit that has already been terminated.
    #[error("unit has been terminated")]
    UnitTerminated,

    /// The unit's inbox closed before the message was accepted.
    #[error("channel error: {0}")]
    Channel(String),
}
