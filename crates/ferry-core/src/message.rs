//! Message types exchanged between a caller and a worker unit.
//!
//! The contract is entirely in-process: arguments cross the boundary by
//! move, binary buffers by ownership transfer. There is no wire format.

use serde_json::Value;
use tokio::sync::oneshot;

/// A binary buffer whose ownership moves to the unit on send.
///
/// Dispatching a call detaches every buffer in its transfer list: the
/// payload moves to the unit without copying and the origin reference
/// becomes empty. Sending a buffer that was already detached is a transfer
/// violation and fails the call.
#[derive(Debug, Default)]
pub struct TransferBuf {
    payload: Option<Vec<u8>>,
}

impl TransferBuf {
    /// Wrap an owned payload.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            payload: Some(bytes),
        }
    }

    /// Copy a slice into a fresh buffer.
    ///
    /// Transfer is an optimization, not a value-altering transform; a
    /// copied buffer produces the same result as a transferred one.
    pub fn copied(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Detach and return the payload, leaving the buffer empty.
    pub fn take(&mut self) -> Option<Vec<u8>> {
        self.payload.take()
    }

    /// Whether the payload has already been moved out.
    pub fn is_detached(&self) -> bool {
        self.payload.is_none()
    }

    /// Borrow the payload, if still attached.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

impl From<Vec<u8>> for TransferBuf {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// One request sent into a unit's inbox.
///
/// The reply sender rides along with the request, so request/response
/// correlation never depends on unit identity.
pub(crate) struct CallRequest {
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Detached buffer payloads, in transfer-list order.
    pub buffers: Vec<Vec<u8>>,
    /// Channel for the unit's single terminal reply.
    pub reply: oneshot::Sender<UnitReply>,
}

/// The single terminal event a unit posts for a request.
#[derive(Debug)]
pub(crate) enum UnitReply {
    /// The task produced a value.
    Output { value: Value },
    /// The task failed. No cause is carried across the boundary.
    Failed,
}
