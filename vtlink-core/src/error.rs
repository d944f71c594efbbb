//! Domain-specific error types for the VT client.
//!
//! All fallible operations return `Result<T, VtError>`.
//! No panics on bytes received from the bus — every decode error is typed.

use thiserror::Error;

use crate::state::ConnectionState;

/// The canonical error type for the VT client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VtError {
    // ── Codec Errors ─────────────────────────────────────────────
    /// The first byte of a message did not map to a known function code.
    #[error("unknown VT function code: {value:#04x}")]
    UnknownFunction { value: u8 },

    /// A graphics-context message carried an unknown sub-command byte.
    #[error("unknown graphics context sub-command: {value:#04x}")]
    UnknownSubCommand { value: u8 },

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// The message is shorter than its layout requires.
    #[error("truncated message for function {function:#04x}: need {expected} bytes, got {actual}")]
    TruncatedMessage {
        function: u8,
        expected: usize,
        actual: usize,
    },

    /// A variable-length field does not fit its length prefix.
    #[error("{field} too long: {len} bytes (max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Zoom factors are limited to the range −32.0..=32.0.
    #[error("zoom factor {0} outside -32.0..=32.0")]
    ZoomOutOfRange(f32),

    // ── Connection Errors ────────────────────────────────────────
    /// No response arrived within the wait window of a handshake step.
    #[error("no response from VT server in state {state}")]
    ProtocolTimeout { state: ConnectionState },

    /// The VT server reported insufficient memory for the object pools.
    #[error("VT server reports insufficient memory for the object pools")]
    InsufficientMemory,

    /// A pool upload was aborted by the chunk source or the transport.
    #[error("upload of object pool {pool_index} aborted")]
    UploadAborted { pool_index: u8 },

    /// The VT server rejected the end-of-object-pool message.
    #[error("object pool rejected: faulty object {object_id:#06x} (parent {parent_object_id:#06x}), error codes {error_codes:#04x}")]
    EndOfObjectPoolRejected {
        parent_object_id: u16,
        object_id: u16,
        error_codes: u8,
    },
}
