//! Connection state machine states.
//!
//! The full lifecycle of a client/server session:
//!
//! ```text
//! Disconnected ──► WaitForPartnerVTStatus ──► SendWorkingSetMaster
//!       ▲                                            │
//!       │ (VT status lost)                           ▼
//!   Connected ◄── WaitForEndOfObjectPoolResponse ◄── ReadyForObjectPool
//!                        ▲                           │
//!                        │                           ▼
//!               SendEndOfObjectPool          SendGetMemory ─► … capability
//!                        ▲                   queries … ─► UploadObjectPool
//!                        └───────────────────────────────────────┘
//! ```
//!
//! Every `Send…` state emits its message and advances to the paired
//! `WaitFor…` state; every `WaitFor…` state regresses to `Failed` when the
//! response does not arrive in time. `Failed` is terminal until the client
//! is re-initialized.

use std::fmt;

/// The client's position in the connection/upload sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected and not trying to connect.
    #[default]
    Disconnected,
    /// Initialized, waiting for a VT server to announce itself.
    WaitForPartnerVTStatus,
    /// Announcing this working set on the bus.
    SendWorkingSetMaster,
    /// Waiting for at least one object pool to be registered.
    ReadyForObjectPool,
    /// Asking the server whether it can hold the pools.
    SendGetMemory,
    WaitForGetMemoryResponse,
    /// Querying soft-key geometry and counts.
    SendGetNumberSoftkeys,
    WaitForGetNumberSoftkeysResponse,
    /// Querying supported font sizes and styles.
    SendGetTextFontData,
    WaitForGetTextFontDataResponse,
    /// Querying graphic mode, screen size, and hardware features.
    SendGetHardware,
    WaitForGetHardwareResponse,
    /// Streaming pool bytes through the transport layer.
    UploadObjectPool,
    /// Telling the server the pool stream is complete.
    SendEndOfObjectPool,
    WaitForEndOfObjectPoolResponse,
    /// Steady state; the application layer is in control.
    Connected,
    /// A handshake step failed; requires re-initialization.
    Failed,
}

impl ConnectionState {
    /// `true` in the steady Connected state.
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    /// `true` in a `WaitFor…` handshake state that is bounded by the
    /// per-step response timeout. `WaitForPartnerVTStatus` is excluded:
    /// the client waits indefinitely for a server to appear.
    pub fn awaits_response(self) -> bool {
        matches!(
            self,
            ConnectionState::WaitForGetMemoryResponse
                | ConnectionState::WaitForGetNumberSoftkeysResponse
                | ConnectionState::WaitForGetTextFontDataResponse
                | ConnectionState::WaitForGetHardwareResponse
                | ConnectionState::WaitForEndOfObjectPoolResponse
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn awaits_response_covers_bounded_waits_only() {
        assert!(ConnectionState::WaitForGetMemoryResponse.awaits_response());
        assert!(ConnectionState::WaitForEndOfObjectPoolResponse.awaits_response());
        assert!(!ConnectionState::WaitForPartnerVTStatus.awaits_response());
        assert!(!ConnectionState::Connected.awaits_response());
        assert!(!ConnectionState::UploadObjectPool.awaits_response());
    }

    #[test]
    fn display_matches_debug() {
        assert_eq!(
            ConnectionState::SendGetMemory.to_string(),
            "SendGetMemory"
        );
    }
}
