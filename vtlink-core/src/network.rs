//! The network-manager seam the client consumes.
//!
//! The CAN stack itself (address claiming, frame scheduling, the ISO 11783-3
//! transport protocol) lives outside this crate. The client only needs the
//! narrow surface defined here: submit an 8-byte frame, stream a larger
//! payload through the transport layer with a pull callback, and register a
//! receive handler for a parameter group.
//!
//! Submissions are non-blocking: `send_*` returns whether the message was
//! *accepted for transmission*, and the optional completion callback fires
//! later from the network manager's context.

use std::sync::Arc;

// ── Parameter groups ─────────────────────────────────────────────

/// Frames sent by the VT server to the client.
pub const VT_TO_ECU_PGN: u32 = 0x00E600;

/// Frames sent by the client to the VT server.
pub const ECU_TO_VT_PGN: u32 = 0x00E700;

/// Broadcast parameter group announcing a working set master.
pub const WORKING_SET_MASTER_PGN: u32 = 0x00FE0D;

/// The global (broadcast) destination address.
pub const GLOBAL_ADDRESS: u8 = 0xFF;

// ── ControlFunction ──────────────────────────────────────────────

/// An address-claimed identity on the bus.
///
/// The client is handed two of these: its own (the source of every message
/// it sends) and the VT server's (its partner). Both are shared with the
/// network manager, which owns address claiming.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlFunction {
    name: u64,
    address: u8,
}

impl ControlFunction {
    pub fn new(name: u64, address: u8) -> Self {
        Self { name, address }
    }

    /// The 64-bit ISO NAME of this control function.
    pub fn name(&self) -> u64 {
        self.name
    }

    /// The claimed source address.
    pub fn address(&self) -> u8 {
        self.address
    }
}

// ── CanMessage ───────────────────────────────────────────────────

/// A received message, already reassembled by the transport layer where
/// applicable (so `data` may exceed 8 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanMessage {
    pub pgn: u32,
    pub source_address: u8,
    /// Destination address; [`GLOBAL_ADDRESS`] for broadcasts.
    pub destination_address: u8,
    pub data: Vec<u8>,
}

// ── Callback types ───────────────────────────────────────────────

/// Fired once when a queued transmission completes; the flag reports
/// whether the message made it onto the bus.
pub type TxCompleteCallback = Box<dyn FnOnce(bool) + Send>;

/// Pull callback supplying payload bytes to the transport layer on demand.
///
/// Arguments are `(invocation_count, byte_offset, bytes_requested,
/// out_buffer)`; the callback fills `out_buffer[..bytes_requested]` with
/// payload bytes starting at `byte_offset` and returns `true` on success.
/// Returning `false` aborts the transfer.
pub type DataChunkCallback = Box<dyn FnMut(u32, u32, u32, &mut [u8]) -> bool + Send>;

/// Handler invoked for every received message on a registered PGN.
pub type RxHandler = Arc<dyn Fn(&CanMessage) + Send + Sync>;

// ── NetworkManager ───────────────────────────────────────────────

/// The transmit/receive surface the VT client requires from the CAN stack.
pub trait NetworkManager: Send + Sync {
    /// Queue a single frame (up to 8 bytes) for transmission.
    ///
    /// Returns `true` if the frame was accepted for transmission. A `None`
    /// destination broadcasts to the global address.
    fn send_frame(
        &self,
        pgn: u32,
        source: &ControlFunction,
        destination: Option<&ControlFunction>,
        payload: &[u8],
        on_complete: Option<TxCompleteCallback>,
    ) -> bool;

    /// Queue a payload larger than 8 bytes through the transport protocol.
    ///
    /// The transport pulls bytes through `fetch` as frames are scheduled;
    /// `on_complete` fires when the whole payload has been sent (or the
    /// transfer failed).
    fn send_transport(
        &self,
        pgn: u32,
        source: &ControlFunction,
        destination: Option<&ControlFunction>,
        total_size: u32,
        fetch: DataChunkCallback,
        on_complete: TxCompleteCallback,
    ) -> bool;

    /// Register a handler for received messages on `pgn`.
    fn register_rx(&self, pgn: u32, handler: RxHandler);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_function_accessors() {
        let cf = ControlFunction::new(0xA0011234_5678_9ABC, 0x26);
        assert_eq!(cf.address(), 0x26);
        assert_eq!(cf.name(), 0xA0011234_5678_9ABC);
    }
}
