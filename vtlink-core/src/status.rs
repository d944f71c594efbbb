//! The VT status message snapshot.
//!
//! The server broadcasts its status cyclically; the client keeps the last
//! snapshot and uses its arrival time to detect a vanished server.

use bitflags::bitflags;

bitflags! {
    /// Busy codes from byte 6 of the VT status message.
    ///
    /// Bit 5 is reserved; unknown bits are retained as received.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BusyFlags: u8 {
        const UPDATING_VISIBLE_MASK = 0x01;
        const SAVING_DATA = 0x02;
        const EXECUTING_COMMAND = 0x04;
        const EXECUTING_MACRO = 0x08;
        const PARSING_OBJECT_POOL = 0x10;
        const AUX_CONTROLS_LEARN_MODE = 0x40;
        const OUT_OF_MEMORY = 0x80;

        const _ = !0;
    }
}

/// The last VT status message received from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtStatus {
    /// Client-clock timestamp of the last status message.
    pub last_seen_ms: u64,
    /// Source address of the currently active working set master.
    pub active_working_set_master_address: u8,
    /// Object ID of the data mask currently displayed.
    pub active_data_mask_id: u16,
    /// Object ID of the soft key mask currently displayed.
    pub active_softkey_mask_id: u16,
    /// The server's busy codes.
    pub busy_flags: BusyFlags,
    /// Function code of the command the server is currently executing.
    pub current_command_function: u8,
}
