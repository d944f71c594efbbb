//! Byte-exact encode/decode of VT messages.
//!
//! [`Command`] covers every outbound message the client can produce,
//! [`Event`] every inbound message it recognizes. Both are closed tagged
//! enums whose encodings follow ISO 11783-6: the first byte is the
//! function code, multi-byte integers are little-endian, reserved bytes in
//! fixed layouts are 0xFF, and variable-length messages that fall short of
//! a full frame are zero-padded by the sender.
//!
//! Encoding and decoding are inverses: `decode(encode(x)) == x` for every
//! command and event, which the tests lean on heavily.

pub mod command;
pub mod event;

pub use command::{Command, GraphicsContextCommand};
pub use event::{Event, KeyEvent, PointingEvent, SelectInputEvent};

use crate::error::VtError;

/// A CAN frame carries at most this many payload bytes; anything longer
/// goes through the transport protocol.
pub const FRAME_LENGTH: usize = 8;

// ── Cursor ───────────────────────────────────────────────────────

/// Sequential reader over a received message, with typed truncation errors.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    function: u8,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8], function: u8) -> Self {
        Self {
            data,
            pos: 0,
            function,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], VtError> {
        if self.data.len() < self.pos + n {
            return Err(VtError::TruncatedMessage {
                function: self.function,
                expected: self.pos + n,
                actual: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, VtError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, VtError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn i16(&mut self) -> Result<i16, VtError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, VtError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn f32(&mut self) -> Result<f32, VtError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<Vec<u8>, VtError> {
        Ok(self.take(n)?.to_vec())
    }
}

/// Zero-pad a short payload up to the 8-byte frame length.
///
/// Fixed layouts are already full frames; this only touches the
/// variable-length messages (string values, short draw-text payloads).
pub(crate) fn pad_to_frame(mut payload: Vec<u8>) -> Vec<u8> {
    while payload.len() < FRAME_LENGTH {
        payload.push(0x00);
    }
    payload
}
