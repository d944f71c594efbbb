//! Inbound message decodings (VT server → client).
//!
//! `Event::decode` is the single entry point for everything arriving on
//! the VT-to-ECU parameter group. Unknown function codes surface as a
//! typed error so the receive path can discard them without failing.
//!
//! `Event::encode` produces the same layouts from the server's point of
//! view; the tests and the bus simulator are built on it.

use crate::capabilities::HardwareFeatures;
use crate::codec::{pad_to_frame, Cursor};
use crate::error::VtError;
use crate::function::Function;
use crate::status::BusyFlags;
use crate::types::{GraphicMode, KeyActivationCode};

// ── Dispatch payloads ────────────────────────────────────────────

/// A soft-key or button activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub activation: KeyActivationCode,
    /// Object ID of the key or button.
    pub object_id: u16,
    /// Object ID of the containing mask (or visible parent).
    pub parent_object_id: u16,
    pub key_number: u8,
}

/// A touch/pointer press or release on the data mask area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointingEvent {
    pub activation: KeyActivationCode,
    pub x: u16,
    pub y: u16,
}

/// An input object was selected or deselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectInputEvent {
    pub object_id: u16,
    pub selected: bool,
    pub open_for_input: bool,
}

// ── Event ────────────────────────────────────────────────────────

/// Every inbound message kind the client recognizes.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SoftKeyActivation(KeyEvent),
    ButtonActivation(KeyEvent),
    /// `touch_state` is absent (wire byte 0xFF) on version-3-and-older
    /// servers, which only report presses.
    Pointing {
        x: u16,
        y: u16,
        touch_state: Option<KeyActivationCode>,
    },
    SelectInputObject(SelectInputEvent),
    /// Input was aborted at the server (user pressed ESC).
    Esc { object_id: u16, error_code: u8 },
    ChangedNumericValue { object_id: u16, value: u32 },
    ChangedActiveMask {
        mask_object_id: u16,
        error_object_id: u16,
        error_codes: u8,
    },
    ChangedSoftKeyMask {
        mask_object_id: u16,
        soft_key_mask_object_id: u16,
        error_codes: u8,
    },
    ChangedStringValue { object_id: u16, value: Vec<u8> },
    UserLayoutHideShow { object_id: u16, shown: bool },
    AudioSignalTerminated { terminated: bool },

    // ── Handshake responses ──────────────────────────────────────
    GetMemoryResponse {
        /// Raw VT version byte reported by the server.
        version: u8,
        enough_memory: bool,
    },
    GetNumberOfSoftkeysResponse {
        x_pixels: u8,
        y_pixels: u8,
        virtual_keys: u8,
        physical_keys: u8,
    },
    GetTextFontDataResponse {
        small_sizes: u8,
        large_sizes: u8,
        styles: u8,
    },
    GetHardwareResponse {
        /// Boot time in seconds; 0xFF when unknown.
        boot_time_s: u8,
        graphic_mode: GraphicMode,
        features: HardwareFeatures,
        x_pixels: u16,
        y_pixels: u16,
    },
    EndOfObjectPoolResponse {
        success: bool,
        parent_object_id: u16,
        object_id: u16,
        error_codes: u8,
    },

    // ── Status and housekeeping ──────────────────────────────────
    VtStatus {
        working_set_master_address: u8,
        data_mask_object_id: u16,
        soft_key_mask_object_id: u16,
        busy_flags: BusyFlags,
        command_function: u8,
    },
    /// The server does not implement a function we sent.
    UnsupportedFunction { function: u8 },
}

impl Event {
    /// The function code this event arrives under.
    pub fn function(&self) -> Function {
        match self {
            Event::SoftKeyActivation(_) => Function::SoftKeyActivation,
            Event::ButtonActivation(_) => Function::ButtonActivation,
            Event::Pointing { .. } => Function::PointingEvent,
            Event::SelectInputObject(_) => Function::VtSelectInputObject,
            Event::Esc { .. } => Function::VtEsc,
            Event::ChangedNumericValue { .. } => Function::VtChangeNumericValue,
            Event::ChangedActiveMask { .. } => Function::VtChangeActiveMask,
            Event::ChangedSoftKeyMask { .. } => Function::VtChangeSoftKeyMask,
            Event::ChangedStringValue { .. } => Function::VtChangeStringValue,
            Event::UserLayoutHideShow { .. } => Function::VtOnUserLayoutHideShow,
            Event::AudioSignalTerminated { .. } => Function::VtControlAudioSignalTermination,
            Event::GetMemoryResponse { .. } => Function::GetMemory,
            Event::GetNumberOfSoftkeysResponse { .. } => Function::GetNumberOfSoftKeys,
            Event::GetTextFontDataResponse { .. } => Function::GetTextFontData,
            Event::GetHardwareResponse { .. } => Function::GetHardware,
            Event::EndOfObjectPoolResponse { .. } => Function::EndOfObjectPool,
            Event::VtStatus { .. } => Function::VtStatus,
            Event::UnsupportedFunction { .. } => Function::UnsupportedVtFunction,
        }
    }

    /// Decode an inbound message.
    pub fn decode(data: &[u8]) -> Result<Event, VtError> {
        let function_byte = *data.first().ok_or(VtError::TruncatedMessage {
            function: 0,
            expected: 1,
            actual: 0,
        })?;
        let function = Function::try_from(function_byte)?;
        let mut c = Cursor::new(&data[1..], function_byte);

        Ok(match function {
            Function::SoftKeyActivation => Event::SoftKeyActivation(decode_key_event(&mut c)?),
            Function::ButtonActivation => Event::ButtonActivation(decode_key_event(&mut c)?),
            Function::PointingEvent => {
                let x = c.u16()?;
                let y = c.u16()?;
                let raw = c.u8()?;
                let touch_state = match raw {
                    0xFF => None,
                    _ => Some(KeyActivationCode::try_from(raw)?),
                };
                Event::Pointing { x, y, touch_state }
            }
            Function::VtSelectInputObject => {
                let object_id = c.u16()?;
                let selected = c.u8()? != 0;
                let open_for_input = c.u8()? & 0x01 != 0;
                Event::SelectInputObject(SelectInputEvent {
                    object_id,
                    selected,
                    open_for_input,
                })
            }
            Function::VtEsc => Event::Esc {
                object_id: c.u16()?,
                error_code: c.u8()?,
            },
            Function::VtChangeNumericValue => {
                let object_id = c.u16()?;
                let _reserved = c.u8()?;
                Event::ChangedNumericValue {
                    object_id,
                    value: c.u32()?,
                }
            }
            Function::VtChangeActiveMask => Event::ChangedActiveMask {
                mask_object_id: c.u16()?,
                error_object_id: c.u16()?,
                error_codes: c.u8()?,
            },
            Function::VtChangeSoftKeyMask => Event::ChangedSoftKeyMask {
                mask_object_id: c.u16()?,
                soft_key_mask_object_id: c.u16()?,
                error_codes: c.u8()?,
            },
            Function::VtChangeStringValue => {
                let object_id = c.u16()?;
                let len = c.u8()? as usize;
                Event::ChangedStringValue {
                    object_id,
                    value: c.bytes(len)?,
                }
            }
            Function::VtOnUserLayoutHideShow => {
                let object_id = c.u16()?;
                let shown = c.u8()? & 0x01 != 0;
                Event::UserLayoutHideShow { object_id, shown }
            }
            Function::VtControlAudioSignalTermination => Event::AudioSignalTerminated {
                terminated: c.u8()? & 0x01 != 0,
            },
            Function::GetMemory => {
                let version = c.u8()?;
                let status = c.u8()?;
                Event::GetMemoryResponse {
                    version,
                    enough_memory: status == 0,
                }
            }
            Function::GetNumberOfSoftKeys => {
                let _reserved = c.bytes(3)?;
                Event::GetNumberOfSoftkeysResponse {
                    x_pixels: c.u8()?,
                    y_pixels: c.u8()?,
                    virtual_keys: c.u8()?,
                    physical_keys: c.u8()?,
                }
            }
            Function::GetTextFontData => {
                let _reserved = c.bytes(4)?;
                Event::GetTextFontDataResponse {
                    small_sizes: c.u8()?,
                    large_sizes: c.u8()?,
                    styles: c.u8()?,
                }
            }
            Function::GetHardware => Event::GetHardwareResponse {
                boot_time_s: c.u8()?,
                graphic_mode: GraphicMode::try_from(c.u8()?)?,
                features: HardwareFeatures::from_bits_retain(c.u8()?),
                x_pixels: c.u16()?,
                y_pixels: c.u16()?,
            },
            Function::EndOfObjectPool => {
                let error_bits = c.u8()?;
                Event::EndOfObjectPoolResponse {
                    success: error_bits & 0x01 == 0,
                    parent_object_id: c.u16()?,
                    object_id: c.u16()?,
                    error_codes: c.u8()?,
                }
            }
            Function::VtStatus => Event::VtStatus {
                working_set_master_address: c.u8()?,
                data_mask_object_id: c.u16()?,
                soft_key_mask_object_id: c.u16()?,
                busy_flags: BusyFlags::from_bits_retain(c.u8()?),
                command_function: c.u8()?,
            },
            Function::UnsupportedVtFunction => Event::UnsupportedFunction {
                function: c.u8()?,
            },
            _ => {
                return Err(VtError::UnknownVariant {
                    type_name: "Event",
                    value: function_byte as u64,
                })
            }
        })
    }

    /// Encode this event the way a server would put it on the wire.
    pub fn encode(&self) -> Result<Vec<u8>, VtError> {
        let function = self.function() as u8;
        let out = match self {
            Event::SoftKeyActivation(key) | Event::ButtonActivation(key) => {
                let [o_lo, o_hi] = key.object_id.to_le_bytes();
                let [p_lo, p_hi] = key.parent_object_id.to_le_bytes();
                vec![
                    function,
                    key.activation as u8,
                    o_lo,
                    o_hi,
                    p_lo,
                    p_hi,
                    key.key_number,
                    0xFF,
                ]
            }
            Event::Pointing { x, y, touch_state } => {
                let [x_lo, x_hi] = x.to_le_bytes();
                let [y_lo, y_hi] = y.to_le_bytes();
                let state = touch_state.map_or(0xFF, |code| code as u8);
                vec![function, x_lo, x_hi, y_lo, y_hi, state, 0xFF, 0xFF]
            }
            Event::SelectInputObject(select) => {
                let [lo, hi] = select.object_id.to_le_bytes();
                vec![
                    function,
                    lo,
                    hi,
                    u8::from(select.selected),
                    u8::from(select.open_for_input),
                    0xFF,
                    0xFF,
                    0xFF,
                ]
            }
            Event::Esc {
                object_id,
                error_code,
            } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *error_code, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Event::ChangedNumericValue { object_id, value } => {
                let [lo, hi] = object_id.to_le_bytes();
                let [v0, v1, v2, v3] = value.to_le_bytes();
                vec![function, lo, hi, 0xFF, v0, v1, v2, v3]
            }
            Event::ChangedActiveMask {
                mask_object_id,
                error_object_id,
                error_codes,
            } => {
                let [m_lo, m_hi] = mask_object_id.to_le_bytes();
                let [e_lo, e_hi] = error_object_id.to_le_bytes();
                vec![function, m_lo, m_hi, e_lo, e_hi, *error_codes, 0xFF, 0xFF]
            }
            Event::ChangedSoftKeyMask {
                mask_object_id,
                soft_key_mask_object_id,
                error_codes,
            } => {
                let [m_lo, m_hi] = mask_object_id.to_le_bytes();
                let [s_lo, s_hi] = soft_key_mask_object_id.to_le_bytes();
                vec![function, m_lo, m_hi, s_lo, s_hi, *error_codes, 0xFF, 0xFF]
            }
            Event::ChangedStringValue { object_id, value } => {
                if value.len() > u8::MAX as usize {
                    return Err(VtError::FieldTooLong {
                        field: "changed string value",
                        len: value.len(),
                        max: u8::MAX as usize,
                    });
                }
                let [lo, hi] = object_id.to_le_bytes();
                let mut out = vec![function, lo, hi, value.len() as u8];
                out.extend_from_slice(value);
                out
            }
            Event::UserLayoutHideShow { object_id, shown } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, u8::from(*shown), 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Event::AudioSignalTerminated { terminated } => {
                vec![function, u8::from(*terminated), 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Event::GetMemoryResponse {
                version,
                enough_memory,
            } => {
                vec![
                    function,
                    *version,
                    u8::from(!*enough_memory),
                    0xFF,
                    0xFF,
                    0xFF,
                    0xFF,
                    0xFF,
                ]
            }
            Event::GetNumberOfSoftkeysResponse {
                x_pixels,
                y_pixels,
                virtual_keys,
                physical_keys,
            } => {
                vec![
                    function,
                    0xFF,
                    0xFF,
                    0xFF,
                    *x_pixels,
                    *y_pixels,
                    *virtual_keys,
                    *physical_keys,
                ]
            }
            Event::GetTextFontDataResponse {
                small_sizes,
                large_sizes,
                styles,
            } => {
                vec![
                    function,
                    0xFF,
                    0xFF,
                    0xFF,
                    0xFF,
                    *small_sizes,
                    *large_sizes,
                    *styles,
                ]
            }
            Event::GetHardwareResponse {
                boot_time_s,
                graphic_mode,
                features,
                x_pixels,
                y_pixels,
            } => {
                let [x_lo, x_hi] = x_pixels.to_le_bytes();
                let [y_lo, y_hi] = y_pixels.to_le_bytes();
                vec![
                    function,
                    *boot_time_s,
                    *graphic_mode as u8,
                    features.bits(),
                    x_lo,
                    x_hi,
                    y_lo,
                    y_hi,
                ]
            }
            Event::EndOfObjectPoolResponse {
                success,
                parent_object_id,
                object_id,
                error_codes,
            } => {
                let [p_lo, p_hi] = parent_object_id.to_le_bytes();
                let [o_lo, o_hi] = object_id.to_le_bytes();
                vec![
                    function,
                    u8::from(!*success),
                    p_lo,
                    p_hi,
                    o_lo,
                    o_hi,
                    *error_codes,
                    0xFF,
                ]
            }
            Event::VtStatus {
                working_set_master_address,
                data_mask_object_id,
                soft_key_mask_object_id,
                busy_flags,
                command_function,
            } => {
                let [d_lo, d_hi] = data_mask_object_id.to_le_bytes();
                let [s_lo, s_hi] = soft_key_mask_object_id.to_le_bytes();
                vec![
                    function,
                    *working_set_master_address,
                    d_lo,
                    d_hi,
                    s_lo,
                    s_hi,
                    busy_flags.bits(),
                    *command_function,
                ]
            }
            Event::UnsupportedFunction { function: unsupported } => {
                vec![function, *unsupported, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            }
        };
        Ok(pad_to_frame(out))
    }
}

fn decode_key_event(c: &mut Cursor<'_>) -> Result<KeyEvent, VtError> {
    let activation = KeyActivationCode::try_from(c.u8()?)?;
    let object_id = c.u16()?;
    let parent_object_id = c.u16()?;
    let key_number = c.u8()?;
    Ok(KeyEvent {
        activation,
        object_id,
        parent_object_id,
        key_number,
    })
}

// ── Tests ────────────────────────────────────────────────────────
