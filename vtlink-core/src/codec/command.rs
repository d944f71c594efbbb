//! Outbound command encodings (client → VT server).
//!
//! Each variant encodes to its ISO 11783-6 layout: function code first,
//! object IDs as 16-bit little-endian, reserved bytes 0xFF. Variable-length
//! commands are zero-padded up to the 8-byte frame; anything longer is
//! routed through the transport protocol by the caller.

use crate::codec::{pad_to_frame, Cursor, FRAME_LENGTH};
use crate::error::VtError;
use crate::function::{Function, GraphicsContextSubCommand};
use crate::types::{
    AlarmMaskPriority, EnableDisableState, FillType, FontSize, HideShowState, LineDirection,
    MaskLockState, MaskType, SelectInputOption, VtVersion,
};

/// Zoom factors accepted by the zoom / pan-and-zoom viewport commands.
pub const ZOOM_RANGE: std::ops::RangeInclusive<f32> = -32.0..=32.0;

// ── Command ──────────────────────────────────────────────────────

/// Every message the client can send to the VT server.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Working set / pool management ────────────────────────────
    /// Cyclic keep-alive for the working set; bit 0 of the second byte is
    /// the initiating flag, the third byte the working set version.
    WorkingSetMaintenance {
        initializing: bool,
        version: VtVersion,
    },
    /// Ask whether the server can hold `required_bytes` of object pool.
    GetMemory { required_bytes: u32 },
    GetNumberOfSoftkeys,
    GetTextFontData,
    GetHardware,
    GetSupportedWidechars,
    GetWindowMaskData,
    GetSupportedObjects,
    GetVersions,
    StoreVersion { label: [u8; 7] },
    LoadVersion { label: [u8; 7] },
    DeleteVersion { label: [u8; 7] },
    ExtendedGetVersions,
    ExtendedStoreVersion { label: [u8; 32] },
    ExtendedLoadVersion { label: [u8; 32] },
    ExtendedDeleteVersion { label: [u8; 32] },
    /// Pool bytes prefixed with the transfer multiplexor; always streamed
    /// through the transport protocol, never zero-padded.
    ObjectPoolTransfer { data: Vec<u8> },
    EndOfObjectPool,
    DeleteObjectPool,
    /// 9-byte message carrying the NAME of the desired working set master.
    SelectActiveWorkingSet { name: u64 },

    // ── Command set ──────────────────────────────────────────────
    Esc,
    HideShowObject {
        object_id: u16,
        state: HideShowState,
    },
    EnableDisableObject {
        object_id: u16,
        state: EnableDisableState,
    },
    SelectInputObject {
        object_id: u16,
        option: SelectInputOption,
    },
    ControlAudioSignal {
        activations: u8,
        frequency_hz: u16,
        duration_ms: u16,
        off_time_ms: u16,
    },
    SetAudioVolume { volume_percent: u8 },
    /// Relative move; the wire bytes carry a −127 bias, so byte 255 means
    /// +128 px and byte 0 means −127 px.
    ChangeChildLocation {
        object_id: u16,
        parent_object_id: u16,
        relative_x: u8,
        relative_y: u8,
    },
    ChangeChildPosition {
        object_id: u16,
        parent_object_id: u16,
        x: u16,
        y: u16,
    },
    ChangeSize {
        object_id: u16,
        width: u16,
        height: u16,
    },
    ChangeBackgroundColour { object_id: u16, colour: u8 },
    ChangeNumericValue { object_id: u16, value: u32 },
    /// The string may be shorter than the target attribute; the server
    /// right-pads with spaces.
    ChangeStringValue { object_id: u16, value: Vec<u8> },
    ChangeEndPoint {
        object_id: u16,
        width: u16,
        height: u16,
        direction: LineDirection,
    },
    ChangeFontAttributes {
        object_id: u16,
        colour: u8,
        size: FontSize,
        font_type: u8,
        style: u8,
    },
    ChangeLineAttributes {
        object_id: u16,
        colour: u8,
        width: u8,
        line_art: u16,
    },
    ChangeFillAttributes {
        object_id: u16,
        fill_type: FillType,
        colour: u8,
        pattern_object_id: u16,
    },
    ChangeActiveMask {
        working_set_object_id: u16,
        new_mask_object_id: u16,
    },
    ChangeSoftKeyMask {
        mask_type: MaskType,
        mask_object_id: u16,
        soft_key_mask_object_id: u16,
    },
    ChangeAttribute {
        object_id: u16,
        attribute_id: u8,
        value: u32,
    },
    ChangePriority {
        alarm_mask_object_id: u16,
        priority: AlarmMaskPriority,
    },
    ChangeListItem {
        object_id: u16,
        list_index: u8,
        new_object_id: u16,
    },
    ChangeObjectLabel {
        object_id: u16,
        label_object_id: u16,
        font_type: u8,
        graphic_object_id: u16,
    },
    ChangePolygonPoint {
        object_id: u16,
        point_index: u8,
        x: u16,
        y: u16,
    },
    ChangePolygonScale {
        object_id: u16,
        width: u16,
        height: u16,
    },
    LockUnlockMask {
        state: MaskLockState,
        object_id: u16,
        timeout_ms: u16,
    },
    ExecuteMacro { object_id: u16 },
    ExecuteExtendedMacro { object_id: u16 },
    SelectColourMap { object_id: u16 },
    GetAttributeValue { object_id: u16, attribute_id: u8 },
    /// One of the drawing-state sub-commands of a graphics context object.
    GraphicsContext {
        object_id: u16,
        sub: GraphicsContextCommand,
    },
}

// ── GraphicsContextCommand ───────────────────────────────────────

/// Sub-commands sharing the graphics context outer function code.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsContextCommand {
    SetGraphicsCursor { x: i16, y: i16 },
    MoveGraphicsCursor { dx: i16, dy: i16 },
    SetForegroundColour { colour: u8 },
    SetBackgroundColour { colour: u8 },
    SetLineAttributesObjectId { object_id: u16 },
    SetFillAttributesObjectId { object_id: u16 },
    SetFontAttributesObjectId { object_id: u16 },
    EraseRectangle { width: u16, height: u16 },
    DrawPoint { x: i16, y: i16 },
    DrawLine { x: i16, y: i16 },
    DrawRectangle { width: u16, height: u16 },
    DrawClosedEllipse { width: u16, height: u16 },
    /// Point offsets are 16-bit signed, relative to the graphics cursor.
    DrawPolygon { points: Vec<(i16, i16)> },
    DrawText { transparent: bool, text: Vec<u8> },
    PanViewport { x: i16, y: i16 },
    ZoomViewport { zoom: f32 },
    PanAndZoomViewport { x: i16, y: i16, zoom: f32 },
    ChangeViewportSize { width: u16, height: u16 },
    DrawVtObject { object_id: u16 },
    CopyCanvasToPictureGraphic { object_id: u16 },
    CopyViewportToPictureGraphic { object_id: u16 },
}

impl GraphicsContextCommand {
    /// The sub-command byte for this variant.
    pub fn sub_command(&self) -> GraphicsContextSubCommand {
        use GraphicsContextSubCommand as Sub;
        match self {
            Self::SetGraphicsCursor { .. } => Sub::SetGraphicsCursor,
            Self::MoveGraphicsCursor { .. } => Sub::MoveGraphicsCursor,
            Self::SetForegroundColour { .. } => Sub::SetForegroundColour,
            Self::SetBackgroundColour { .. } => Sub::SetBackgroundColour,
            Self::SetLineAttributesObjectId { .. } => Sub::SetLineAttributesObjectId,
            Self::SetFillAttributesObjectId { .. } => Sub::SetFillAttributesObjectId,
            Self::SetFontAttributesObjectId { .. } => Sub::SetFontAttributesObjectId,
            Self::EraseRectangle { .. } => Sub::EraseRectangle,
            Self::DrawPoint { .. } => Sub::DrawPoint,
            Self::DrawLine { .. } => Sub::DrawLine,
            Self::DrawRectangle { .. } => Sub::DrawRectangle,
            Self::DrawClosedEllipse { .. } => Sub::DrawClosedEllipse,
            Self::DrawPolygon { .. } => Sub::DrawPolygon,
            Self::DrawText { .. } => Sub::DrawText,
            Self::PanViewport { .. } => Sub::PanViewport,
            Self::ZoomViewport { .. } => Sub::ZoomViewport,
            Self::PanAndZoomViewport { .. } => Sub::PanAndZoomViewport,
            Self::ChangeViewportSize { .. } => Sub::ChangeViewportSize,
            Self::DrawVtObject { .. } => Sub::DrawVtObject,
            Self::CopyCanvasToPictureGraphic { .. } => Sub::CopyCanvasToPictureGraphic,
            Self::CopyViewportToPictureGraphic { .. } => Sub::CopyViewportToPictureGraphic,
        }
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<(), VtError> {
        match self {
            Self::SetGraphicsCursor { x, y } | Self::PanViewport { x, y } => {
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            Self::MoveGraphicsCursor { dx, dy } => {
                out.extend_from_slice(&dx.to_le_bytes());
                out.extend_from_slice(&dy.to_le_bytes());
            }
            Self::DrawPoint { x, y } | Self::DrawLine { x, y } => {
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            Self::SetForegroundColour { colour } | Self::SetBackgroundColour { colour } => {
                out.extend_from_slice(&[*colour, 0xFF, 0xFF, 0xFF]);
            }
            Self::SetLineAttributesObjectId { object_id }
            | Self::SetFillAttributesObjectId { object_id }
            | Self::SetFontAttributesObjectId { object_id }
            | Self::DrawVtObject { object_id }
            | Self::CopyCanvasToPictureGraphic { object_id }
            | Self::CopyViewportToPictureGraphic { object_id } => {
                out.extend_from_slice(&object_id.to_le_bytes());
                out.extend_from_slice(&[0xFF, 0xFF]);
            }
            Self::EraseRectangle { width, height }
            | Self::DrawRectangle { width, height }
            | Self::DrawClosedEllipse { width, height }
            | Self::ChangeViewportSize { width, height } => {
                out.extend_from_slice(&width.to_le_bytes());
                out.extend_from_slice(&height.to_le_bytes());
            }
            Self::DrawPolygon { points } => {
                if points.len() > u8::MAX as usize {
                    return Err(VtError::FieldTooLong {
                        field: "polygon point list",
                        len: points.len(),
                        max: u8::MAX as usize,
                    });
                }
                out.push(points.len() as u8);
                for (x, y) in points {
                    out.extend_from_slice(&x.to_le_bytes());
                    out.extend_from_slice(&y.to_le_bytes());
                }
            }
            Self::DrawText { transparent, text } => {
                if text.len() > u8::MAX as usize {
                    return Err(VtError::FieldTooLong {
                        field: "draw text value",
                        len: text.len(),
                        max: u8::MAX as usize,
                    });
                }
                out.push(u8::from(*transparent));
                out.push(text.len() as u8);
                out.extend_from_slice(text);
            }
            Self::ZoomViewport { zoom } => {
                check_zoom(*zoom)?;
                out.extend_from_slice(&zoom.to_le_bytes());
            }
            Self::PanAndZoomViewport { x, y, zoom } => {
                check_zoom(*zoom)?;
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
                out.extend_from_slice(&zoom.to_le_bytes());
            }
        }
        Ok(())
    }

    fn decode_payload(
        sub: GraphicsContextSubCommand,
        cursor: &mut Cursor<'_>,
    ) -> Result<Self, VtError> {
        use GraphicsContextSubCommand as Sub;
        Ok(match sub {
            Sub::SetGraphicsCursor => Self::SetGraphicsCursor {
                x: cursor.i16()?,
                y: cursor.i16()?,
            },
            Sub::MoveGraphicsCursor => Self::MoveGraphicsCursor {
                dx: cursor.i16()?,
                dy: cursor.i16()?,
            },
            Sub::SetForegroundColour => Self::SetForegroundColour {
                colour: cursor.u8()?,
            },
            Sub::SetBackgroundColour => Self::SetBackgroundColour {
                colour: cursor.u8()?,
            },
            Sub::SetLineAttributesObjectId => Self::SetLineAttributesObjectId {
                object_id: cursor.u16()?,
            },
            Sub::SetFillAttributesObjectId => Self::SetFillAttributesObjectId {
                object_id: cursor.u16()?,
            },
            Sub::SetFontAttributesObjectId => Self::SetFontAttributesObjectId {
                object_id: cursor.u16()?,
            },
            Sub::EraseRectangle => Self::EraseRectangle {
                width: cursor.u16()?,
                height: cursor.u16()?,
            },
            Sub::DrawPoint => Self::DrawPoint {
                x: cursor.i16()?,
                y: cursor.i16()?,
            },
            Sub::DrawLine => Self::DrawLine {
                x: cursor.i16()?,
                y: cursor.i16()?,
            },
            Sub::DrawRectangle => Self::DrawRectangle {
                width: cursor.u16()?,
                height: cursor.u16()?,
            },
            Sub::DrawClosedEllipse => Self::DrawClosedEllipse {
                width: cursor.u16()?,
                height: cursor.u16()?,
            },
            Sub::DrawPolygon => {
                let count = cursor.u8()? as usize;
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    points.push((cursor.i16()?, cursor.i16()?));
                }
                Self::DrawPolygon { points }
            }
            Sub::DrawText => {
                let transparent = cursor.u8()? != 0;
                let len = cursor.u8()? as usize;
                Self::DrawText {
                    transparent,
                    text: cursor.bytes(len)?,
                }
            }
            Sub::PanViewport => Self::PanViewport {
                x: cursor.i16()?,
                y: cursor.i16()?,
            },
            Sub::ZoomViewport => Self::ZoomViewport { zoom: cursor.f32()? },
            Sub::PanAndZoomViewport => Self::PanAndZoomViewport {
                x: cursor.i16()?,
                y: cursor.i16()?,
                zoom: cursor.f32()?,
            },
            Sub::ChangeViewportSize => Self::ChangeViewportSize {
                width: cursor.u16()?,
                height: cursor.u16()?,
            },
            Sub::DrawVtObject => Self::DrawVtObject {
                object_id: cursor.u16()?,
            },
            Sub::CopyCanvasToPictureGraphic => Self::CopyCanvasToPictureGraphic {
                object_id: cursor.u16()?,
            },
            Sub::CopyViewportToPictureGraphic => Self::CopyViewportToPictureGraphic {
                object_id: cursor.u16()?,
            },
        })
    }
}

fn check_zoom(zoom: f32) -> Result<(), VtError> {
    if !zoom.is_finite() || !ZOOM_RANGE.contains(&zoom) {
        return Err(VtError::ZoomOutOfRange(zoom));
    }
    Ok(())
}

// ── Encoding ─────────────────────────────────────────────────────

impl Command {
    /// The function code this command is sent under.
    pub fn function(&self) -> Function {
        match self {
            Command::WorkingSetMaintenance { .. } => Function::WorkingSetMaintenance,
            Command::GetMemory { .. } => Function::GetMemory,
            Command::GetNumberOfSoftkeys => Function::GetNumberOfSoftKeys,
            Command::GetTextFontData => Function::GetTextFontData,
            Command::GetHardware => Function::GetHardware,
            Command::GetSupportedWidechars => Function::GetSupportedWidechars,
            Command::GetWindowMaskData => Function::GetWindowMaskData,
            Command::GetSupportedObjects => Function::GetSupportedObjects,
            Command::GetVersions => Function::GetVersions,
            Command::StoreVersion { .. } => Function::StoreVersion,
            Command::LoadVersion { .. } => Function::LoadVersion,
            Command::DeleteVersion { .. } => Function::DeleteVersion,
            Command::ExtendedGetVersions => Function::ExtendedGetVersions,
            Command::ExtendedStoreVersion { .. } => Function::ExtendedStoreVersion,
            Command::ExtendedLoadVersion { .. } => Function::ExtendedLoadVersion,
            Command::ExtendedDeleteVersion { .. } => Function::ExtendedDeleteVersion,
            Command::ObjectPoolTransfer { .. } => Function::ObjectPoolTransfer,
            Command::EndOfObjectPool => Function::EndOfObjectPool,
            Command::DeleteObjectPool => Function::DeleteObjectPool,
            Command::SelectActiveWorkingSet { .. } => Function::SelectActiveWorkingSet,
            Command::Esc => Function::EscCommand,
            Command::HideShowObject { .. } => Function::HideShowObject,
            Command::EnableDisableObject { .. } => Function::EnableDisableObject,
            Command::SelectInputObject { .. } => Function::SelectInputObject,
            Command::ControlAudioSignal { .. } => Function::ControlAudioSignal,
            Command::SetAudioVolume { .. } => Function::SetAudioVolume,
            Command::ChangeChildLocation { .. } => Function::ChangeChildLocation,
            Command::ChangeChildPosition { .. } => Function::ChangeChildPosition,
            Command::ChangeSize { .. } => Function::ChangeSize,
            Command::ChangeBackgroundColour { .. } => Function::ChangeBackgroundColour,
            Command::ChangeNumericValue { .. } => Function::ChangeNumericValue,
            Command::ChangeStringValue { .. } => Function::ChangeStringValue,
            Command::ChangeEndPoint { .. } => Function::ChangeEndPoint,
            Command::ChangeFontAttributes { .. } => Function::ChangeFontAttributes,
            Command::ChangeLineAttributes { .. } => Function::ChangeLineAttributes,
            Command::ChangeFillAttributes { .. } => Function::ChangeFillAttributes,
            Command::ChangeActiveMask { .. } => Function::ChangeActiveMask,
            Command::ChangeSoftKeyMask { .. } => Function::ChangeSoftKeyMask,
            Command::ChangeAttribute { .. } => Function::ChangeAttribute,
            Command::ChangePriority { .. } => Function::ChangePriority,
            Command::ChangeListItem { .. } => Function::ChangeListItem,
            Command::ChangeObjectLabel { .. } => Function::ChangeObjectLabel,
            Command::ChangePolygonPoint { .. } => Function::ChangePolygonPoint,
            Command::ChangePolygonScale { .. } => Function::ChangePolygonScale,
            Command::LockUnlockMask { .. } => Function::LockUnlockMask,
            Command::ExecuteMacro { .. } => Function::ExecuteMacro,
            Command::ExecuteExtendedMacro { .. } => Function::ExecuteExtendedMacro,
            Command::SelectColourMap { .. } => Function::SelectColourMap,
            Command::GetAttributeValue { .. } => Function::GetAttributeValue,
            Command::GraphicsContext { .. } => Function::GraphicsContext,
        }
    }

    /// Encode to wire bytes.
    ///
    /// The result is a full 8-byte frame for everything that fits one, or
    /// the transport payload for longer commands. [`Command::ObjectPoolTransfer`]
    /// is never padded; it always travels through the transport protocol.
    pub fn encode(&self) -> Result<Vec<u8>, VtError> {
        let function = self.function() as u8;
        let out = match self {
            Command::WorkingSetMaintenance {
                initializing,
                version,
            } => {
                vec![
                    function,
                    u8::from(*initializing),
                    version.to_maintenance_byte(),
                    0xFF,
                    0xFF,
                    0xFF,
                    0xFF,
                    0xFF,
                ]
            }
            Command::GetMemory { required_bytes } => {
                let [s0, s1, s2, s3] = required_bytes.to_le_bytes();
                vec![function, 0xFF, s0, s1, s2, s3, 0xFF, 0xFF]
            }
            Command::GetNumberOfSoftkeys
            | Command::GetTextFontData
            | Command::GetHardware
            | Command::GetSupportedWidechars
            | Command::GetWindowMaskData
            | Command::GetSupportedObjects
            | Command::GetVersions
            | Command::ExtendedGetVersions
            | Command::EndOfObjectPool
            | Command::DeleteObjectPool
            | Command::Esc => {
                vec![function, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::StoreVersion { label }
            | Command::LoadVersion { label }
            | Command::DeleteVersion { label } => {
                let mut out = vec![function];
                out.extend_from_slice(label);
                out
            }
            Command::ExtendedStoreVersion { label }
            | Command::ExtendedLoadVersion { label }
            | Command::ExtendedDeleteVersion { label } => {
                let mut out = vec![function];
                out.extend_from_slice(label);
                out
            }
            Command::ObjectPoolTransfer { data } => {
                let mut out = Vec::with_capacity(1 + data.len());
                out.push(function);
                out.extend_from_slice(data);
                return Ok(out);
            }
            Command::SelectActiveWorkingSet { name } => {
                let mut out = vec![function];
                out.extend_from_slice(&name.to_le_bytes());
                out
            }
            Command::HideShowObject { object_id, state } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *state as u8, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::EnableDisableObject { object_id, state } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *state as u8, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::SelectInputObject { object_id, option } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *option as u8, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::ControlAudioSignal {
                activations,
                frequency_hz,
                duration_ms,
                off_time_ms,
            } => {
                let [f_lo, f_hi] = frequency_hz.to_le_bytes();
                let [d_lo, d_hi] = duration_ms.to_le_bytes();
                let [o_lo, o_hi] = off_time_ms.to_le_bytes();
                vec![function, *activations, f_lo, f_hi, d_lo, d_hi, o_lo, o_hi]
            }
            Command::SetAudioVolume { volume_percent } => {
                vec![function, *volume_percent, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::ChangeChildLocation {
                object_id,
                parent_object_id,
                relative_x,
                relative_y,
            } => {
                let [p_lo, p_hi] = parent_object_id.to_le_bytes();
                let [o_lo, o_hi] = object_id.to_le_bytes();
                vec![function, p_lo, p_hi, o_lo, o_hi, *relative_x, *relative_y, 0xFF]
            }
            Command::ChangeChildPosition {
                object_id,
                parent_object_id,
                x,
                y,
            } => {
                let [p_lo, p_hi] = parent_object_id.to_le_bytes();
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [x_lo, x_hi] = x.to_le_bytes();
                let [y_lo, y_hi] = y.to_le_bytes();
                vec![function, p_lo, p_hi, o_lo, o_hi, x_lo, x_hi, y_lo, y_hi]
            }
            Command::ChangeSize {
                object_id,
                width,
                height,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [w_lo, w_hi] = width.to_le_bytes();
                let [h_lo, h_hi] = height.to_le_bytes();
                vec![function, o_lo, o_hi, w_lo, w_hi, h_lo, h_hi, 0xFF]
            }
            Command::ChangeBackgroundColour { object_id, colour } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *colour, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::ChangeNumericValue { object_id, value } => {
                let [lo, hi] = object_id.to_le_bytes();
                let [v0, v1, v2, v3] = value.to_le_bytes();
                vec![function, lo, hi, 0xFF, v0, v1, v2, v3]
            }
            Command::ChangeStringValue { object_id, value } => {
                if value.len() > u16::MAX as usize {
                    return Err(VtError::FieldTooLong {
                        field: "string value",
                        len: value.len(),
                        max: u16::MAX as usize,
                    });
                }
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [l_lo, l_hi] = (value.len() as u16).to_le_bytes();
                let mut out = vec![function, o_lo, o_hi, l_lo, l_hi];
                out.extend_from_slice(value);
                out
            }
            Command::ChangeEndPoint {
                object_id,
                width,
                height,
                direction,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [w_lo, w_hi] = width.to_le_bytes();
                let [h_lo, h_hi] = height.to_le_bytes();
                vec![function, o_lo, o_hi, w_lo, w_hi, h_lo, h_hi, *direction as u8]
            }
            Command::ChangeFontAttributes {
                object_id,
                colour,
                size,
                font_type,
                style,
            } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *colour, *size as u8, *font_type, *style, 0xFF]
            }
            Command::ChangeLineAttributes {
                object_id,
                colour,
                width,
                line_art,
            } => {
                let [lo, hi] = object_id.to_le_bytes();
                let [a_lo, a_hi] = line_art.to_le_bytes();
                vec![function, lo, hi, *colour, *width, a_lo, a_hi, 0xFF]
            }
            Command::ChangeFillAttributes {
                object_id,
                fill_type,
                colour,
                pattern_object_id,
            } => {
                let [lo, hi] = object_id.to_le_bytes();
                let [p_lo, p_hi] = pattern_object_id.to_le_bytes();
                vec![function, lo, hi, *fill_type as u8, *colour, p_lo, p_hi, 0xFF]
            }
            Command::ChangeActiveMask {
                working_set_object_id,
                new_mask_object_id,
            } => {
                let [w_lo, w_hi] = working_set_object_id.to_le_bytes();
                let [m_lo, m_hi] = new_mask_object_id.to_le_bytes();
                vec![function, w_lo, w_hi, m_lo, m_hi, 0xFF, 0xFF, 0xFF]
            }
            Command::ChangeSoftKeyMask {
                mask_type,
                mask_object_id,
                soft_key_mask_object_id,
            } => {
                let [d_lo, d_hi] = mask_object_id.to_le_bytes();
                let [s_lo, s_hi] = soft_key_mask_object_id.to_le_bytes();
                vec![function, *mask_type as u8, d_lo, d_hi, s_lo, s_hi, 0xFF, 0xFF]
            }
            Command::ChangeAttribute {
                object_id,
                attribute_id,
                value,
            } => {
                let [lo, hi] = object_id.to_le_bytes();
                let [v0, v1, v2, v3] = value.to_le_bytes();
                vec![function, lo, hi, *attribute_id, v0, v1, v2, v3]
            }
            Command::ChangePriority {
                alarm_mask_object_id,
                priority,
            } => {
                let [lo, hi] = alarm_mask_object_id.to_le_bytes();
                vec![function, lo, hi, *priority as u8, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::ChangeListItem {
                object_id,
                list_index,
                new_object_id,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [n_lo, n_hi] = new_object_id.to_le_bytes();
                vec![function, o_lo, o_hi, *list_index, n_lo, n_hi, 0xFF, 0xFF]
            }
            Command::ChangeObjectLabel {
                object_id,
                label_object_id,
                font_type,
                graphic_object_id,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [l_lo, l_hi] = label_object_id.to_le_bytes();
                let [g_lo, g_hi] = graphic_object_id.to_le_bytes();
                vec![function, o_lo, o_hi, l_lo, l_hi, *font_type, g_lo, g_hi]
            }
            Command::ChangePolygonPoint {
                object_id,
                point_index,
                x,
                y,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [x_lo, x_hi] = x.to_le_bytes();
                let [y_lo, y_hi] = y.to_le_bytes();
                vec![function, o_lo, o_hi, *point_index, x_lo, x_hi, y_lo, y_hi]
            }
            Command::ChangePolygonScale {
                object_id,
                width,
                height,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [w_lo, w_hi] = width.to_le_bytes();
                let [h_lo, h_hi] = height.to_le_bytes();
                vec![function, o_lo, o_hi, w_lo, w_hi, h_lo, h_hi, 0xFF]
            }
            Command::LockUnlockMask {
                state,
                object_id,
                timeout_ms,
            } => {
                let [o_lo, o_hi] = object_id.to_le_bytes();
                let [t_lo, t_hi] = timeout_ms.to_le_bytes();
                vec![function, *state as u8, o_lo, o_hi, t_lo, t_hi, 0xFF, 0xFF]
            }
            Command::ExecuteMacro { object_id }
            | Command::ExecuteExtendedMacro { object_id }
            | Command::SelectColourMap { object_id } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::GetAttributeValue {
                object_id,
                attribute_id,
            } => {
                let [lo, hi] = object_id.to_le_bytes();
                vec![function, lo, hi, *attribute_id, 0xFF, 0xFF, 0xFF, 0xFF]
            }
            Command::GraphicsContext { object_id, sub } => {
                let [lo, hi] = object_id.to_le_bytes();
                let mut out = vec![function, lo, hi, sub.sub_command() as u8];
                sub.encode_payload(&mut out)?;
                out
            }
        };
        Ok(pad_to_frame(out))
    }

    /// Decode a command from wire bytes (the server-side view).
    ///
    /// Trailing padding beyond a command's layout is ignored.
    pub fn decode(data: &[u8]) -> Result<Command, VtError> {
        let function_byte = *data.first().ok_or(VtError::TruncatedMessage {
            function: 0,
            expected: 1,
            actual: 0,
        })?;
        let function = Function::try_from(function_byte)?;
        let mut c = Cursor::new(&data[1..], function_byte);

        Ok(match function {
            Function::WorkingSetMaintenance => {
                let bits = c.u8()?;
                let version = VtVersion::from_status_byte(c.u8()?);
                Command::WorkingSetMaintenance {
                    initializing: bits & 0x01 != 0,
                    version,
                }
            }
            Function::GetMemory => {
                let _reserved = c.u8()?;
                Command::GetMemory {
                    required_bytes: c.u32()?,
                }
            }
            Function::GetNumberOfSoftKeys => Command::GetNumberOfSoftkeys,
            Function::GetTextFontData => Command::GetTextFontData,
            Function::GetHardware => Command::GetHardware,
            Function::GetSupportedWidechars => Command::GetSupportedWidechars,
            Function::GetWindowMaskData => Command::GetWindowMaskData,
            Function::GetSupportedObjects => Command::GetSupportedObjects,
            Function::GetVersions => Command::GetVersions,
            Function::StoreVersion => Command::StoreVersion {
                label: c.bytes(7)?.try_into().expect("length checked by cursor"),
            },
            Function::LoadVersion => Command::LoadVersion {
                label: c.bytes(7)?.try_into().expect("length checked by cursor"),
            },
            Function::DeleteVersion => Command::DeleteVersion {
                label: c.bytes(7)?.try_into().expect("length checked by cursor"),
            },
            Function::ExtendedGetVersions => Command::ExtendedGetVersions,
            Function::ExtendedStoreVersion => Command::ExtendedStoreVersion {
                label: c.bytes(32)?.try_into().expect("length checked by cursor"),
            },
            Function::ExtendedLoadVersion => Command::ExtendedLoadVersion {
                label: c.bytes(32)?.try_into().expect("length checked by cursor"),
            },
            Function::ExtendedDeleteVersion => Command::ExtendedDeleteVersion {
                label: c.bytes(32)?.try_into().expect("length checked by cursor"),
            },
            Function::ObjectPoolTransfer => Command::ObjectPoolTransfer {
                data: data[1..].to_vec(),
            },
            Function::EndOfObjectPool => Command::EndOfObjectPool,
            Function::DeleteObjectPool => Command::DeleteObjectPool,
            Function::SelectActiveWorkingSet => {
                let b = c.bytes(8)?;
                Command::SelectActiveWorkingSet {
                    name: u64::from_le_bytes(b.try_into().expect("length checked by cursor")),
                }
            }
            Function::EscCommand => Command::Esc,
            Function::HideShowObject => Command::HideShowObject {
                object_id: c.u16()?,
                state: HideShowState::try_from(c.u8()?)?,
            },
            Function::EnableDisableObject => Command::EnableDisableObject {
                object_id: c.u16()?,
                state: EnableDisableState::try_from(c.u8()?)?,
            },
            Function::SelectInputObject => Command::SelectInputObject {
                object_id: c.u16()?,
                option: SelectInputOption::try_from(c.u8()?)?,
            },
            Function::ControlAudioSignal => Command::ControlAudioSignal {
                activations: c.u8()?,
                frequency_hz: c.u16()?,
                duration_ms: c.u16()?,
                off_time_ms: c.u16()?,
            },
            Function::SetAudioVolume => Command::SetAudioVolume {
                volume_percent: c.u8()?,
            },
            Function::ChangeChildLocation => {
                let parent_object_id = c.u16()?;
                let object_id = c.u16()?;
                Command::ChangeChildLocation {
                    object_id,
                    parent_object_id,
                    relative_x: c.u8()?,
                    relative_y: c.u8()?,
                }
            }
            Function::ChangeChildPosition => {
                let parent_object_id = c.u16()?;
                let object_id = c.u16()?;
                Command::ChangeChildPosition {
                    object_id,
                    parent_object_id,
                    x: c.u16()?,
                    y: c.u16()?,
                }
            }
            Function::ChangeSize => Command::ChangeSize {
                object_id: c.u16()?,
                width: c.u16()?,
                height: c.u16()?,
            },
            Function::ChangeBackgroundColour => Command::ChangeBackgroundColour {
                object_id: c.u16()?,
                colour: c.u8()?,
            },
            Function::ChangeNumericValue => {
                let object_id = c.u16()?;
                let _reserved = c.u8()?;
                Command::ChangeNumericValue {
                    object_id,
                    value: c.u32()?,
                }
            }
            Function::ChangeStringValue => {
                let object_id = c.u16()?;
                let len = c.u16()? as usize;
                Command::ChangeStringValue {
                    object_id,
                    value: c.bytes(len)?,
                }
            }
            Function::ChangeEndPoint => Command::ChangeEndPoint {
                object_id: c.u16()?,
                width: c.u16()?,
                height: c.u16()?,
                direction: LineDirection::try_from(c.u8()?)?,
            },
            Function::ChangeFontAttributes => Command::ChangeFontAttributes {
                object_id: c.u16()?,
                colour: c.u8()?,
                size: FontSize::try_from(c.u8()?)?,
                font_type: c.u8()?,
                style: c.u8()?,
            },
            Function::ChangeLineAttributes => Command::ChangeLineAttributes {
                object_id: c.u16()?,
                colour: c.u8()?,
                width: c.u8()?,
                line_art: c.u16()?,
            },
            Function::ChangeFillAttributes => Command::ChangeFillAttributes {
                object_id: c.u16()?,
                fill_type: FillType::try_from(c.u8()?)?,
                colour: c.u8()?,
                pattern_object_id: c.u16()?,
            },
            Function::ChangeActiveMask => Command::ChangeActiveMask {
                working_set_object_id: c.u16()?,
                new_mask_object_id: c.u16()?,
            },
            Function::ChangeSoftKeyMask => Command::ChangeSoftKeyMask {
                mask_type: MaskType::try_from(c.u8()?)?,
                mask_object_id: c.u16()?,
                soft_key_mask_object_id: c.u16()?,
            },
            Function::ChangeAttribute => Command::ChangeAttribute {
                object_id: c.u16()?,
                attribute_id: c.u8()?,
                value: c.u32()?,
            },
            Function::ChangePriority => Command::ChangePriority {
                alarm_mask_object_id: c.u16()?,
                priority: AlarmMaskPriority::try_from(c.u8()?)?,
            },
            Function::ChangeListItem => Command::ChangeListItem {
                object_id: c.u16()?,
                list_index: c.u8()?,
                new_object_id: c.u16()?,
            },
            Function::ChangeObjectLabel => Command::ChangeObjectLabel {
                object_id: c.u16()?,
                label_object_id: c.u16()?,
                font_type: c.u8()?,
                graphic_object_id: c.u16()?,
            },
            Function::ChangePolygonPoint => Command::ChangePolygonPoint {
                object_id: c.u16()?,
                point_index: c.u8()?,
                x: c.u16()?,
                y: c.u16()?,
            },
            Function::ChangePolygonScale => Command::ChangePolygonScale {
                object_id: c.u16()?,
                width: c.u16()?,
                height: c.u16()?,
            },
            Function::LockUnlockMask => Command::LockUnlockMask {
                state: MaskLockState::try_from(c.u8()?)?,
                object_id: c.u16()?,
                timeout_ms: c.u16()?,
            },
            Function::ExecuteMacro => Command::ExecuteMacro {
                object_id: c.u16()?,
            },
            Function::ExecuteExtendedMacro => Command::ExecuteExtendedMacro {
                object_id: c.u16()?,
            },
            Function::SelectColourMap => Command::SelectColourMap {
                object_id: c.u16()?,
            },
            Function::GetAttributeValue => Command::GetAttributeValue {
                object_id: c.u16()?,
                attribute_id: c.u8()?,
            },
            Function::GraphicsContext => {
                let object_id = c.u16()?;
                let sub = GraphicsContextSubCommand::try_from(c.u8()?)?;
                Command::GraphicsContext {
                    object_id,
                    sub: GraphicsContextCommand::decode_payload(sub, &mut c)?,
                }
            }
            _ => {
                return Err(VtError::UnknownVariant {
                    type_name: "Command",
                    value: function_byte as u64,
                })
            }
        })
    }

    /// `true` when the encoding exceeds a single frame and must travel
    /// through the transport protocol.
    pub fn needs_transport(encoded: &[u8]) -> bool {
        encoded.len() > FRAME_LENGTH
    }
}

// ── Tests ────────────────────────────────────────────────────────
