//! VT function codes — the multiplexor byte leading every VT message.
//!
//! Discriminants are the wire bytes and must be preserved exactly.
//!
//! Organized by category:
//! - `0x00..0x0A` — activation/notification messages from the server
//! - `0x11..0x12` — object pool transfer
//! - `0x20..0x27` — auxiliary input (codec entries only)
//! - `0x90..0xD6` — the command set
//! - `0xDF..0xE0` — version queries
//! - `0xFD..0xFF` — unsupported-function, VT status, maintenance

use crate::error::VtError;

/// Every function code the codec understands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // ── Server events (0x00..0x0A) ───────────────────────────────
    SoftKeyActivation = 0x00,
    ButtonActivation = 0x01,
    PointingEvent = 0x02,
    VtSelectInputObject = 0x03,
    VtEsc = 0x04,
    VtChangeNumericValue = 0x05,
    VtChangeActiveMask = 0x06,
    VtChangeSoftKeyMask = 0x07,
    VtChangeStringValue = 0x08,
    VtOnUserLayoutHideShow = 0x09,
    VtControlAudioSignalTermination = 0x0A,

    // ── Pool transfer (0x11..0x12) ───────────────────────────────
    ObjectPoolTransfer = 0x11,
    EndOfObjectPool = 0x12,

    // ── Auxiliary input (0x20..0x27) ─────────────────────────────
    AuxiliaryAssignmentTypeOne = 0x20,
    AuxiliaryInputTypeOneStatus = 0x21,
    PreferredAssignment = 0x22,
    AuxiliaryInputTypeTwoMaintenance = 0x23,
    AuxiliaryAssignmentTypeTwo = 0x24,
    AuxiliaryInputStatusTypeTwoEnable = 0x25,
    AuxiliaryInputTypeTwoStatus = 0x26,
    AuxiliaryCapabilities = 0x27,

    // ── Command set (0x90..0xD6) ─────────────────────────────────
    SelectActiveWorkingSet = 0x90,
    EscCommand = 0x92,
    HideShowObject = 0xA0,
    EnableDisableObject = 0xA1,
    SelectInputObject = 0xA2,
    ControlAudioSignal = 0xA3,
    SetAudioVolume = 0xA4,
    ChangeChildLocation = 0xA5,
    ChangeSize = 0xA6,
    ChangeBackgroundColour = 0xA7,
    ChangeNumericValue = 0xA8,
    ChangeEndPoint = 0xA9,
    ChangeFontAttributes = 0xAA,
    ChangeLineAttributes = 0xAB,
    ChangeFillAttributes = 0xAC,
    ChangeActiveMask = 0xAD,
    ChangeSoftKeyMask = 0xAE,
    ChangeAttribute = 0xAF,
    ChangePriority = 0xB0,
    ChangeListItem = 0xB1,
    DeleteObjectPool = 0xB2,
    ChangeStringValue = 0xB3,
    ChangeChildPosition = 0xB4,
    ChangeObjectLabel = 0xB5,
    ChangePolygonPoint = 0xB6,
    ChangePolygonScale = 0xB7,
    GraphicsContext = 0xB8,
    GetAttributeValue = 0xB9,
    SelectColourMap = 0xBA,
    IdentifyVt = 0xBB,
    ExecuteExtendedMacro = 0xBC,
    LockUnlockMask = 0xBD,
    ExecuteMacro = 0xBE,
    GetMemory = 0xC0,
    GetSupportedWidechars = 0xC1,
    GetNumberOfSoftKeys = 0xC2,
    GetTextFontData = 0xC3,
    GetWindowMaskData = 0xC4,
    GetSupportedObjects = 0xC5,
    GetHardware = 0xC7,
    StoreVersion = 0xD0,
    LoadVersion = 0xD1,
    DeleteVersion = 0xD2,
    ExtendedGetVersions = 0xD3,
    ExtendedStoreVersion = 0xD4,
    ExtendedLoadVersion = 0xD5,
    ExtendedDeleteVersion = 0xD6,

    // ── Version queries (0xDF..0xE0) ─────────────────────────────
    GetVersions = 0xDF,
    GetVersionsResponse = 0xE0,

    // ── Status and housekeeping (0xFD..0xFF) ─────────────────────
    UnsupportedVtFunction = 0xFD,
    VtStatus = 0xFE,
    WorkingSetMaintenance = 0xFF,
}

impl TryFrom<u8> for Function {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Function::SoftKeyActivation,
            0x01 => Function::ButtonActivation,
            0x02 => Function::PointingEvent,
            0x03 => Function::VtSelectInputObject,
            0x04 => Function::VtEsc,
            0x05 => Function::VtChangeNumericValue,
            0x06 => Function::VtChangeActiveMask,
            0x07 => Function::VtChangeSoftKeyMask,
            0x08 => Function::VtChangeStringValue,
            0x09 => Function::VtOnUserLayoutHideShow,
            0x0A => Function::VtControlAudioSignalTermination,

            0x11 => Function::ObjectPoolTransfer,
            0x12 => Function::EndOfObjectPool,

            0x20 => Function::AuxiliaryAssignmentTypeOne,
            0x21 => Function::AuxiliaryInputTypeOneStatus,
            0x22 => Function::PreferredAssignment,
            0x23 => Function::AuxiliaryInputTypeTwoMaintenance,
            0x24 => Function::AuxiliaryAssignmentTypeTwo,
            0x25 => Function::AuxiliaryInputStatusTypeTwoEnable,
            0x26 => Function::AuxiliaryInputTypeTwoStatus,
            0x27 => Function::AuxiliaryCapabilities,

            0x90 => Function::SelectActiveWorkingSet,
            0x92 => Function::EscCommand,
            0xA0 => Function::HideShowObject,
            0xA1 => Function::EnableDisableObject,
            0xA2 => Function::SelectInputObject,
            0xA3 => Function::ControlAudioSignal,
            0xA4 => Function::SetAudioVolume,
            0xA5 => Function::ChangeChildLocation,
            0xA6 => Function::ChangeSize,
            0xA7 => Function::ChangeBackgroundColour,
            0xA8 => Function::ChangeNumericValue,
            0xA9 => Function::ChangeEndPoint,
            0xAA => Function::ChangeFontAttributes,
            0xAB => Function::ChangeLineAttributes,
            0xAC => Function::ChangeFillAttributes,
            0xAD => Function::ChangeActiveMask,
            0xAE => Function::ChangeSoftKeyMask,
            0xAF => Function::ChangeAttribute,
            0xB0 => Function::ChangePriority,
            0xB1 => Function::ChangeListItem,
            0xB2 => Function::DeleteObjectPool,
            0xB3 => Function::ChangeStringValue,
            0xB4 => Function::ChangeChildPosition,
            0xB5 => Function::ChangeObjectLabel,
            0xB6 => Function::ChangePolygonPoint,
            0xB7 => Function::ChangePolygonScale,
            0xB8 => Function::GraphicsContext,
            0xB9 => Function::GetAttributeValue,
            0xBA => Function::SelectColourMap,
            0xBB => Function::IdentifyVt,
            0xBC => Function::ExecuteExtendedMacro,
            0xBD => Function::LockUnlockMask,
            0xBE => Function::ExecuteMacro,
            0xC0 => Function::GetMemory,
            0xC1 => Function::GetSupportedWidechars,
            0xC2 => Function::GetNumberOfSoftKeys,
            0xC3 => Function::GetTextFontData,
            0xC4 => Function::GetWindowMaskData,
            0xC5 => Function::GetSupportedObjects,
            0xC7 => Function::GetHardware,
            0xD0 => Function::StoreVersion,
            0xD1 => Function::LoadVersion,
            0xD2 => Function::DeleteVersion,
            0xD3 => Function::ExtendedGetVersions,
            0xD4 => Function::ExtendedStoreVersion,
            0xD5 => Function::ExtendedLoadVersion,
            0xD6 => Function::ExtendedDeleteVersion,

            0xDF => Function::GetVersions,
            0xE0 => Function::GetVersionsResponse,

            0xFD => Function::UnsupportedVtFunction,
            0xFE => Function::VtStatus,
            0xFF => Function::WorkingSetMaintenance,

            _ => return Err(VtError::UnknownFunction { value }),
        })
    }
}

// ── Graphics context sub-commands ────────────────────────────────

/// Sub-command byte of the graphics context command (outer code 0xB8).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsContextSubCommand {
    SetGraphicsCursor = 0x00,
    MoveGraphicsCursor = 0x01,
    SetForegroundColour = 0x02,
    SetBackgroundColour = 0x03,
    SetLineAttributesObjectId = 0x04,
    SetFillAttributesObjectId = 0x05,
    SetFontAttributesObjectId = 0x06,
    EraseRectangle = 0x07,
    DrawPoint = 0x08,
    DrawLine = 0x09,
    DrawRectangle = 0x0A,
    DrawClosedEllipse = 0x0B,
    DrawPolygon = 0x0C,
    DrawText = 0x0D,
    PanViewport = 0x0E,
    ZoomViewport = 0x0F,
    PanAndZoomViewport = 0x10,
    ChangeViewportSize = 0x11,
    DrawVtObject = 0x12,
    CopyCanvasToPictureGraphic = 0x13,
    CopyViewportToPictureGraphic = 0x14,
}

impl TryFrom<u8> for GraphicsContextSubCommand {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => GraphicsContextSubCommand::SetGraphicsCursor,
            0x01 => GraphicsContextSubCommand::MoveGraphicsCursor,
            0x02 => GraphicsContextSubCommand::SetForegroundColour,
            0x03 => GraphicsContextSubCommand::SetBackgroundColour,
            0x04 => GraphicsContextSubCommand::SetLineAttributesObjectId,
            0x05 => GraphicsContextSubCommand::SetFillAttributesObjectId,
            0x06 => GraphicsContextSubCommand::SetFontAttributesObjectId,
            0x07 => GraphicsContextSubCommand::EraseRectangle,
            0x08 => GraphicsContextSubCommand::DrawPoint,
            0x09 => GraphicsContextSubCommand::DrawLine,
            0x0A => GraphicsContextSubCommand::DrawRectangle,
            0x0B => GraphicsContextSubCommand::DrawClosedEllipse,
            0x0C => GraphicsContextSubCommand::DrawPolygon,
            0x0D => GraphicsContextSubCommand::DrawText,
            0x0E => GraphicsContextSubCommand::PanViewport,
            0x0F => GraphicsContextSubCommand::ZoomViewport,
            0x10 => GraphicsContextSubCommand::PanAndZoomViewport,
            0x11 => GraphicsContextSubCommand::ChangeViewportSize,
            0x12 => GraphicsContextSubCommand::DrawVtObject,
            0x13 => GraphicsContextSubCommand::CopyCanvasToPictureGraphic,
            0x14 => GraphicsContextSubCommand::CopyViewportToPictureGraphic,
            _ => return Err(VtError::UnknownSubCommand { value }),
        })
    }
}
