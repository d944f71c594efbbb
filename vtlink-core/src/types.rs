//! Domain enumerations shared between the codec and the client API.
//!
//! Discriminants are the wire bytes and must be preserved exactly.

use crate::error::VtError;

/// The reserved NULL object ID, usually drawn as blank space.
pub const NULL_OBJECT_ID: u16 = 0xFFFF;

// ── HideShowState ────────────────────────────────────────────────

/// Target state for the hide/show object command.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideShowState {
    HideObject = 0,
    ShowObject = 1,
}

impl TryFrom<u8> for HideShowState {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HideShowState::HideObject),
            1 => Ok(HideShowState::ShowObject),
            _ => Err(VtError::UnknownVariant {
                type_name: "HideShowState",
                value: value as u64,
            }),
        }
    }
}

// ── EnableDisableState ───────────────────────────────────────────

/// Target state for the enable/disable object command.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableDisableState {
    DisableObject = 0,
    EnableObject = 1,
}

impl TryFrom<u8> for EnableDisableState {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EnableDisableState::DisableObject),
            1 => Ok(EnableDisableState::EnableObject),
            _ => Err(VtError::UnknownVariant {
                type_name: "EnableDisableState",
                value: value as u64,
            }),
        }
    }
}

// ── SelectInputOption ────────────────────────────────────────────

/// How the select input object command selects its target.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectInputOption {
    /// Activate the object for data input.
    ActivateForDataInput = 0x00,
    /// Only set focus to the object (usually drawn as a temporary box).
    SetFocus = 0xFF,
}

impl TryFrom<u8> for SelectInputOption {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(SelectInputOption::ActivateForDataInput),
            0xFF => Ok(SelectInputOption::SetFocus),
            _ => Err(VtError::UnknownVariant {
                type_name: "SelectInputOption",
                value: value as u64,
            }),
        }
    }
}

// ── VtVersion ────────────────────────────────────────────────────

/// The VT versions a client or server might support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VtVersion {
    Version2OrOlder,
    Version3,
    Version4,
    Version5,
    Version6,
    #[default]
    ReservedOrUnknown,
}

impl VtVersion {
    /// Interpret the raw version byte reported by the server.
    ///
    /// Version-2-and-older servers report 0xFF.
    pub fn from_status_byte(value: u8) -> Self {
        match value {
            0xFF => VtVersion::Version2OrOlder,
            3 => VtVersion::Version3,
            4 => VtVersion::Version4,
            5 => VtVersion::Version5,
            6 => VtVersion::Version6,
            _ => VtVersion::ReservedOrUnknown,
        }
    }

    /// The version byte carried in the working set maintenance message.
    ///
    /// Version 2 and older clients send 0xFF.
    pub fn to_maintenance_byte(self) -> u8 {
        match self {
            VtVersion::Version3 => 3,
            VtVersion::Version4 => 4,
            VtVersion::Version5 => 5,
            VtVersion::Version6 => 6,
            VtVersion::Version2OrOlder | VtVersion::ReservedOrUnknown => 0xFF,
        }
    }
}

// ── LineDirection ────────────────────────────────────────────────

/// Line directions used when changing the endpoint of an output line.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDirection {
    /// Top left to bottom right of the enclosing virtual rectangle.
    TopLeftToBottomRight = 0,
    /// Bottom left to top right of the enclosing virtual rectangle.
    BottomLeftToTopRight = 1,
}

impl TryFrom<u8> for LineDirection {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LineDirection::TopLeftToBottomRight),
            1 => Ok(LineDirection::BottomLeftToTopRight),
            _ => Err(VtError::UnknownVariant {
                type_name: "LineDirection",
                value: value as u64,
            }),
        }
    }
}

// ── FontSize ─────────────────────────────────────────────────────

/// Font cell sizes. Indices 0..=7 are reported in the server's small-font
/// bitfield, 8..=14 in the large-font bitfield.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Size6x8 = 0,
    Size8x8 = 1,
    Size8x12 = 2,
    Size12x16 = 3,
    Size16x16 = 4,
    Size16x24 = 5,
    Size24x32 = 6,
    Size32x32 = 7,
    Size32x48 = 8,
    Size48x64 = 9,
    Size64x64 = 10,
    Size64x96 = 11,
    Size96x128 = 12,
    Size128x128 = 13,
    Size128x192 = 14,
}

impl TryFrom<u8> for FontSize {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => FontSize::Size6x8,
            1 => FontSize::Size8x8,
            2 => FontSize::Size8x12,
            3 => FontSize::Size12x16,
            4 => FontSize::Size16x16,
            5 => FontSize::Size16x24,
            6 => FontSize::Size24x32,
            7 => FontSize::Size32x32,
            8 => FontSize::Size32x48,
            9 => FontSize::Size48x64,
            10 => FontSize::Size64x64,
            11 => FontSize::Size64x96,
            12 => FontSize::Size96x128,
            13 => FontSize::Size128x128,
            14 => FontSize::Size128x192,
            _ => {
                return Err(VtError::UnknownVariant {
                    type_name: "FontSize",
                    value: value as u64,
                })
            }
        })
    }
}

// ── FontStyle ────────────────────────────────────────────────────

/// Font style options; each value is a bit index into the style bitfield.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Bold = 0,
    CrossedOut = 1,
    Underlined = 2,
    Italic = 3,
    Inverted = 4,
    Flashing = 5,
    FlashingHidden = 6,
    ProportionalFontRendering = 7,
}

// ── FillType ─────────────────────────────────────────────────────

/// Fill types for the change fill attributes command.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillType {
    NoFill = 0,
    FillWithLineColour = 1,
    FillWithSpecifiedColour = 2,
    FillWithPattern = 3,
}

impl TryFrom<u8> for FillType {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FillType::NoFill),
            1 => Ok(FillType::FillWithLineColour),
            2 => Ok(FillType::FillWithSpecifiedColour),
            3 => Ok(FillType::FillWithPattern),
            _ => Err(VtError::UnknownVariant {
                type_name: "FillType",
                value: value as u64,
            }),
        }
    }
}

// ── MaskType ─────────────────────────────────────────────────────

/// The two mask families a soft-key mask can attach to.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskType {
    DataMask = 1,
    AlarmMask = 2,
}

impl TryFrom<u8> for MaskType {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MaskType::DataMask),
            2 => Ok(MaskType::AlarmMask),
            _ => Err(VtError::UnknownVariant {
                type_name: "MaskType",
                value: value as u64,
            }),
        }
    }
}

// ── AlarmMaskPriority ────────────────────────────────────────────

/// Priorities of an alarm mask. High overrides medium overrides low.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMaskPriority {
    High = 0,
    Medium = 1,
    Low = 2,
}

impl TryFrom<u8> for AlarmMaskPriority {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AlarmMaskPriority::High),
            1 => Ok(AlarmMaskPriority::Medium),
            2 => Ok(AlarmMaskPriority::Low),
            _ => Err(VtError::UnknownVariant {
                type_name: "AlarmMaskPriority",
                value: value as u64,
            }),
        }
    }
}

// ── MaskLockState ────────────────────────────────────────────────

/// Lock state used to freeze/unfreeze rendering of a mask.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskLockState {
    UnlockMask = 0,
    LockMask = 1,
}

impl TryFrom<u8> for MaskLockState {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MaskLockState::UnlockMask),
            1 => Ok(MaskLockState::LockMask),
            _ => Err(VtError::UnknownVariant {
                type_name: "MaskLockState",
                value: value as u64,
            }),
        }
    }
}

// ── KeyActivationCode ────────────────────────────────────────────

/// The activation codes a key, button, or pointing event can carry.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyActivationCode {
    /// Released (or unlatched).
    ButtonUnlatchedOrReleased = 0,
    /// Pressed (or latched).
    ButtonPressedOrLatched = 1,
    /// Held down; sent cyclically while held.
    ButtonStillHeld = 2,
    /// The user navigated away without releasing.
    ButtonPressAborted = 3,
}

impl TryFrom<u8> for KeyActivationCode {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(KeyActivationCode::ButtonUnlatchedOrReleased),
            1 => Ok(KeyActivationCode::ButtonPressedOrLatched),
            2 => Ok(KeyActivationCode::ButtonStillHeld),
            3 => Ok(KeyActivationCode::ButtonPressAborted),
            _ => Err(VtError::UnknownVariant {
                type_name: "KeyActivationCode",
                value: value as u64,
            }),
        }
    }
}

// ── GraphicMode ──────────────────────────────────────────────────

/// The graphics modes a VT server can run in.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphicMode {
    #[default]
    Monochrome = 0,
    SixteenColour = 1,
    TwoHundredFiftySixColour = 2,
}

impl TryFrom<u8> for GraphicMode {
    type Error = VtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GraphicMode::Monochrome),
            1 => Ok(GraphicMode::SixteenColour),
            2 => Ok(GraphicMode::TwoHundredFiftySixColour),
            _ => Err(VtError::UnknownVariant {
                type_name: "GraphicMode",
                value: value as u64,
            }),
        }
    }
}
