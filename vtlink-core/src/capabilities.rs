//! Passive record of everything learned from the server during handshake.
//!
//! Populated in strict order by the capability-query responses
//! (get memory → soft keys → text fonts → hardware) and never mutated in
//! the Connected state; a reconnect clears and repopulates it.

use bitflags::bitflags;

use crate::types::{FontSize, FontStyle, GraphicMode, VtVersion};

bitflags! {
    /// Hardware feature bits from byte 3 of the get hardware response.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HardwareFeatures: u8 {
        /// Touchscreen that reports pointing messages.
        const TOUCHSCREEN_WITH_POINTING = 0x01;
        /// Pointing device (mouse-like) that reports pointing messages.
        const POINTING_DEVICE_WITH_POINTING = 0x02;
        /// Multiple frequency audio output.
        const MULTI_FREQUENCY_AUDIO = 0x04;
        /// Adjustable audio output volume.
        const ADJUSTABLE_VOLUME = 0x08;
        /// Simultaneous activation of physical soft keys.
        const SIMULTANEOUS_PHYSICAL_KEYS = 0x10;
        /// Simultaneous activation of buttons and soft keys.
        const SIMULTANEOUS_BUTTONS_AND_SOFTKEYS = 0x20;
        /// Drag operation via pointing events.
        const DRAG_OPERATION = 0x40;
        /// Intermediate coordinates reported during a drag.
        const DRAG_INTERMEDIATE_COORDINATES = 0x80;
    }
}

/// Everything the server reported about itself during the handshake.
///
/// All-zero until populated; [`Capabilities::clear`] resets it for a
/// re-handshake.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    connected_version_raw: u8,

    soft_key_x_pixels: u8,
    soft_key_y_pixels: u8,
    virtual_soft_keys: u8,
    physical_soft_keys: u8,

    small_font_sizes: u8,
    large_font_sizes: u8,
    font_styles: u8,

    graphic_mode: GraphicMode,
    hardware_features: HardwareFeatures,
    x_pixels: u16,
    y_pixels: u16,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; used when a new handshake begins.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ── Population (one method per handshake response) ───────────

    pub(crate) fn apply_connected_version(&mut self, raw: u8) {
        self.connected_version_raw = raw;
    }

    pub(crate) fn apply_soft_key_data(
        &mut self,
        x_pixels: u8,
        y_pixels: u8,
        virtual_keys: u8,
        physical_keys: u8,
    ) {
        self.soft_key_x_pixels = x_pixels;
        self.soft_key_y_pixels = y_pixels;
        self.virtual_soft_keys = virtual_keys;
        self.physical_soft_keys = physical_keys;
    }

    pub(crate) fn apply_font_data(&mut self, small_sizes: u8, large_sizes: u8, styles: u8) {
        self.small_font_sizes = small_sizes;
        self.large_font_sizes = large_sizes;
        self.font_styles = styles;
    }

    pub(crate) fn apply_hardware_data(
        &mut self,
        graphic_mode: GraphicMode,
        features: HardwareFeatures,
        x_pixels: u16,
        y_pixels: u16,
    ) {
        self.graphic_mode = graphic_mode;
        self.hardware_features = features;
        self.x_pixels = x_pixels;
        self.y_pixels = y_pixels;
    }

    // ── Queries ──────────────────────────────────────────────────

    /// The VT version the connected server reported.
    pub fn connected_version(&self) -> VtVersion {
        VtVersion::from_status_byte(self.connected_version_raw)
    }

    pub fn soft_key_x_pixels(&self) -> u8 {
        self.soft_key_x_pixels
    }

    pub fn soft_key_y_pixels(&self) -> u8 {
        self.soft_key_y_pixels
    }

    pub fn virtual_soft_keys(&self) -> u8 {
        self.virtual_soft_keys
    }

    pub fn physical_soft_keys(&self) -> u8 {
        self.physical_soft_keys
    }

    /// Whether the server supports a font size.
    ///
    /// Size indices 0..=7 test the small-font bitfield, 8..=14 the
    /// large-font bitfield.
    pub fn font_size_supported(&self, size: FontSize) -> bool {
        let index = size as u8;
        if index < 8 {
            self.small_font_sizes & (1 << index) != 0
        } else {
            self.large_font_sizes & (1 << (index - 8)) != 0
        }
    }

    /// Whether the server supports a font style bit.
    pub fn font_style_supported(&self, style: FontStyle) -> bool {
        self.font_styles & (1 << (style as u8)) != 0
    }

    pub fn graphic_mode(&self) -> GraphicMode {
        self.graphic_mode
    }

    pub fn hardware_features(&self) -> HardwareFeatures {
        self.hardware_features
    }

    /// Width of the data mask area in pixels.
    pub fn x_pixels(&self) -> u16 {
        self.x_pixels
    }

    /// Height of the data mask area in pixels.
    pub fn y_pixels(&self) -> u16 {
        self.y_pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_bitfield_split() {
        let mut caps = Capabilities::new();
        // Small bitfield: sizes 0 and 7. Large bitfield: sizes 8 and 14.
        caps.apply_font_data(0b1000_0001, 0b0100_0001, 0);

        assert!(caps.font_size_supported(FontSize::Size6x8)); // index 0
        assert!(caps.font_size_supported(FontSize::Size32x32)); // index 7
        assert!(!caps.font_size_supported(FontSize::Size8x8)); // index 1

        assert!(caps.font_size_supported(FontSize::Size32x48)); // index 8 → large bit 0
        assert!(caps.font_size_supported(FontSize::Size128x192)); // index 14 → large bit 6
        assert!(!caps.font_size_supported(FontSize::Size48x64)); // index 9
    }

    #[test]
    fn font_style_bits() {
        let mut caps = Capabilities::new();
        caps.apply_font_data(0, 0, 0b0000_1001);
        assert!(caps.font_style_supported(FontStyle::Bold));
        assert!(caps.font_style_supported(FontStyle::Italic));
        assert!(!caps.font_style_supported(FontStyle::Underlined));
    }

    #[test]
    fn hardware_data_applied() {
        let mut caps = Capabilities::new();
        caps.apply_hardware_data(
            GraphicMode::TwoHundredFiftySixColour,
            HardwareFeatures::TOUCHSCREEN_WITH_POINTING | HardwareFeatures::ADJUSTABLE_VOLUME,
            480,
            480,
        );
        assert_eq!(caps.graphic_mode(), GraphicMode::TwoHundredFiftySixColour);
        assert_eq!(caps.x_pixels(), 480);
        assert!(caps
            .hardware_features()
            .contains(HardwareFeatures::ADJUSTABLE_VOLUME));
        assert!(!caps
            .hardware_features()
            .contains(HardwareFeatures::DRAG_OPERATION));
    }

    #[test]
    fn clear_resets_everything() {
        let mut caps = Capabilities::new();
        caps.apply_connected_version(4);
        caps.apply_soft_key_data(60, 60, 64, 10);
        caps.clear();
        assert_eq!(caps.connected_version(), VtVersion::ReservedOrUnknown);
        assert_eq!(caps.physical_soft_keys(), 0);
    }
}
