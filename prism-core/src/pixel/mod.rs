//! Pixel formats
//!
//! The panel accepts three bit depths. Surfaces store pixels in exactly
//! the on-wire layout of their format, except RGB332 which the panel
//! cannot take natively and is expanded to RGB565 at transfer time.

pub mod codec;

pub use codec::{
    expand_rgb332, pack, pack_rgb332, pack_rgb444_pair, unpack_rgb332, unpack_rgb444,
    FillPattern, PackedColor, RGB332_TO_RGB565,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Surface pixel format
///
/// The discriminants are the panel's pixel-format-set (0x3A) codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PixelFormat {
    /// 16-bit, 2 bytes per pixel, high byte first
    Rgb565 = 0x55,
    /// 12-bit, 2 pixels in 3 bytes
    Rgb444 = 0x53,
    /// 8-bit `RRRGGGBB`, expanded to RGB565 on the wire
    Rgb332 = 0x52,
}

impl PixelFormat {
    /// Code sent with the pixel-format-set command
    ///
    /// RGB332 runs the panel in RGB565 mode and expands through the
    /// lookup table.
    pub const fn panel_code(self) -> u8 {
        match self {
            PixelFormat::Rgb332 => PixelFormat::Rgb565 as u8,
            other => other as u8,
        }
    }

    /// Bytes needed to store `width * height` pixels
    pub const fn buffer_bytes(self, width: u16, height: u16) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::Rgb565 => pixels * 2,
            PixelFormat::Rgb444 => pixels * 3 / 2,
            PixelFormat::Rgb332 => pixels,
        }
    }

    /// Bytes that go over the wire for `width * height` pixels
    pub const fn wire_bytes(self, width: u16, height: u16) -> usize {
        match self {
            PixelFormat::Rgb332 => PixelFormat::Rgb565.buffer_bytes(width, height),
            other => other.buffer_bytes(width, height),
        }
    }

    /// Smallest byte group that holds whole pixels
    pub const fn packing_unit(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb444 => 3,
            PixelFormat::Rgb332 => 1,
        }
    }

    /// Pixels contained in one packing unit
    pub const fn pixels_per_unit(self) -> usize {
        match self {
            PixelFormat::Rgb444 => 2,
            _ => 1,
        }
    }

    /// Byte alignment of a split point that both a word fill and the
    /// format's packing respect
    ///
    /// RGB444 repeats every 12 bytes (three words, eight pixels).
    pub const fn split_alignment(self) -> usize {
        match self {
            PixelFormat::Rgb444 => 12,
            _ => 4,
        }
    }

    /// Whether the surface must be expanded before transfer
    pub const fn needs_expansion(self) -> bool {
        matches!(self, PixelFormat::Rgb332)
    }

    /// Short human readable name
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Rgb444 => "RGB444",
            PixelFormat::Rgb332 => "RGB332",
        }
    }
}
