//! Pixel codec
//!
//! Every color enters the engine as a 16-bit RGB565 value. These
//! functions map it to the packed form of a surface format and back.
//! The function space is closed over all `u16` inputs; nothing here can
//! fail.
//!
//! # Wire layouts
//!
//! ```text
//! RGB565  [RRRRRGGG][GGGBBBBB]                     1 pixel
//! RGB444  [R1:4|G1:4][B1:4|R2:4][G2:4|B2:4]        2 pixels
//! RGB332  [RRRGGGBB]                               1 pixel
//! ```

use super::PixelFormat;

/// Split an RGB565 color into its 4-bit channels
#[inline]
pub const fn rgb444_channels(color: u16) -> (u8, u8, u8) {
    let r4 = (((color >> 11) & 0x1F) >> 1) as u8;
    let g4 = (((color >> 5) & 0x3F) >> 2) as u8;
    let b4 = ((color & 0x1F) >> 1) as u8;
    (r4, g4, b4)
}

/// Pack two RGB565 colors into three RGB444 bytes
#[inline]
pub const fn pack_rgb444_pair(first: u16, second: u16) -> [u8; 3] {
    let (r1, g1, b1) = rgb444_channels(first);
    let (r2, g2, b2) = rgb444_channels(second);
    [(r1 << 4) | g1, (b1 << 4) | r2, (g2 << 4) | b2]
}

/// Expand 4-bit channels back to RGB565 by replicating the top bits
#[inline]
pub const fn unpack_rgb444(r4: u8, g4: u8, b4: u8) -> u16 {
    let r5 = ((r4 << 1) | (r4 >> 3)) as u16;
    let g6 = ((g4 << 2) | (g4 >> 2)) as u16;
    let b5 = ((b4 << 1) | (b4 >> 3)) as u16;
    (r5 << 11) | (g6 << 5) | b5
}

/// Quantize an RGB565 color to RGB332 (keeps the top 3/3/2 bits)
#[inline]
pub const fn pack_rgb332(color: u16) -> u8 {
    let r3 = ((color >> 13) & 0x07) as u8;
    let g3 = ((color >> 8) & 0x07) as u8;
    let b2 = ((color >> 3) & 0x03) as u8;
    (r3 << 5) | (g3 << 2) | b2
}

/// Expand an RGB332 byte to RGB565 through [`RGB332_TO_RGB565`]
#[inline]
pub fn unpack_rgb332(byte: u8) -> u16 {
    RGB332_TO_RGB565[byte as usize]
}

const fn rgb332_to_rgb565(byte: u8) -> u16 {
    let r3 = ((byte >> 5) & 0x07) as u16;
    let g3 = ((byte >> 2) & 0x07) as u16;
    let b2 = (byte & 0x03) as u16;
    let r5 = (r3 << 2) | (r3 >> 1);
    let g6 = (g3 << 3) | g3;
    let b5 = (b2 << 3) | (b2 << 1) | (b2 >> 1);
    (r5 << 11) | (g6 << 5) | b5
}

const fn build_rgb332_lut() -> [u16; 256] {
    let mut lut = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        lut[i] = rgb332_to_rgb565(i as u8);
        i += 1;
    }
    lut
}

/// RGB332 to RGB565 expansion table, built at compile time
pub static RGB332_TO_RGB565: [u16; 256] = build_rgb332_lut();

/// Expand RGB332 pixels to big-endian RGB565 for the wire
///
/// Converts `min(src.len(), dst.len() / 2)` pixels.
pub fn expand_rgb332(src: &[u8], dst: &mut [u8]) {
    for (out, &px) in dst.chunks_exact_mut(2).zip(src) {
        out.copy_from_slice(&RGB332_TO_RGB565[px as usize].to_be_bytes());
    }
}

/// One packing unit of a color in a given format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedColor {
    bytes: [u8; 3],
    len: u8,
}

impl PackedColor {
    /// Packed bytes (2 for RGB565, 3 for an RGB444 pair, 1 for RGB332)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// Pack `color` into one packing unit of `format`
///
/// For RGB444 the unit is a pair, so the color appears twice.
pub const fn pack(color: u16, format: PixelFormat) -> PackedColor {
    match format {
        PixelFormat::Rgb565 => {
            let [hi, lo] = color.to_be_bytes();
            PackedColor {
                bytes: [hi, lo, 0],
                len: 2,
            }
        }
        PixelFormat::Rgb444 => PackedColor {
            bytes: pack_rgb444_pair(color, color),
            len: 3,
        },
        PixelFormat::Rgb332 => PackedColor {
            bytes: [pack_rgb332(color), 0, 0],
            len: 1,
        },
    }
}

/// Word-level fill pattern for a solid color
///
/// Clears never store pixel by pixel. RGB565 and RGB332 repeat with a
/// period that divides four bytes, so one word covers them. RGB444
/// repeats every three bytes, so three consecutive words (eight pixels)
/// form the cycle and a fill writes them in turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FillPattern {
    /// One word repeated
    Word(u32),
    /// Three-word cycle
    Triple([u32; 3]),
}

impl FillPattern {
    /// Build the pattern for `color` in `format`
    pub const fn new(color: u16, format: PixelFormat) -> Self {
        match format {
            PixelFormat::Rgb565 => {
                let [hi, lo] = color.to_be_bytes();
                FillPattern::Word(u32::from_ne_bytes([hi, lo, hi, lo]))
            }
            PixelFormat::Rgb332 => {
                let c = pack_rgb332(color);
                FillPattern::Word(u32::from_ne_bytes([c, c, c, c]))
            }
            PixelFormat::Rgb444 => {
                let [b0, b1, b2] = pack_rgb444_pair(color, color);
                FillPattern::Triple([
                    u32::from_ne_bytes([b0, b1, b2, b0]),
                    u32::from_ne_bytes([b1, b2, b0, b1]),
                    u32::from_ne_bytes([b2, b0, b1, b2]),
                ])
            }
        }
    }

    /// Number of words in one repetition
    pub const fn period_words(&self) -> usize {
        match self {
            FillPattern::Word(_) => 1,
            FillPattern::Triple(_) => 3,
        }
    }

    /// The repeated word when the pattern is a single word
    pub const fn word(&self) -> Option<u32> {
        match self {
            FillPattern::Word(w) => Some(*w),
            FillPattern::Triple(_) => None,
        }
    }

    /// Fill `words` with whole-word stores
    ///
    /// `words` must start at a pattern boundary (offset multiple of
    /// [`PixelFormat::split_alignment`]). A trailing partial cycle is
    /// completed with the leading words of the cycle.
    pub fn apply(&self, words: &mut [u32]) {
        match self {
            FillPattern::Word(w) => words.fill(*w),
            FillPattern::Triple(cycle) => {
                let mut chunks = words.chunks_exact_mut(3);
                for chunk in &mut chunks {
                    chunk.copy_from_slice(cycle);
                }
                let rest = chunks.into_remainder();
                let n = rest.len();
                rest.copy_from_slice(&cycle[..n]);
            }
        }
    }
}
