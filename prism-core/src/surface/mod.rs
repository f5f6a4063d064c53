//! Pixel surfaces
//!
//! A [`Surface`] is an owned pixel buffer in the on-wire layout of its
//! format. Storage is a vector of 32-bit words so that the memory-fill
//! engine and whole-word clears never hit an unaligned address; the
//! byte view used by drawing and by the link is the first `size_bytes`
//! bytes of that storage.

mod draw;
mod graphics;

pub(crate) use draw::circle_spans;

use alloc::vec::Vec;

use crate::config::ConfigError;
use crate::error::EngineError;
use crate::pixel::{
    codec::rgb444_channels, pack_rgb332, unpack_rgb332, unpack_rgb444, FillPattern, PixelFormat,
};

/// Owned pixel buffer
pub struct Surface {
    words: Vec<u32>,
    width: u16,
    height: u16,
    format: PixelFormat,
    size_bytes: usize,
}

impl Surface {
    /// Allocate a zeroed surface
    ///
    /// Fails with [`EngineError::OutOfMemory`] when the heap cannot hold
    /// the buffer. Zero dimensions and, for RGB444, odd pixel counts are
    /// rejected as [`EngineError::InvalidConfig`].
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroSize.into());
        }
        if format == PixelFormat::Rgb444 && (width as usize * height as usize) % 2 != 0 {
            return Err(ConfigError::OddPixelCount.into());
        }
        let words = alloc_words(format.buffer_bytes(width, height))?;
        Ok(Self {
            words,
            width,
            height,
            format,
            size_bytes: format.buffer_bytes(width, height),
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Pixel data in wire order
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.size_bytes]
    }

    /// Mutable pixel data in wire order
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.size_bytes]
    }

    /// Backing words (may extend up to three bytes past `size_bytes`)
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Mutable backing words
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Fill the whole surface with one color using word stores
    pub fn clear(&mut self, color: u16) {
        FillPattern::new(color, self.format).apply(&mut self.words);
    }

    /// Byte offset where a two-way split of a clear should happen
    ///
    /// Rounded down so the second half starts on a word boundary and, for
    /// RGB444, on a pattern boundary.
    pub fn split_offset(&self) -> usize {
        let align = self.format.split_alignment();
        (self.size_bytes / 2) / align * align
    }

    pub(crate) fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Write one pixel; coordinates must be in bounds
    pub(crate) fn put(&mut self, x: usize, y: usize, color: u16) {
        let index = y * self.width as usize + x;
        let format = self.format;
        let bytes = self.bytes_mut();
        match format {
            PixelFormat::Rgb565 => {
                bytes[index * 2..index * 2 + 2].copy_from_slice(&color.to_be_bytes());
            }
            PixelFormat::Rgb332 => bytes[index] = pack_rgb332(color),
            PixelFormat::Rgb444 => {
                let (r, g, b) = rgb444_channels(color);
                let base = (index / 2) * 3;
                if index % 2 == 0 {
                    bytes[base] = (r << 4) | g;
                    bytes[base + 1] = (bytes[base + 1] & 0x0F) | (b << 4);
                } else {
                    bytes[base + 1] = (bytes[base + 1] & 0xF0) | r;
                    bytes[base + 2] = (g << 4) | b;
                }
            }
        }
    }

    /// Read one pixel back as RGB565
    ///
    /// Lossy formats return the channel-replicated expansion of the
    /// stored value. Out-of-bounds coordinates return `None`.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u16> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        let bytes = self.bytes();
        let color = match self.format {
            PixelFormat::Rgb565 => u16::from_be_bytes([bytes[index * 2], bytes[index * 2 + 1]]),
            PixelFormat::Rgb332 => unpack_rgb332(bytes[index]),
            PixelFormat::Rgb444 => {
                let base = (index / 2) * 3;
                let (b0, b1, b2) = (bytes[base], bytes[base + 1], bytes[base + 2]);
                if index % 2 == 0 {
                    unpack_rgb444(b0 >> 4, b0 & 0x0F, b1 >> 4)
                } else {
                    unpack_rgb444(b1 & 0x0F, b2 >> 4, b2 & 0x0F)
                }
            }
        };
        Some(color)
    }
}

/// Allocate a zeroed word buffer covering `bytes` bytes
pub(crate) fn alloc_words(bytes: usize) -> Result<Vec<u32>, EngineError> {
    let len = bytes.div_ceil(4);
    let mut words = Vec::new();
    words
        .try_reserve_exact(len)
        .map_err(|_| EngineError::OutOfMemory)?;
    words.resize(len, 0);
    Ok(words)
}
