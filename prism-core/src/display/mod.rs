//! Panel protocol
//!
//! [`DisplayController`] owns the link and the panel's control lines,
//! runs the bring-up sequence and frames pixel writes. Consumers that
//! only stream frames (the swap chain, direct mode) see it through the
//! [`Panel`] trait.

pub mod commands;
mod controller;
mod direct;

pub use commands::{MemoryAccess, Orientation};
pub use controller::DisplayController;
pub use direct::DirectPanel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use prism_hal::LinkError;

use crate::pixel::PixelFormat;

/// Single-byte commands above this link rate drop to the init divisor
pub const DEFAULT_COMMAND_LIMIT_HZ: u32 = 40_000_000;

/// Panel protocol errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// The link refused the operation
    Link(LinkError),
    /// Window corners inverted or outside the panel
    InvalidWindow,
}

impl From<LinkError> for DisplayError {
    fn from(e: LinkError) -> Self {
        DisplayError::Link(e)
    }
}

/// Static panel description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    pub width: u16,
    pub height: u16,
    /// Surface format; selects the pixel-format-set code
    pub format: PixelFormat,
    pub memory_access: MemoryAccess,
    /// Highest link rate at which command bytes are sent unthrottled
    pub command_limit_hz: u32,
}

impl PanelConfig {
    pub const fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            memory_access: MemoryAccess {
                orientation: Orientation::Landscape,
                bgr: true,
            },
            command_limit_hz: DEFAULT_COMMAND_LIMIT_HZ,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::new(320, 240, PixelFormat::Rgb565)
    }
}

/// Frame sink
///
/// A write session is `set_window`, `start_bulk`, one or more
/// `send_buffer`/`wait` pairs, then `end_bulk`.
pub trait Panel {
    /// Program the address window (inclusive corners) and open a memory write
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError>;

    /// Switch the link to the bulk rate
    fn start_bulk(&mut self) -> Result<(), DisplayError>;

    /// Wait for the link to drain and return to the command rate
    fn end_bulk(&mut self) -> Result<(), DisplayError>;

    /// Start streaming `data` into the open window
    ///
    /// # Safety
    ///
    /// Same contract as [`prism_hal::Transport::send_buffer`]: `data` must
    /// stay alive and unmodified until [`Panel::wait`] returns.
    #[allow(unsafe_code)]
    unsafe fn send_buffer(&mut self, data: &[u8]) -> Result<(), DisplayError>;

    /// Block until the running transfer has left the link
    fn wait(&mut self);

    /// Check whether a transfer is in flight
    fn is_busy(&self) -> bool;

    /// Bulk link rate in Hz
    fn link_hz(&self) -> u32;

    /// Stream `data` and wait for it
    fn write_pixels(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        // SAFETY: `data` is borrowed until `wait` returns.
        #[allow(unsafe_code)]
        unsafe {
            self.send_buffer(data)?;
        }
        self.wait();
        Ok(())
    }
}
