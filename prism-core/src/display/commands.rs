//! Panel command set
//!
//! Command bytes, settle delays and the memory-access-control encoding of
//! the MIPI-DCS style controllers this engine drives.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Command bytes
pub mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
}

/// Settle delays in milliseconds
pub mod delay {
    /// Reset line held low
    pub const RESET_PULSE_MS: u32 = 50;
    /// After releasing hardware reset
    pub const RESET_SETTLE_MS: u32 = 150;
    /// After software reset
    pub const SWRESET_MS: u32 = 150;
    /// After sleep-out
    pub const SLPOUT_MS: u32 = 150;
    /// After display-on
    pub const DISPON_MS: u32 = 50;
}

// MADCTL bits
const MY: u8 = 0x80;
const MX: u8 = 0x40;
const MV: u8 = 0x20;
const BGR: u8 = 0x08;

/// Scan orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

/// Memory access control (0x36) payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryAccess {
    pub orientation: Orientation,
    /// Panel has BGR subpixel order
    pub bgr: bool,
}

impl MemoryAccess {
    pub const fn bits(self) -> u8 {
        let scan = match self.orientation {
            Orientation::Portrait => MX,
            Orientation::Landscape => MX | MV,
            Orientation::PortraitFlipped => MY,
            Orientation::LandscapeFlipped => MY | MV,
        };
        if self.bgr {
            scan | BGR
        } else {
            scan
        }
    }
}

impl Default for MemoryAccess {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            bgr: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_landscape_bgr() {
        assert_eq!(MemoryAccess::default().bits(), 0x68);
    }

    #[test]
    fn test_orientation_bits() {
        let rgb = |orientation| MemoryAccess {
            orientation,
            bgr: false,
        };
        assert_eq!(rgb(Orientation::Portrait).bits(), 0x40);
        assert_eq!(rgb(Orientation::Landscape).bits(), 0x60);
        assert_eq!(rgb(Orientation::PortraitFlipped).bits(), 0x80);
        assert_eq!(rgb(Orientation::LandscapeFlipped).bits(), 0xA0);
    }
}
