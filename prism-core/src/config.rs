//! Engine configuration
//!
//! The configuration surface handed over by the board glue: panel
//! geometry, pixel format, how many surfaces to rotate through, and the
//! performance profile that fixes CPU and link clocks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pixel::PixelFormat;

/// Maximum number of surfaces in a swap chain
pub const MAX_BUFFERS: usize = 3;

/// Link clock used for commands and panel bring-up on every profile
pub const LINK_INIT_HZ: u32 = 10_000_000;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero
    ZeroSize,
    /// RGB444 packs pixel pairs; the pixel count must be even
    OddPixelCount,
    /// Buffer count outside 1..=3
    BufferCount(u8),
    /// Line-streamed expansion needs at least one line
    ZeroExpansionLines,
    /// The format cannot be streamed without a backing surface
    UnsupportedDirectFormat,
}

/// Number of surfaces in the swap chain (1..=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BufferCount(u8);

impl BufferCount {
    /// Single buffer: drawing waits for the previous transfer
    pub const SINGLE: Self = Self(1);
    /// Double buffering
    pub const DOUBLE: Self = Self(2);
    /// Triple buffering
    pub const TRIPLE: Self = Self(3);

    /// Create a buffer count, rejecting values outside 1..=3
    pub const fn new(count: u8) -> Result<Self, ConfigError> {
        if count == 0 || count as usize > MAX_BUFFERS {
            Err(ConfigError::BufferCount(count))
        } else {
            Ok(Self(count))
        }
    }

    /// Count as usize
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for BufferCount {
    fn default() -> Self {
        Self::DOUBLE
    }
}

/// Clock settings of a performance profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockProfile {
    /// System clock
    pub cpu_clock_hz: u32,
    /// Link clock for commands and initialization
    pub link_speed_init_hz: u32,
    /// Link clock for bulk pixel transfers
    pub link_speed_fast_hz: u32,
}

/// Performance profile
///
/// Fast link clocks need short wires; `High` is the fastest profile
/// that has been stable on a breadboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PerformanceProfile {
    /// 240 MHz CPU, 60 MHz link (~65 fps at 320x240 RGB565)
    Stable,
    /// 270 MHz CPU, 67.5 MHz link
    Balanced,
    /// 160 MHz CPU, 80 MHz link
    Turbo,
    /// 190 MHz CPU, 95 MHz link (~103 fps)
    #[default]
    High,
    /// 220 MHz CPU, 110 MHz link (needs wires under 5 cm)
    Max,
    /// 266 MHz CPU, 133 MHz link
    Extreme,
}

impl PerformanceProfile {
    /// Clock settings for this profile
    pub const fn clocks(self) -> ClockProfile {
        let (cpu_mhz, fast_hz) = match self {
            PerformanceProfile::Stable => (240, 60_000_000),
            PerformanceProfile::Balanced => (270, 67_500_000),
            PerformanceProfile::Turbo => (160, 80_000_000),
            PerformanceProfile::High => (190, 95_000_000),
            PerformanceProfile::Max => (220, 110_000_000),
            PerformanceProfile::Extreme => (266, 133_000_000),
        };
        ClockProfile {
            cpu_clock_hz: cpu_mhz * 1_000_000,
            link_speed_init_hz: LINK_INIT_HZ,
            link_speed_fast_hz: fast_hz,
        }
    }
}

/// How RGB332 surfaces are expanded to RGB565 at the transfer boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExpansionMode {
    /// Expand the whole frame into one `w*h*2` buffer; the transfer is asynchronous
    Frame,
    /// Stream through two buffers of this many lines each; `present` returns
    /// once the last chunk is in flight
    Lines(u16),
}

impl Default for ExpansionMode {
    fn default() -> Self {
        ExpansionMode::Frame
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Panel width in pixels
    pub width: u16,
    /// Panel height in pixels
    pub height: u16,
    /// Pixel format of the surfaces
    pub pixel_format: PixelFormat,
    /// Number of surfaces in the swap chain
    pub buffer_count: BufferCount,
    /// CPU and link clocks
    pub profile: PerformanceProfile,
    /// RGB332 expansion strategy (ignored for other formats)
    pub expansion: ExpansionMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            pixel_format: PixelFormat::Rgb565,
            buffer_count: BufferCount::DOUBLE,
            profile: PerformanceProfile::High,
            expansion: ExpansionMode::Frame,
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroSize);
        }
        let pixels = self.width as usize * self.height as usize;
        if self.pixel_format == PixelFormat::Rgb444 && pixels % 2 != 0 {
            return Err(ConfigError::OddPixelCount);
        }
        if self.expansion == ExpansionMode::Lines(0) {
            return Err(ConfigError::ZeroExpansionLines);
        }
        Ok(())
    }

    /// Clock settings of the selected profile
    pub const fn clocks(&self) -> ClockProfile {
        self.profile.clocks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_count_range() {
        assert_eq!(BufferCount::new(0), Err(ConfigError::BufferCount(0)));
        assert_eq!(BufferCount::new(1).map(BufferCount::get), Ok(1));
        assert_eq!(BufferCount::new(3).map(BufferCount::get), Ok(3));
        assert_eq!(BufferCount::new(4), Err(ConfigError::BufferCount(4)));
    }

    #[test]
    fn test_profile_clocks() {
        let high = PerformanceProfile::High.clocks();
        assert_eq!(high.cpu_clock_hz, 190_000_000);
        assert_eq!(high.link_speed_init_hz, 10_000_000);
        assert_eq!(high.link_speed_fast_hz, 95_000_000);

        let extreme = PerformanceProfile::Extreme.clocks();
        assert_eq!(extreme.link_speed_fast_hz, 133_000_000);

        // Default profile is High
        assert_eq!(PerformanceProfile::default(), PerformanceProfile::High);
    }

    #[test]
    fn test_validate() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));

        let zero = EngineConfig {
            width: 0,
            ..EngineConfig::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroSize));

        let odd = EngineConfig {
            width: 3,
            height: 3,
            pixel_format: PixelFormat::Rgb444,
            ..EngineConfig::default()
        };
        assert_eq!(odd.validate(), Err(ConfigError::OddPixelCount));

        // Odd pixel count is fine for byte-per-pixel formats
        let odd_332 = EngineConfig {
            pixel_format: PixelFormat::Rgb332,
            ..odd
        };
        assert_eq!(odd_332.validate(), Ok(()));

        let no_lines = EngineConfig {
            pixel_format: PixelFormat::Rgb332,
            expansion: ExpansionMode::Lines(0),
            ..EngineConfig::default()
        };
        assert_eq!(no_lines.validate(), Err(ConfigError::ZeroExpansionLines));
    }
}
