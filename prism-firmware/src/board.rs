//! Board wiring and engine settings
//!
//! Panel on PIO0 SM0:
//!
//! | Signal | GPIO |
//! |--------|------|
//! | SCK    | 18   |
//! | MOSI   | 19   |
//! | CS     | 17   |
//! | D/C    | 21   |
//! | RESET  | 20   |
//! | BL     | 22   |
//!
//! DMA channel 0 feeds the link, channel 1 is the memory fill engine.

use prism_core::{BufferCount, EngineConfig, ExpansionMode, PerformanceProfile, PixelFormat};

/// Heap for surfaces and the expansion buffers
pub const HEAP_SIZE: usize = 192 * 1024;

/// Core 1 stack for the render worker
pub const CORE1_STACK_SIZE: usize = 4096;

/// 320x240 ILI9341 at 8 bits per pixel, double buffered
///
/// Two RGB332 surfaces plus 20-line expansion halves fit the heap with
/// room to spare; RGB565 double buffering would not.
pub fn engine_config() -> EngineConfig {
    EngineConfig {
        width: 320,
        height: 240,
        pixel_format: PixelFormat::Rgb332,
        buffer_count: BufferCount::DOUBLE,
        profile: PerformanceProfile::High,
        expansion: ExpansionMode::Lines(20),
    }
}
