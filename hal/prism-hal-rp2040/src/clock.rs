//! Microsecond clock

use embassy_time::Instant;
use prism_hal::Clock;

/// Reads the embassy time driver (RP2040 TIMER, 1 MHz)
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u32 {
        Instant::now().as_micros() as u32
    }
}
