//! Frame statistics
//!
//! Frame times are accumulated over a fixed window; at the end of each
//! window a [`FrameStats`] snapshot is published and the accumulators
//! restart. Core 0 usage is the share of the window not spent blocked on
//! the link, core 1 usage the share the render worker was busy.

use crate::pixel::PixelFormat;

/// Length of one statistics window
pub const PROFILE_WINDOW_US: u32 = 500_000;

/// Snapshot published once per window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    pub fps: u32,
    pub core0_usage_pct: u8,
    pub core1_usage_pct: u8,
    pub cpu_hz: u32,
    pub link_hz: u32,
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
}

/// Rolling frame-time accumulator
pub struct FrameProfiler {
    frames: u32,
    elapsed_us: u32,
    window_us: u32,
    last: Option<FrameStats>,
    cpu_hz: u32,
    link_hz: u32,
    width: u16,
    height: u16,
    format: PixelFormat,
}

impl FrameProfiler {
    pub fn new(cpu_hz: u32, link_hz: u32, width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            frames: 0,
            elapsed_us: 0,
            window_us: PROFILE_WINDOW_US,
            last: None,
            cpu_hz,
            link_hz,
            width,
            height,
            format,
        }
    }

    /// Use a different window length (mainly for tests)
    pub fn with_window(mut self, window_us: u32) -> Self {
        self.window_us = window_us.max(1);
        self
    }

    /// Record one frame
    ///
    /// `wait_us` and `core1_busy_us` are totals since the last published
    /// snapshot. Returns the new snapshot when the window closes; the
    /// caller then resets its own wait and busy counters.
    pub fn update(&mut self, frame_us: u32, wait_us: u32, core1_busy_us: u32) -> Option<FrameStats> {
        self.frames = self.frames.saturating_add(1);
        self.elapsed_us = self.elapsed_us.saturating_add(frame_us);
        if self.elapsed_us < self.window_us {
            return None;
        }

        let elapsed = self.elapsed_us as u64;
        let stats = FrameStats {
            fps: (self.frames as u64 * 1_000_000 / elapsed) as u32,
            core0_usage_pct: percent(elapsed.saturating_sub(wait_us as u64), elapsed),
            core1_usage_pct: percent(core1_busy_us as u64, elapsed),
            cpu_hz: self.cpu_hz,
            link_hz: self.link_hz,
            width: self.width,
            height: self.height,
            format: self.format,
        };

        self.frames = 0;
        self.elapsed_us = 0;
        self.last = Some(stats);
        Some(stats)
    }

    /// Most recent snapshot
    pub fn stats(&self) -> Option<FrameStats> {
        self.last
    }
}

fn percent(part: u64, whole: u64) -> u8 {
    (part.min(whole) * 100 / whole) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiler() -> FrameProfiler {
        FrameProfiler::new(190_000_000, 95_000_000, 320, 240, PixelFormat::Rgb565)
    }

    #[test]
    fn test_publishes_once_per_window() {
        let mut p = profiler();
        // 10 ms frames: the 50th closes the window
        for _ in 0..49 {
            assert_eq!(p.update(10_000, 0, 0), None);
        }
        let stats = p.update(10_000, 100_000, 250_000).unwrap();
        assert_eq!(stats.fps, 100);
        assert_eq!(stats.core0_usage_pct, 80);
        assert_eq!(stats.core1_usage_pct, 50);
        assert_eq!(stats.link_hz, 95_000_000);
        assert_eq!(p.stats(), Some(stats));

        // Accumulators restart
        assert_eq!(p.update(10_000, 0, 0), None);
    }

    #[test]
    fn test_usage_is_clamped() {
        let mut p = profiler().with_window(1_000);
        let stats = p.update(1_000, 5_000, 9_000).unwrap();
        assert_eq!(stats.core0_usage_pct, 0);
        assert_eq!(stats.core1_usage_pct, 100);
        assert_eq!(stats.fps, 1_000);
    }
}
