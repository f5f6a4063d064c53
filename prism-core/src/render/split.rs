//! Dual-core surface clear

use prism_hal::WordFill;

use super::{JobKind, RenderError, RenderJob, RenderService, SurfaceRegion};
use crate::pixel::FillPattern;
use crate::surface::Surface;

/// Word fill done with CPU stores
///
/// Used where no spare DMA channel exists and on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuFill;

impl WordFill for CpuFill {
    #[allow(unsafe_code)]
    unsafe fn start(&mut self, dst: &mut [u32], word: u32) {
        dst.fill(word);
    }

    fn wait(&mut self) {}

    fn is_busy(&self) -> bool {
        false
    }
}

impl RenderService<'_> {
    /// Clear `surface` with both cores
    ///
    /// The surface is split at [`Surface::split_offset`]. The worker fills
    /// the upper part while this core fills the lower part, through `fill`
    /// for single-word patterns and with CPU stores for the RGB444 cycle.
    pub fn clear_split(
        &mut self,
        surface: &mut Surface,
        color: u16,
        fill: &mut (impl WordFill + ?Sized),
    ) -> Result<(), RenderError> {
        let pattern = FillPattern::new(color, surface.format());
        let offset = surface.split_offset();
        let (head, region) = SurfaceRegion::split(surface, offset)?;
        let job = RenderJob {
            kind: JobKind::Clear(pattern),
            region,
        };
        self.scope(job, || match pattern {
            FillPattern::Word(word) => fill.fill(head, word),
            FillPattern::Triple(_) => pattern.apply(head),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::mock::FakeClock;
    use crate::pixel::PixelFormat;
    use crate::render::{run_worker, RenderLink};

    /// Fill that records what it was asked to do
    #[derive(Default)]
    struct CountingFill {
        words: usize,
        calls: usize,
    }

    impl WordFill for CountingFill {
        #[allow(unsafe_code)]
        unsafe fn start(&mut self, dst: &mut [u32], word: u32) {
            self.words += dst.len();
            self.calls += 1;
            dst.fill(word);
        }

        fn wait(&mut self) {}

        fn is_busy(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_split_clear_matches_single_pass() {
        let link = RenderLink::new();
        let sizes = [(320, 240), (10, 3), (7, 3), (2, 1)];

        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(1)));
            let mut service = RenderService::new(&link);

            for format in [PixelFormat::Rgb565, PixelFormat::Rgb444, PixelFormat::Rgb332] {
                for (w, h) in sizes {
                    if format == PixelFormat::Rgb444 && (w as u32 * h as u32) % 2 != 0 {
                        continue;
                    }
                    let mut split = Surface::new(w, h, format).unwrap();
                    let mut whole = Surface::new(w, h, format).unwrap();

                    service
                        .clear_split(&mut split, 0xA5C3, &mut CpuFill)
                        .unwrap();
                    whole.clear(0xA5C3);
                    assert_eq!(split.bytes(), whole.bytes(), "{:?} {}x{}", format, w, h);
                }
            }
            service.shutdown().unwrap();
        });
    }

    #[test]
    fn test_rgb444_split_point_on_pattern_boundary() {
        let link = RenderLink::new();
        let mut surface = Surface::new(320, 240, PixelFormat::Rgb444).unwrap();
        let offset = surface.split_offset();
        assert_eq!(offset % 12, 0);

        let mut fill = CountingFill::default();
        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(1)));
            let mut service = RenderService::new(&link);
            service
                .clear_split(&mut surface, 0x0F0F, &mut fill)
                .unwrap();
            service.shutdown().unwrap();
        });

        // The three-word cycle is written by the CPU, never the word fill
        assert_eq!(fill.calls, 0);
        let unit = crate::pixel::pack(0x0F0F, PixelFormat::Rgb444);
        for (i, b) in surface.bytes().iter().enumerate() {
            assert_eq!(*b, unit.as_bytes()[i % 3]);
        }
    }

    #[test]
    fn test_word_formats_use_fill_engine_for_lower_half() {
        let link = RenderLink::new();
        let mut surface = Surface::new(320, 240, PixelFormat::Rgb565).unwrap();
        let mut fill = CountingFill::default();

        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(1)));
            let mut service = RenderService::new(&link);
            service.clear_split(&mut surface, 0xFFFF, &mut fill).unwrap();
            assert_eq!(service.jobs(), 1);
            service.shutdown().unwrap();
        });

        assert_eq!(fill.calls, 1);
        assert_eq!(fill.words, 76_800 / 4);
        assert!(surface.bytes().iter().all(|&b| b == 0xFF));
    }
}
