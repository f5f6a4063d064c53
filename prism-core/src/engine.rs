//! Frame loop
//!
//! [`Engine`] ties the swap chain, the optional render worker and the
//! profiler together. Each call to [`Engine::frame`] advances the
//! application, lets it draw into the back surface, presents it and
//! feeds the profiler.

use core::ops::{Deref, DerefMut};

use prism_hal::{Clock, WordFill};

use crate::display::Panel;
use crate::error::EngineError;
use crate::profiler::{FrameProfiler, FrameStats};
use crate::render::RenderService;
use crate::surface::Surface;
use crate::swapchain::SwapChain;

/// Application driven by the engine
pub trait App {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Called once before the first frame
    fn init(&mut self, _width: u16, _height: u16) {}

    /// Advance the simulation by `dt_us`
    fn update(&mut self, dt_us: u32);

    /// Draw the current state into `frame`
    ///
    /// The surface still holds whatever was drawn into this slot last
    /// time; clear it first if the frame is not fully covered.
    fn draw(&mut self, frame: &mut Frame<'_, '_>) -> Result<(), EngineError>;
}

/// Back surface lent to [`App::draw`]
///
/// Dereferences to [`Surface`] for the drawing primitives and adds a
/// clear that is shared with the render worker when one is attached.
pub struct Frame<'a, 'l> {
    surface: &'a mut Surface,
    render: Option<&'a mut RenderService<'l>>,
    fill: &'a mut dyn WordFill,
}

impl<'a, 'l> Frame<'a, 'l> {
    pub fn new(
        surface: &'a mut Surface,
        render: Option<&'a mut RenderService<'l>>,
        fill: &'a mut dyn WordFill,
    ) -> Self {
        Self {
            surface,
            render,
            fill,
        }
    }

    /// Fill the whole surface with `color`
    pub fn clear(&mut self, color: u16) -> Result<(), EngineError> {
        match self.render.as_deref_mut() {
            Some(render) => render.clear_split(self.surface, color, &mut *self.fill)?,
            None => self.surface.clear(color),
        }
        Ok(())
    }
}

impl Deref for Frame<'_, '_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for Frame<'_, '_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

/// Presentation engine context
pub struct Engine<'l, P: Panel, C: Clock, F: WordFill> {
    chain: SwapChain<P, C>,
    render: Option<RenderService<'l>>,
    fill: F,
    profiler: FrameProfiler,
    last_us: u32,
}

impl<'l, P: Panel, C: Clock, F: WordFill> Engine<'l, P, C, F> {
    /// Build the engine around a ready swap chain
    ///
    /// `render` is `None` when no worker core runs; clears then happen
    /// entirely on this core.
    pub fn new(
        chain: SwapChain<P, C>,
        render: Option<RenderService<'l>>,
        fill: F,
        cpu_hz: u32,
    ) -> Self {
        let (width, height, format) = chain.geometry();
        let profiler = FrameProfiler::new(cpu_hz, chain.panel().link_hz(), width, height, format);
        let last_us = chain.clock().now_us();
        Self {
            chain,
            render,
            fill,
            profiler,
            last_us,
        }
    }

    /// Replace the profiler (window length, reported clocks)
    pub fn with_profiler(mut self, profiler: FrameProfiler) -> Self {
        self.profiler = profiler;
        self
    }

    /// Run the application's one-time setup
    pub fn start(&mut self, app: &mut impl App) {
        let (width, height, _) = self.chain.geometry();
        app.init(width, height);
        self.last_us = self.chain.clock().now_us();
    }

    /// Run one frame: update, draw, present, profile
    ///
    /// Returns a statistics snapshot whenever a profiling window closes.
    pub fn frame(&mut self, app: &mut impl App) -> Result<Option<FrameStats>, EngineError> {
        let start = self.chain.clock().now_us();
        let dt = start.wrapping_sub(self.last_us);
        self.last_us = start;

        app.update(dt);
        {
            let surface = self.chain.get_draw_surface()?;
            let mut frame = Frame::new(surface, self.render.as_mut(), &mut self.fill);
            app.draw(&mut frame)?;
        }
        self.chain.present()?;

        let frame_us = self.chain.clock().elapsed_us(start);
        let busy_us = self.render.as_ref().map_or(0, |r| r.busy_us());
        let stats = self.profiler.update(frame_us, self.chain.wait_us(), busy_us);
        if stats.is_some() {
            self.chain.reset_stats();
            if let Some(render) = self.render.as_mut() {
                render.reset_stats();
            }
        }
        Ok(stats)
    }

    /// Clear the current back surface outside of a frame
    pub fn clear(&mut self, color: u16) -> Result<(), EngineError> {
        let surface = self.chain.get_draw_surface()?;
        Frame::new(surface, self.render.as_mut(), &mut self.fill).clear(color)
    }

    /// Block until every presented frame has reached the panel
    pub fn wait_last(&mut self) -> Result<(), EngineError> {
        self.chain.wait_last()?;
        Ok(())
    }

    pub fn chain(&self) -> &SwapChain<P, C> {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut SwapChain<P, C> {
        &mut self.chain
    }

    pub fn render_mut(&mut self) -> Option<&mut RenderService<'l>> {
        self.render.as_mut()
    }

    /// Last published statistics
    pub fn stats(&self) -> Option<FrameStats> {
        self.profiler.stats()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::config::{BufferCount, EngineConfig};
    use crate::display::{DisplayController, PanelConfig};
    use crate::mock::{FakeClock, MockPin, MockTransport};
    use crate::pixel::PixelFormat;
    use crate::render::{run_worker, CpuFill, RenderLink};

    type TestPanel = DisplayController<MockTransport, MockPin, MockPin>;

    fn chain(width: u16, height: u16, format: PixelFormat, step: u32) -> SwapChain<TestPanel, FakeClock> {
        let config = EngineConfig {
            width,
            height,
            pixel_format: format,
            buffer_count: BufferCount::DOUBLE,
            ..EngineConfig::default()
        };
        let panel = DisplayController::new(
            MockTransport::new(),
            MockPin::default(),
            MockPin::default(),
            PanelConfig::new(width, height, format),
        );
        SwapChain::new(panel, FakeClock::new(step), &config).unwrap()
    }

    /// Paints a background and a moving dot
    #[derive(Default)]
    struct Dot {
        x: i32,
        inits: u32,
        updates: u32,
        elapsed_us: u32,
    }

    impl App for Dot {
        fn name(&self) -> &'static str {
            "dot"
        }

        fn init(&mut self, width: u16, _height: u16) {
            self.inits += 1;
            self.x = width as i32 / 2;
        }

        fn update(&mut self, dt_us: u32) {
            self.updates += 1;
            self.elapsed_us += dt_us;
            self.x += 1;
        }

        fn draw(&mut self, frame: &mut Frame<'_, '_>) -> Result<(), EngineError> {
            frame.clear(0x001F)?;
            frame.draw_pixel(self.x, 0, 0xFFFF);
            Ok(())
        }
    }

    #[test]
    fn test_frame_draws_and_presents() {
        let mut engine = Engine::new(chain(16, 4, PixelFormat::Rgb565, 10), None, CpuFill, 190_000_000);
        let mut app = Dot::default();
        engine.start(&mut app);
        assert_eq!(app.inits, 1);
        assert_eq!(app.x, 8);

        for _ in 0..3 {
            assert_eq!(engine.frame(&mut app).unwrap(), None);
        }
        engine.wait_last().unwrap();
        assert_eq!(app.updates, 3);
        assert!(app.elapsed_us > 0);

        let bulks = engine.chain().panel().link().bulks();
        assert_eq!(bulks.len(), 3);
        // Third frame drew the dot at x = 11
        let last = bulks[2].1;
        assert_eq!(&last[22..24], &[0xFF, 0xFF]);
        assert_eq!(&last[..2], &[0x00, 0x1F]);
    }

    #[test]
    fn test_stats_published_and_counters_reset() {
        let profiler =
            FrameProfiler::new(190_000_000, 95_000_000, 16, 4, PixelFormat::Rgb332).with_window(1);
        let mut engine = Engine::new(chain(16, 4, PixelFormat::Rgb332, 1), None, CpuFill, 190_000_000)
            .with_profiler(profiler);
        let mut app = Dot::default();
        engine.start(&mut app);

        let stats = engine.frame(&mut app).unwrap().unwrap();
        assert_eq!(stats.width, 16);
        assert_eq!(stats.height, 4);
        assert_eq!(stats.format, PixelFormat::Rgb332);
        assert_eq!(stats.cpu_hz, 190_000_000);
        assert_eq!(stats.core1_usage_pct, 0);
        assert_eq!(engine.stats(), Some(stats));
        assert_eq!(engine.chain().wait_us(), 0);
    }

    #[test]
    fn test_default_window_reports_panel_link_rate() {
        // Every clock read advances 600 ms, so the first frame closes the window
        let mut engine = Engine::new(chain(8, 2, PixelFormat::Rgb565, 600_000), None, CpuFill, 125_000_000);
        let mut app = Dot::default();
        engine.start(&mut app);

        let stats = engine.frame(&mut app).unwrap().unwrap();
        assert_eq!(stats.link_hz, 95_000_000);
        assert_eq!(stats.cpu_hz, 125_000_000);
    }

    #[test]
    fn test_clear_shared_with_worker() {
        let link = RenderLink::new();
        thread::scope(|s| {
            s.spawn(|| run_worker(&link, &FakeClock::new(2)));

            let service = RenderService::new(&link);
            let mut engine = Engine::new(
                chain(32, 8, PixelFormat::Rgb444, 1),
                Some(service),
                CpuFill,
                190_000_000,
            );
            let mut app = Dot::default();
            engine.start(&mut app);
            engine.frame(&mut app).unwrap();
            engine.wait_last().unwrap();

            let render = engine.render_mut().unwrap();
            assert_eq!(render.jobs(), 1);
            render.shutdown().unwrap();

            let bulks = engine.chain().panel().link().bulks();
            let bytes = bulks[0].1;
            assert_eq!(bytes.len(), 32 * 8 * 3 / 2);
            // Bottom row is entirely background, so the worker's half was cleared
            let unit = crate::pixel::pack(0x001F, PixelFormat::Rgb444);
            assert!(bytes[bytes.len() - 48..]
                .chunks_exact(3)
                .all(|c| c == unit.as_bytes()));
        });
    }

    #[test]
    fn test_engine_clear_without_worker() {
        let mut engine = Engine::new(chain(4, 4, PixelFormat::Rgb565, 1), None, CpuFill, 1);
        engine.clear(0xF800).unwrap();
        let back = engine.chain().back_index();
        assert_eq!(engine.chain().surface(back).unwrap().pixel(3, 3), Some(0xF800));
    }
}
