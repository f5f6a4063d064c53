//! Bufferless drawing
//!
//! Direct mode has no surface: every primitive programs the address
//! window and streams its pixels synchronously. It never touches the swap
//! chain or the render worker. The panel runs in RGB565; RGB332 colors
//! are quantized first so both modes show the same palette. RGB444 pairs
//! cannot be addressed one pixel at a time and are refused.

use super::{DisplayError, Panel, PanelConfig};
use crate::config::ConfigError;
use crate::pixel::{pack_rgb332, unpack_rgb332, PixelFormat};
use crate::surface::circle_spans;

/// Pixels per link burst
const CHUNK_PIXELS: usize = 64;

/// Panel driven without a frame buffer
pub struct DirectPanel<P> {
    panel: P,
    width: u16,
    height: u16,
    format: PixelFormat,
}

impl<P: Panel> DirectPanel<P> {
    pub fn new(panel: P, config: &PanelConfig) -> Result<Self, ConfigError> {
        if config.format == PixelFormat::Rgb444 {
            return Err(ConfigError::UnsupportedDirectFormat);
        }
        Ok(Self {
            panel,
            width: config.width,
            height: config.height,
            format: config.format,
        })
    }

    fn wire_color(&self, color: u16) -> u16 {
        match self.format {
            PixelFormat::Rgb332 => unpack_rgb332(pack_rgb332(color)),
            _ => color,
        }
    }

    pub fn clear(&mut self, color: u16) -> Result<(), DisplayError> {
        self.draw_rect(0, 0, self.width as i32, self.height as i32, color)
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u16) -> Result<(), DisplayError> {
        self.draw_rect(x, y, 1, 1, color)
    }

    /// Fill a rectangle, clipped to the panel
    pub fn draw_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: u16,
    ) -> Result<(), DisplayError> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        self.panel
            .set_window(x0 as u16, y0 as u16, (x1 - 1) as u16, (y1 - 1) as u16)?;
        self.panel.start_bulk()?;

        let px = self.wire_color(color).to_be_bytes();
        let mut chunk = [0u8; CHUNK_PIXELS * 2];
        for c in chunk.chunks_exact_mut(2) {
            c.copy_from_slice(&px);
        }
        let mut remaining = (x1 - x0) as usize * (y1 - y0) as usize;
        while remaining > 0 {
            let n = remaining.min(CHUNK_PIXELS);
            self.panel.write_pixels(&chunk[..n * 2])?;
            remaining -= n;
        }

        self.panel.end_bulk()
    }

    /// Fill a circle, one window per span
    pub fn draw_circle(
        &mut self,
        cx: i32,
        cy: i32,
        radius: i32,
        color: u16,
    ) -> Result<(), DisplayError> {
        let mut result = Ok(());
        circle_spans(cx, cy, radius, |x, y, w| {
            if result.is_ok() {
                result = self.draw_rect(x, y, w, 1, color);
            }
        });
        result
    }

    pub fn release(self) -> P {
        self.panel
    }
}
