//! embedded-graphics integration
//!
//! Lets text and overlay code draw into a surface with the
//! embedded-graphics primitives and fonts.

use core::convert::Infallible;

use embedded_graphics_core::draw_target::DrawTarget;
use embedded_graphics_core::geometry::{OriginDimensions, Size};
use embedded_graphics_core::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics_core::pixelcolor::Rgb565;
use embedded_graphics_core::primitives::Rectangle;
use embedded_graphics_core::Pixel;

use super::Surface;

#[inline]
fn raw(color: Rgb565) -> u16 {
    RawU16::from(color).into_inner()
}

impl OriginDimensions for Surface {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Surface {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.draw_pixel(point.x, point.y, raw(color));
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let w = i32::try_from(area.size.width).unwrap_or(i32::MAX);
        let h = i32::try_from(area.size.height).unwrap_or(i32::MAX);
        self.draw_rect(area.top_left.x, area.top_left.y, w, h, raw(color));
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        Surface::clear(self, raw(color));
        Ok(())
    }
}
