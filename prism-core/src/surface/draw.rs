//! Drawing primitives
//!
//! Every primitive clips against the surface; off-surface coordinates are
//! silently dropped. Application drawing and overlays go through the same
//! calls.

use super::Surface;
use crate::pixel::{pack_rgb332, pack_rgb444_pair, PixelFormat};

impl Surface {
    /// Set one pixel
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u16) {
        if self.in_bounds(x, y) {
            self.put(x as usize, y as usize, color);
        }
    }

    /// Fill a rectangle
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u16) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for row in y0..y1 {
            self.fill_span(row as usize, x0 as usize, x1 as usize, color);
        }
    }

    /// Fill a circle of radius `radius` centred on `(cx, cy)`
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u16) {
        circle_spans(cx, cy, radius, |x, y, w| self.draw_rect(x, y, w, 1, color));
    }

    /// Draw a one-pixel line (Bresenham)
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        if x0.max(x1) < 0 || y0.max(y1) < 0 || x0.min(x1) >= w || y0.min(y1) >= h {
            return;
        }

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            if x >= 0 && y >= 0 && x < w && y < h {
                self.put(x as usize, y as usize, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            // Both coordinates move monotonically; once past an edge the
            // line never comes back
            if (sx > 0 && x >= w) || (sx < 0 && x < 0) || (sy > 0 && y >= h) || (sy < 0 && y < 0) {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Fill pixels `x0..x1` of row `y` (already clipped)
    fn fill_span(&mut self, y: usize, x0: usize, x1: usize, color: u16) {
        let row = y * self.width as usize;
        let (start, end) = (row + x0, row + x1);
        match self.format {
            PixelFormat::Rgb565 => {
                let px = color.to_be_bytes();
                for chunk in self.bytes_mut()[start * 2..end * 2].chunks_exact_mut(2) {
                    chunk.copy_from_slice(&px);
                }
            }
            PixelFormat::Rgb332 => {
                self.bytes_mut()[start..end].fill(pack_rgb332(color));
            }
            PixelFormat::Rgb444 => {
                let mut i = start;
                if i % 2 == 1 {
                    self.put_index(i, color);
                    i += 1;
                }
                // Whole pairs as three-byte stores
                let pairs = (end - i) / 2;
                if pairs > 0 {
                    let unit = pack_rgb444_pair(color, color);
                    let base = i / 2 * 3;
                    for chunk in self.bytes_mut()[base..base + pairs * 3].chunks_exact_mut(3) {
                        chunk.copy_from_slice(&unit);
                    }
                    i += pairs * 2;
                }
                if i < end {
                    self.put_index(i, color);
                }
            }
        }
    }

    fn put_index(&mut self, index: usize, color: u16) {
        let w = self.width as usize;
        self.put(index % w, index / w, color);
    }
}

/// Span coordinates are clamped to this range, which lies outside any
/// `u16`-sized surface on both ends
const SPAN_LIMIT: i64 = 1 << 17;

fn fit(v: i64) -> i32 {
    v.clamp(-1, SPAN_LIMIT) as i32
}

/// Horizontal spans `(x, y, width)` covering a filled circle
///
/// Midpoint walk over one octant; rows near the equator may be emitted
/// more than once. Spans are clamped, so callers clipping to a `u16`
/// surface see the same pixels for any centre and radius.
pub(crate) fn circle_spans(cx: i32, cy: i32, radius: i32, mut span: impl FnMut(i32, i32, i32)) {
    if radius < 0 {
        return;
    }
    let (cx, cy, r) = (cx as i64, cy as i64, radius as i64);
    if cx + r < 0 || cy + r < 0 || cx - r > SPAN_LIMIT || cy - r > SPAN_LIMIT {
        return;
    }
    let mut emit = |x0: i64, y: i64, x1: i64| {
        let (a, b) = (fit(x0), fit(x1));
        span(a, fit(y), b - a);
    };
    let mut x = r;
    let mut y = 0i64;
    let mut err = 0i64;
    while x >= y {
        emit(cx - x, cy + y, cx + x + 1);
        emit(cx - x, cy - y, cx + x + 1);
        emit(cx - y, cy + x, cx + y + 1);
        emit(cx - y, cy - x, cx + y + 1);
        y += 1;
        err += 1 + 2 * y;
        if 2 * (err - x) + 1 > 0 {
            x -= 1;
            err += 1 - 2 * x;
        }
    }
}
