//! Render jobs

use crate::pixel::{FillPattern, PixelFormat};
use crate::surface::Surface;

use super::RenderError;

/// Tail of a surface lent to the worker
///
/// Starts at a split-aligned byte offset and runs to the end of the
/// surface's storage.
pub struct SurfaceRegion<'a> {
    words: &'a mut [u32],
    byte_offset: usize,
    len_bytes: usize,
    width: u16,
    height: u16,
    format: PixelFormat,
}

impl<'a> SurfaceRegion<'a> {
    /// Split `surface` at `byte_offset`
    ///
    /// Returns the words before the split and the region after it. The
    /// offset must be a multiple of the format's split alignment.
    pub fn split(
        surface: &'a mut Surface,
        byte_offset: usize,
    ) -> Result<(&'a mut [u32], SurfaceRegion<'a>), RenderError> {
        let format = surface.format();
        if byte_offset % format.split_alignment() != 0 || byte_offset > surface.size_bytes() {
            return Err(RenderError::Misaligned);
        }
        let (width, height, size) = (surface.width(), surface.height(), surface.size_bytes());
        let (head, tail) = surface.words_mut().split_at_mut(byte_offset / 4);
        Ok((
            head,
            SurfaceRegion {
                words: tail,
                byte_offset,
                len_bytes: size - byte_offset,
                width,
                height,
                format,
            },
        ))
    }

    /// Byte offset of the region within its surface
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Pixel bytes of the region
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut *self.words)[..self.len_bytes]
    }

    /// Backing words (fills may run over the trailing pad bytes)
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut *self.words
    }

    pub(super) fn into_raw(self, kind: JobKind) -> RawJob {
        RawJob {
            kind,
            ptr: self.words.as_mut_ptr(),
            len_words: self.words.len(),
            byte_offset: self.byte_offset,
            len_bytes: self.len_bytes,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }
}

/// What the worker does with a region
#[derive(Clone, Copy)]
pub enum JobKind {
    /// Fill the region with a precomputed word pattern
    Clear(FillPattern),
    /// Run arbitrary drawing code against the region
    Callback(fn(&mut SurfaceRegion<'_>)),
}

/// One unit of cross-core work
pub struct RenderJob<'a> {
    pub kind: JobKind,
    pub region: SurfaceRegion<'a>,
}

impl<'a> RenderJob<'a> {
    pub fn clear(region: SurfaceRegion<'a>, color: u16) -> Self {
        let kind = JobKind::Clear(FillPattern::new(color, region.format));
        Self { kind, region }
    }

    pub fn callback(region: SurfaceRegion<'a>, f: fn(&mut SurfaceRegion<'_>)) -> Self {
        Self {
            kind: JobKind::Callback(f),
            region,
        }
    }
}

/// Completion report sent back by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JobReport {
    /// Time the worker spent on the job
    pub busy_us: u32,
}

/// A job with its borrow erased for the trip across cores
pub(super) struct RawJob {
    kind: JobKind,
    ptr: *mut u32,
    len_words: usize,
    byte_offset: usize,
    len_bytes: usize,
    width: u16,
    height: u16,
    format: PixelFormat,
}

// SAFETY: the submitting core gives up the region until the completion
// report arrives, so exactly one core touches it at a time.
#[allow(unsafe_code)]
unsafe impl Send for RawJob {}

impl RawJob {
    /// Run the job
    ///
    /// # Safety
    ///
    /// The region this job was built from must still be alive and not
    /// accessed by anyone else until the call returns.
    #[allow(unsafe_code)]
    pub(super) unsafe fn execute(self) {
        // SAFETY: upheld by the caller; pointer and length come from a live slice.
        let words = unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len_words) };
        let mut region = SurfaceRegion {
            words,
            byte_offset: self.byte_offset,
            len_bytes: self.len_bytes,
            width: self.width,
            height: self.height,
            format: self.format,
        };
        match self.kind {
            JobKind::Clear(pattern) => pattern.apply(region.words),
            JobKind::Callback(f) => f(&mut region),
        }
    }
}
