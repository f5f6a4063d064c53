//! DMA memory fill
//!
//! A channel reads one fixed word and writes it across the destination
//! with an incrementing address. Core 0 uses it for its half of a split
//! clear.

use embassy_rp::dma::AnyChannel;
use embassy_rp::pac::dma::vals::DataSize;
use embassy_rp::Peri;
use portable_atomic::{AtomicU32, Ordering};
use prism_hal::WordFill;

use crate::dma::{RawChannel, TransferConfig};

/// Source word; must outlive every fill, so it is static
static FILL_WORD: AtomicU32 = AtomicU32::new(0);

pub struct DmaFill<'d> {
    ch: RawChannel<'d>,
}

impl<'d> DmaFill<'d> {
    pub fn new(ch: Peri<'d, AnyChannel>) -> Self {
        Self {
            ch: RawChannel::new(ch),
        }
    }
}

impl WordFill for DmaFill<'_> {
    #[allow(unsafe_code)]
    unsafe fn start(&mut self, dst: &mut [u32], word: u32) {
        self.ch.wait();
        if dst.is_empty() {
            return;
        }
        FILL_WORD.store(word, Ordering::Release);
        let t = TransferConfig {
            read: FILL_WORD.as_ptr() as u32,
            write: dst.as_mut_ptr() as u32,
            count: dst.len() as u32,
            size: DataSize::SIZE_WORD,
            incr_read: false,
            incr_write: true,
            dreq: None,
            high_priority: false,
        };
        // SAFETY: the caller keeps `dst` untouched until `wait`.
        unsafe { self.ch.start(&t) }
    }

    fn wait(&mut self) {
        self.ch.wait();
    }

    fn is_busy(&self) -> bool {
        self.ch.is_busy()
    }
}
