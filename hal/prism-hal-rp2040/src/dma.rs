//! Raw DMA channel access
//!
//! The embassy DMA futures tie a transfer to a borrow of its buffer. The
//! panel link and the fill engine hand buffers over across calls instead,
//! so they program the channel registers directly.

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_rp::dma::{AnyChannel, Channel};
use embassy_rp::pac;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::Peri;

/// DREQ for PIO0 TX FIFO of state machine 0 (add the SM index)
pub const DREQ_PIO0_TX0: u8 = 0;
/// DREQ for SPI0 TX
pub const DREQ_SPI0_TX: u8 = 16;

/// One transfer description
pub struct TransferConfig {
    pub read: u32,
    pub write: u32,
    pub count: u32,
    pub size: DataSize,
    pub incr_read: bool,
    pub incr_write: bool,
    /// `None` runs unpaced
    pub dreq: Option<u8>,
    pub high_priority: bool,
}

/// Exclusively owned DMA channel
pub struct RawChannel<'d> {
    ch: Peri<'d, AnyChannel>,
}

impl<'d> RawChannel<'d> {
    pub fn new(ch: Peri<'d, AnyChannel>) -> Self {
        Self { ch }
    }

    fn regs(&self) -> pac::dma::Channel {
        pac::DMA.ch(self.ch.number() as usize)
    }

    /// Program and trigger the channel
    ///
    /// # Safety
    ///
    /// `read` and `write` must stay valid for `count` elements until the
    /// channel is no longer busy.
    #[allow(unsafe_code)]
    pub unsafe fn start(&mut self, t: &TransferConfig) {
        let n = self.ch.number();
        let regs = self.regs();
        regs.read_addr().write_value(t.read);
        regs.write_addr().write_value(t.write);
        regs.trans_count().write_value(t.count);
        compiler_fence(Ordering::SeqCst);
        regs.ctrl_trig().write(|w| {
            w.set_treq_sel(t.dreq.map_or(TreqSel::PERMANENT, TreqSel::from));
            w.set_data_size(t.size);
            w.set_incr_read(t.incr_read);
            w.set_incr_write(t.incr_write);
            w.set_high_priority(t.high_priority);
            // Chaining to itself disables chaining
            w.set_chain_to(n);
            w.set_en(true);
        });
        compiler_fence(Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.regs().ctrl_trig().read().busy()
    }

    pub fn wait(&self) {
        while self.is_busy() {}
        compiler_fence(Ordering::SeqCst);
    }
}
