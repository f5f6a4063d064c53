//! PIO bit-clocked panel link
//!
//! A two-instruction program shifts one bit per pair of instructions:
//! MOSI changes with SCK low and is sampled on the rising edge. Autopull
//! takes 8 bits from the top of each FIFO word, so DMA byte writes (which
//! the bus replicates across all lanes) feed the state machine directly.
//!
//! The bit rate is `clk_sys / (2 * divider)`, so each link speed maps to
//! one clock divider and switching speed is a single register write.
//!
//! CS and D/C are plain GPIOs driven by the CPU around each transfer.

use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::dma::AnyChannel;
use embassy_rp::gpio::{Drive, Level, Output, Pin, SlewRate};
use embassy_rp::pac;
use embassy_rp::pac::dma::vals::DataSize;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, FifoJoin, PioPin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_rp::Peri;
use fixed::types::U24F8;
use prism_hal::{LinkError, LinkSpeed, Transport};

use crate::dma::{RawChannel, TransferConfig, DREQ_PIO0_TX0};

/// PIO clock instructions per bit
const CYCLES_PER_BIT: u32 = 2;

/// Clock divider giving `bit_hz` from `sys_hz`
///
/// Clamped to the hardware range (1.0 to 65535 + 255/256).
pub fn calc_clock_divider(sys_hz: u32, bit_hz: u32) -> U24F8 {
    if bit_hz == 0 {
        return U24F8::from_bits(0xFFFF_FF);
    }
    let bits = (sys_hz as u64 * 256) / (bit_hz as u64 * CYCLES_PER_BIT as u64);
    U24F8::from_bits(bits.clamp(256, 0xFFFF_FF) as u32)
}

/// Bit rate actually produced by `divider`
pub fn divided_rate(sys_hz: u32, divider: U24F8) -> u32 {
    let bits = divider.to_bits().max(1) as u64;
    ((sys_hz as u64 * 256) / (bits * CYCLES_PER_BIT as u64)) as u32
}

/// Panel link on PIO0
pub struct PioTransport<'d, const SM: usize> {
    sm: StateMachine<'d, PIO0, SM>,
    dma: RawChannel<'d>,
    cs: Output<'d>,
    dc: Output<'d>,
    div_init: U24F8,
    div_fast: U24F8,
    speed: LinkSpeed,
    sys_hz: u32,
    busy: bool,
}

impl<'d, const SM: usize> PioTransport<'d, SM> {
    /// Load the shift program and claim the pins
    ///
    /// The state machine is configured at the slowest divider until
    /// [`Transport::init`] supplies the real rates.
    pub fn new<SCK: PioPin, MOSI: PioPin, CS: Pin, DC: Pin>(
        common: &mut Common<'d, PIO0>,
        mut sm: StateMachine<'d, PIO0, SM>,
        sck: Peri<'d, SCK>,
        mosi: Peri<'d, MOSI>,
        cs: Peri<'d, CS>,
        dc: Peri<'d, DC>,
        dma: Peri<'d, AnyChannel>,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".side_set 1",
            ".wrap_target",
            "out pins, 1 side 0",
            "nop side 1",
            ".wrap"
        );
        let installed = common.load_program(&prg.program);

        let mut sck = common.make_pio_pin(sck);
        let mut mosi = common.make_pio_pin(mosi);
        for pin in [&mut sck, &mut mosi] {
            pin.set_drive_strength(Drive::_12mA);
            pin.set_slew_rate(SlewRate::Fast);
        }

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[&sck]);
        cfg.set_out_pins(&[&mosi]);
        cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 8,
            direction: ShiftDirection::Left,
        };
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.clock_divider = U24F8::from_bits(0xFFFF_FF);
        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[&sck, &mosi]);
        sm.set_enable(true);

        let mut cs = Output::new(cs, Level::High);
        cs.set_drive_strength(Drive::_12mA);
        cs.set_slew_rate(SlewRate::Fast);
        let dc = Output::new(dc, Level::High);

        Self {
            sm,
            dma: RawChannel::new(dma),
            cs,
            dc,
            div_init: U24F8::from_bits(0xFFFF_FF),
            div_fast: U24F8::from_bits(0xFFFF_FF),
            speed: LinkSpeed::Init,
            sys_hz: clk_sys_freq(),
            busy: false,
        }
    }

    fn tx_empty(&self) -> bool {
        pac::PIO0.fstat().read().txempty() & (1 << SM) != 0
    }

    /// Block until the FIFO is empty and the last bit has been shifted
    fn wait_idle(&mut self) {
        while !self.tx_empty() {}
        // The stall flag re-asserts as soon as the program blocks on an
        // empty FIFO with nothing left in the shift register.
        let fdebug = pac::PIO0.fdebug();
        fdebug.write(|w| w.set_txstall(1 << SM));
        while fdebug.read().txstall() & (1 << SM) == 0 {}
    }

    /// Finish a drained transfer, or report one still running
    fn settle(&mut self) -> Result<(), LinkError> {
        if self.is_busy() {
            return Err(LinkError::Busy);
        }
        // DMA done and FIFO empty; release CS once the last bits are out
        self.wait();
        Ok(())
    }

    fn send_byte(&mut self, byte: u8, data: bool) -> Result<(), LinkError> {
        self.settle()?;
        self.dc.set_level(Level::from(data));
        self.cs.set_low();
        self.sm.tx().push((byte as u32) << 24);
        self.wait_idle();
        self.cs.set_high();
        Ok(())
    }
}

impl<const SM: usize> Transport for PioTransport<'_, SM> {
    fn init(&mut self, init_hz: u32, fast_hz: u32) {
        self.wait();
        self.sys_hz = clk_sys_freq();
        self.div_init = calc_clock_divider(self.sys_hz, init_hz);
        self.div_fast = calc_clock_divider(self.sys_hz, fast_hz);
        self.sm.set_clock_divider(self.div_init);
        self.speed = LinkSpeed::Init;
    }

    fn set_speed(&mut self, speed: LinkSpeed) -> Result<(), LinkError> {
        self.settle()?;
        let div = match speed {
            LinkSpeed::Init => self.div_init,
            LinkSpeed::Fast => self.div_fast,
        };
        self.sm.set_clock_divider(div);
        self.speed = speed;
        Ok(())
    }

    fn speed(&self) -> LinkSpeed {
        self.speed
    }

    fn frequency_hz(&self, speed: LinkSpeed) -> u32 {
        let div = match speed {
            LinkSpeed::Init => self.div_init,
            LinkSpeed::Fast => self.div_fast,
        };
        divided_rate(self.sys_hz, div)
    }

    fn send_cmd(&mut self, cmd: u8) -> Result<(), LinkError> {
        self.send_byte(cmd, false)
    }

    fn send_data8(&mut self, data: u8) -> Result<(), LinkError> {
        self.send_byte(data, true)
    }

    #[allow(unsafe_code)]
    unsafe fn send_buffer(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.settle()?;
        if data.is_empty() {
            return Ok(());
        }
        self.dc.set_high();
        self.cs.set_low();
        let t = TransferConfig {
            read: data.as_ptr() as u32,
            // Byte lane 3 of the TX FIFO register
            write: pac::PIO0.txf(SM).as_ptr() as u32 + 3,
            count: data.len() as u32,
            size: DataSize::SIZE_BYTE,
            incr_read: true,
            incr_write: false,
            dreq: Some(DREQ_PIO0_TX0 + SM as u8),
            high_priority: true,
        };
        // SAFETY: the caller keeps `data` alive and unmodified until `wait`.
        unsafe { self.dma.start(&t) };
        self.busy = true;
        Ok(())
    }

    fn wait(&mut self) {
        if !self.busy {
            return;
        }
        self.dma.wait();
        self.wait_idle();
        self.cs.set_high();
        self.busy = false;
    }

    fn is_busy(&self) -> bool {
        self.busy && (self.dma.is_busy() || !self.tx_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_divider() {
        // 190 MHz system clock, 95 MHz link: one cycle per instruction
        let div = calc_clock_divider(190_000_000, 95_000_000);
        assert_eq!(div.to_bits(), 256);
        assert_eq!(divided_rate(190_000_000, div), 95_000_000);

        // 10 MHz init rate: 9.5
        let div = calc_clock_divider(190_000_000, 10_000_000);
        assert_eq!(div.to_bits(), 9 * 256 + 128);
    }

    #[test]
    fn test_clock_divider_clamps() {
        // Faster than half the system clock is not reachable
        assert_eq!(calc_clock_divider(125_000_000, 125_000_000).to_bits(), 256);
        assert_eq!(calc_clock_divider(125_000_000, 0).to_bits(), 0xFFFF_FF);
    }
}
