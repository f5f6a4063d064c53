//! Hardware SPI panel link
//!
//! Commands go through the blocking embassy driver; bulk transfers feed
//! SPI0's data register from DMA paced by the TX DREQ.

use embassy_rp::dma::AnyChannel;
use embassy_rp::gpio::{Level, Output, Pin};
use embassy_rp::pac;
use embassy_rp::pac::dma::vals::DataSize;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, ClkPin, Config as SpiConfig, MosiPin, Phase, Polarity, Spi};
use embassy_rp::Peri;
use prism_hal::{LinkError, LinkSpeed, Transport};

use crate::dma::{RawChannel, TransferConfig, DREQ_SPI0_TX};

/// Panel link on SPI0
pub struct SpiDmaTransport<'d> {
    spi: Spi<'d, SPI0, Blocking>,
    dma: RawChannel<'d>,
    cs: Output<'d>,
    dc: Output<'d>,
    init_hz: u32,
    fast_hz: u32,
    speed: LinkSpeed,
    busy: bool,
}

impl<'d> SpiDmaTransport<'d> {
    pub fn new<CS: Pin, DC: Pin>(
        spi: Peri<'d, SPI0>,
        sck: Peri<'d, impl ClkPin<SPI0>>,
        mosi: Peri<'d, impl MosiPin<SPI0>>,
        cs: Peri<'d, CS>,
        dc: Peri<'d, DC>,
        dma: Peri<'d, AnyChannel>,
    ) -> Self {
        let mut config = SpiConfig::default();
        config.phase = Phase::CaptureOnFirstTransition;
        config.polarity = Polarity::IdleLow;

        Self {
            spi: Spi::new_blocking_txonly(spi, sck, mosi, config),
            dma: RawChannel::new(dma),
            cs: Output::new(cs, Level::High),
            dc: Output::new(dc, Level::High),
            init_hz: 0,
            fast_hz: 0,
            speed: LinkSpeed::Init,
            busy: false,
        }
    }

    fn spi_busy(&self) -> bool {
        pac::SPI0.sr().read().bsy()
    }

    fn settle(&mut self) -> Result<(), LinkError> {
        if self.is_busy() {
            return Err(LinkError::Busy);
        }
        self.wait();
        Ok(())
    }

    fn send_byte(&mut self, byte: u8, data: bool) -> Result<(), LinkError> {
        self.settle()?;
        self.dc.set_level(Level::from(data));
        self.cs.set_low();
        let result = self.spi.blocking_write(&[byte]);
        self.cs.set_high();
        result.map_err(|_| LinkError::Bus)
    }
}

impl Transport for SpiDmaTransport<'_> {
    fn init(&mut self, init_hz: u32, fast_hz: u32) {
        self.wait();
        self.init_hz = init_hz;
        self.fast_hz = fast_hz;
        self.spi.set_frequency(init_hz);
        self.speed = LinkSpeed::Init;
    }

    fn set_speed(&mut self, speed: LinkSpeed) -> Result<(), LinkError> {
        self.settle()?;
        self.spi.set_frequency(self.frequency_hz(speed));
        self.speed = speed;
        Ok(())
    }

    fn speed(&self) -> LinkSpeed {
        self.speed
    }

    fn frequency_hz(&self, speed: LinkSpeed) -> u32 {
        match speed {
            LinkSpeed::Init => self.init_hz,
            LinkSpeed::Fast => self.fast_hz,
        }
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
            write: pac::SPI0.dr().as_ptr() as u32,
            count: data.len() as u32,
            size: DataSize::SIZE_BYTE,
            incr_read: true,
            incr_write: false,
            dreq: Some(DREQ_SPI0_TX),
            high_priority: false,
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
        while self.spi_busy() {}
        // Drop what the receiver clocked in during the transfer
        while pac::SPI0.sr().read().rne() {
            let _ = pac::SPI0.dr().read();
        }
        self.cs.set_high();
        self.busy = false;
    }

    fn is_busy(&self) -> bool {
        self.busy && (self.dma.is_busy() || self.spi_busy())
    }
}
