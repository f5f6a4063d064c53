//! RP2040 implementations of the Prism HAL traits
//!
//! - [`pio::PioTransport`] - bit-clocked panel link on a PIO state machine
//! - [`spi::SpiDmaTransport`] - hardware SPI0 fed by DMA
//! - [`fill::DmaFill`] - DMA 32-bit memory fill
//! - [`clock::EmbassyClock`] - microsecond counter from the embassy time driver
//! - [`gpio::GpioOut`] - reset and backlight outputs

#![no_std]

pub mod clock;
pub mod dma;
pub mod fill;
pub mod gpio;
pub mod pio;
pub mod spi;

pub use clock::EmbassyClock;
pub use fill::DmaFill;
pub use gpio::GpioOut;
pub use pio::PioTransport;
pub use spi::SpiDmaTransport;
