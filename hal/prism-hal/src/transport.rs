//! Panel link abstraction
//!
//! A transport moves command and pixel bytes to the panel. Two variants
//! exist on the RP2040: a PIO state machine running a shift-register loop
//! (bit-clocked link) and the hardware SPI block fed by DMA. Both keep two
//! clock divisors, a conservative one for command framing during panel
//! bring-up and a fast one for bulk pixel streaming.

/// Link clock selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkSpeed {
    /// Slow divisor used for commands and panel initialization
    Init,
    /// Fast divisor used for bulk pixel transfers
    Fast,
}

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// A bulk transfer is still in flight
    Busy,
    /// The underlying peripheral driver rejected a write
    Bus,
}

/// Panel link
pub trait Transport {
    /// Configure pins, load the link program and claim the DMA channel
    ///
    /// Leaves the link idle at [`LinkSpeed::Init`].
    fn init(&mut self, init_hz: u32, fast_hz: u32);

    /// Switch the clock divisor
    ///
    /// Fails with [`LinkError::Busy`] while a bulk transfer is running.
    fn set_speed(&mut self, speed: LinkSpeed) -> Result<(), LinkError>;

    /// Currently selected clock
    fn speed(&self) -> LinkSpeed;

    /// Configured bit rate for a clock selection in Hz
    fn frequency_hz(&self, speed: LinkSpeed) -> u32;

    /// Send one command byte (D/C low) and wait for it to leave the wire
    fn send_cmd(&mut self, cmd: u8) -> Result<(), LinkError>;

    /// Send one data byte (D/C high) and wait for it to leave the wire
    fn send_data8(&mut self, data: u8) -> Result<(), LinkError>;

    /// Start an asynchronous bulk transfer of `data` (D/C high)
    ///
    /// Returns immediately. Chip select stays asserted until [`wait`]
    /// observes completion.
    ///
    /// # Safety
    ///
    /// The DMA engine reads `data` after this call returns. The caller
    /// must keep the memory alive and unmodified until [`wait`] returns.
    ///
    /// [`wait`]: Transport::wait
    #[allow(unsafe_code)]
    unsafe fn send_buffer(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Block until the running bulk transfer has fully left the link
    ///
    /// Returns immediately when the link is idle.
    fn wait(&mut self);

    /// Check whether a bulk transfer is still in flight
    fn is_busy(&self) -> bool;

    /// Send `data` as a bulk transfer and wait for completion
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), LinkError> {
        // SAFETY: `data` stays borrowed until `wait` returns below.
        #[allow(unsafe_code)]
        unsafe {
            self.send_buffer(data)?;
        }
        self.wait();
        Ok(())
    }
}
