//! Panel bring-up and write sessions

use embedded_hal::delay::DelayNs;
use prism_hal::{LinkSpeed, OutputPin, Transport};

use super::commands::{cmd, delay};
use super::{DisplayError, Panel, PanelConfig};
use crate::config::ClockProfile;

/// Panel controller
///
/// Owns the link plus the reset and backlight lines. Create it once at
/// startup, call [`init`](Self::init), then hand it to a swap chain or
/// to direct mode.
pub struct DisplayController<T, RST, BL> {
    link: T,
    reset: RST,
    backlight: BL,
    config: PanelConfig,
}

impl<T, RST, BL> DisplayController<T, RST, BL>
where
    T: Transport,
    RST: OutputPin,
    BL: OutputPin,
{
    pub fn new(link: T, reset: RST, backlight: BL, config: PanelConfig) -> Self {
        Self {
            link,
            reset,
            backlight,
            config,
        }
    }

    /// Configure the link and run the panel bring-up sequence
    ///
    /// Leaves the link at the command rate with the backlight on.
    pub fn init(
        &mut self,
        delay: &mut impl DelayNs,
        clocks: &ClockProfile,
    ) -> Result<(), DisplayError> {
        self.link
            .init(clocks.link_speed_init_hz, clocks.link_speed_fast_hz);

        // Hardware reset pulse
        self.reset.set_low();
        delay.delay_ms(delay::RESET_PULSE_MS);
        self.reset.set_high();
        delay.delay_ms(delay::RESET_SETTLE_MS);

        self.link.set_speed(LinkSpeed::Init)?;

        self.write_command(cmd::SWRESET)?;
        delay.delay_ms(delay::SWRESET_MS);

        self.write_command(cmd::SLPOUT)?;
        delay.delay_ms(delay::SLPOUT_MS);

        self.write_command(cmd::COLMOD)?;
        self.write_data(&[self.config.format.panel_code()])?;

        self.write_command(cmd::MADCTL)?;
        self.write_data(&[self.config.memory_access.bits()])?;

        self.write_command(cmd::DISPON)?;
        delay.delay_ms(delay::DISPON_MS);

        self.backlight.set_high();
        Ok(())
    }

    /// Send one command byte
    ///
    /// When the link sits at a bulk rate above the command limit the byte
    /// goes out at the init rate and the bulk rate is restored afterwards.
    pub fn write_command(&mut self, command: u8) -> Result<(), DisplayError> {
        let throttle = self.link.speed() == LinkSpeed::Fast
            && self.link.frequency_hz(LinkSpeed::Fast) > self.config.command_limit_hz;
        if throttle {
            self.link.wait();
            self.link.set_speed(LinkSpeed::Init)?;
            self.link.send_cmd(command)?;
            self.link.set_speed(LinkSpeed::Fast)?;
        } else {
            self.link.send_cmd(command)?;
        }
        Ok(())
    }

    /// Send parameter bytes one at a time
    pub fn write_data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        for &byte in data {
            self.link.send_data8(byte)?;
        }
        Ok(())
    }

    pub fn set_backlight(&mut self, on: bool) {
        self.backlight.set_state(on);
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn link(&self) -> &T {
        &self.link
    }

    /// Give back the link and control lines
    pub fn release(self) -> (T, RST, BL) {
        (self.link, self.reset, self.backlight)
    }
}

impl<T, RST, BL> Panel for DisplayController<T, RST, BL>
where
    T: Transport,
    RST: OutputPin,
    BL: OutputPin,
{
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        if x0 > x1 || y0 > y1 || x1 >= self.config.width || y1 >= self.config.height {
            return Err(DisplayError::InvalidWindow);
        }
        self.link.set_speed(LinkSpeed::Init)?;

        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        self.write_command(cmd::CASET)?;
        self.write_data(&[x0h, x0l, x1h, x1l])?;

        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.write_command(cmd::RASET)?;
        self.write_data(&[y0h, y0l, y1h, y1l])?;

        self.write_command(cmd::RAMWR)
    }

    fn start_bulk(&mut self) -> Result<(), DisplayError> {
        self.link.set_speed(LinkSpeed::Fast)?;
        Ok(())
    }

    fn end_bulk(&mut self) -> Result<(), DisplayError> {
        self.link.wait();
        self.link.set_speed(LinkSpeed::Init)?;
        Ok(())
    }

    #[allow(unsafe_code)]
    unsafe fn send_buffer(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        // SAFETY: the caller upholds the transport's lending contract.
        unsafe { self.link.send_buffer(data)? };
        Ok(())
    }

    fn wait(&mut self) {
        self.link.wait();
    }

    fn is_busy(&self) -> bool {
        self.link.is_busy()
    }

    fn link_hz(&self) -> u32 {
        self.link.frequency_hz(LinkSpeed::Fast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformanceProfile;
    use crate::mock::{LinkEvent, MockDelay, MockPin, MockTransport};
    use crate::pixel::PixelFormat;

    type Controller = DisplayController<MockTransport, MockPin, MockPin>;

    fn controller(format: PixelFormat) -> Controller {
        DisplayController::new(
            MockTransport::new(),
            MockPin::default(),
            MockPin::default(),
            PanelConfig::new(320, 240, format),
        )
    }

    #[test]
    fn test_init_sequence() {
        let mut panel = controller(PixelFormat::Rgb565);
        let mut delay = MockDelay::default();
        panel
            .init(&mut delay, &PerformanceProfile::High.clocks())
            .unwrap();

        let (link, reset, backlight) = panel.release();
        assert_eq!(
            link.events,
            [
                LinkEvent::Init {
                    init_hz: 10_000_000,
                    fast_hz: 95_000_000
                },
                LinkEvent::Speed(LinkSpeed::Init),
                LinkEvent::Cmd(0x01),
                LinkEvent::Cmd(0x11),
                LinkEvent::Cmd(0x3A),
                LinkEvent::Data(0x55),
                LinkEvent::Cmd(0x36),
                LinkEvent::Data(0x68),
                LinkEvent::Cmd(0x29),
            ]
        );
        assert_eq!(delay.ms, [50, 150, 150, 150, 50]);
        assert_eq!(reset.history, [false, true]);
        assert!(backlight.is_set_high());
    }

    #[test]
    fn test_rgb332_runs_panel_in_rgb565() {
        let mut panel = controller(PixelFormat::Rgb332);
        panel
            .init(&mut MockDelay::default(), &PerformanceProfile::Stable.clocks())
            .unwrap();
        let events = &panel.link().events;
        let colmod = events.iter().position(|e| *e == LinkEvent::Cmd(0x3A)).unwrap();
        assert_eq!(events[colmod + 1], LinkEvent::Data(0x55));

        let mut panel = controller(PixelFormat::Rgb444);
        panel
            .init(&mut MockDelay::default(), &PerformanceProfile::Stable.clocks())
            .unwrap();
        let events = &panel.link().events;
        let colmod = events.iter().position(|e| *e == LinkEvent::Cmd(0x3A)).unwrap();
        assert_eq!(events[colmod + 1], LinkEvent::Data(0x53));
    }

    #[test]
    fn test_window_encoding() {
        let mut panel = controller(PixelFormat::Rgb565);
        panel.set_window(0, 0, 319, 239).unwrap();
        assert_eq!(
            panel.link().events,
            [
                LinkEvent::Speed(LinkSpeed::Init),
                LinkEvent::Cmd(0x2A),
                LinkEvent::Data(0x00),
                LinkEvent::Data(0x00),
                LinkEvent::Data(0x01),
                LinkEvent::Data(0x3F),
                LinkEvent::Cmd(0x2B),
                LinkEvent::Data(0x00),
                LinkEvent::Data(0x00),
                LinkEvent::Data(0x00),
                LinkEvent::Data(0xEF),
                LinkEvent::Cmd(0x2C),
            ]
        );
    }

    #[test]
    fn test_window_rejects_bad_corners() {
        let mut panel = controller(PixelFormat::Rgb565);
        assert_eq!(panel.set_window(10, 0, 5, 10), Err(DisplayError::InvalidWindow));
        assert_eq!(panel.set_window(0, 0, 320, 10), Err(DisplayError::InvalidWindow));
        assert_eq!(panel.set_window(0, 0, 10, 240), Err(DisplayError::InvalidWindow));
        assert!(panel.link().events.is_empty());
    }

    #[test]
    fn test_bulk_session() {
        let mut panel = controller(PixelFormat::Rgb565);
        panel.start_bulk().unwrap();
        let data = [1u8, 2, 3, 4];
        panel.write_pixels(&data).unwrap();
        panel.end_bulk().unwrap();

        let events = &panel.link().events;
        assert_eq!(events[0], LinkEvent::Speed(LinkSpeed::Fast));
        assert!(matches!(&events[1], LinkEvent::Bulk { bytes, .. } if bytes == &data));
        assert_eq!(events[2], LinkEvent::Wait);
        assert_eq!(events[3], LinkEvent::Speed(LinkSpeed::Init));
    }

    #[test]
    fn test_speed_change_refused_mid_transfer() {
        let mut panel = controller(PixelFormat::Rgb565);
        let data = [0u8; 8];
        panel.start_bulk().unwrap();
        #[allow(unsafe_code)]
        unsafe {
            panel.send_buffer(&data).unwrap();
        }
        assert!(panel.is_busy());
        assert_eq!(
            panel.set_window(0, 0, 1, 1),
            Err(DisplayError::Link(prism_hal::LinkError::Busy))
        );
        panel.wait();
        assert!(!panel.is_busy());
    }

    #[test]
    fn test_bus_failure_aborts_bring_up() {
        let mut link = MockTransport::new();
        link.fail_writes = true;
        let mut panel = DisplayController::new(
            link,
            MockPin::default(),
            MockPin::default(),
            PanelConfig::new(320, 240, PixelFormat::Rgb565),
        );
        assert_eq!(
            panel.init(&mut MockDelay::default(), &PerformanceProfile::High.clocks()),
            Err(DisplayError::Link(prism_hal::LinkError::Bus))
        );
        let (link, _, backlight) = panel.release();
        assert!(link.commands().is_empty());
        assert!(!backlight.state);
    }

    #[test]
    fn test_command_throttled_at_high_link_rate() {
        let mut panel = controller(PixelFormat::Rgb565);
        panel.start_bulk().unwrap();
        panel.write_command(cmd::RAMWR).unwrap();
        assert_eq!(
            panel.link().events,
            [
                LinkEvent::Speed(LinkSpeed::Fast),
                LinkEvent::Speed(LinkSpeed::Init),
                LinkEvent::Cmd(0x2C),
                LinkEvent::Speed(LinkSpeed::Fast),
            ]
        );
    }

    #[test]
    fn test_command_unthrottled_below_limit() {
        let mut panel = DisplayController::new(
            MockTransport::with_rates(10_000_000, 30_000_000),
            MockPin::default(),
            MockPin::default(),
            PanelConfig::default(),
        );
        panel.start_bulk().unwrap();
        panel.write_command(cmd::RAMWR).unwrap();
        assert_eq!(
            panel.link().events,
            [LinkEvent::Speed(LinkSpeed::Fast), LinkEvent::Cmd(0x2C)]
        );
    }
}
