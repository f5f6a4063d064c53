//! GPIO output adapter

use embassy_rp::gpio::Output;
use prism_hal::OutputPin;

/// Embassy push-pull output behind [`OutputPin`]
pub struct GpioOut<'d>(pub Output<'d>);

impl OutputPin for GpioOut<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}
