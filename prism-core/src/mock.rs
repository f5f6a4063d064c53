//! Host test doubles for the hardware seams

use core::cell::Cell;

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use prism_hal::{Clock, LinkError, LinkSpeed, OutputPin, Transport};

/// Everything the mock link saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Init { init_hz: u32, fast_hz: u32 },
    Speed(LinkSpeed),
    Cmd(u8),
    Data(u8),
    /// Bulk transfer: source address and a copy of the bytes
    Bulk { addr: usize, bytes: Vec<u8> },
    Wait,
}

/// Recording link that stays busy until `wait` (or one `is_busy` poll
/// when `completes_on_poll` is set)
pub struct MockTransport {
    pub events: Vec<LinkEvent>,
    speed: LinkSpeed,
    init_hz: u32,
    fast_hz: u32,
    busy: Cell<bool>,
    pub completes_on_poll: bool,
    /// Byte writes fail with [`LinkError::Bus`]
    pub fail_writes: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            speed: LinkSpeed::Init,
            init_hz: 10_000_000,
            fast_hz: 95_000_000,
            busy: Cell::new(false),
            completes_on_poll: false,
            fail_writes: false,
        }
    }

    pub fn with_rates(init_hz: u32, fast_hz: u32) -> Self {
        Self {
            init_hz,
            fast_hz,
            ..Self::new()
        }
    }

    pub fn commands(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Cmd(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn bulks(&self) -> Vec<(usize, &[u8])> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Bulk { addr, bytes } => Some((*addr, bytes.as_slice())),
                _ => None,
            })
            .collect()
    }

    fn check_idle(&self) -> Result<(), LinkError> {
        if self.busy.get() {
            Err(LinkError::Busy)
        } else {
            Ok(())
        }
    }
}

impl Transport for MockTransport {
    fn init(&mut self, init_hz: u32, fast_hz: u32) {
        self.init_hz = init_hz;
        self.fast_hz = fast_hz;
        self.speed = LinkSpeed::Init;
        self.events.push(LinkEvent::Init { init_hz, fast_hz });
    }

    fn set_speed(&mut self, speed: LinkSpeed) -> Result<(), LinkError> {
        self.check_idle()?;
        self.speed = speed;
        self.events.push(LinkEvent::Speed(speed));
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
        self.check_idle()?;
        if self.fail_writes {
            return Err(LinkError::Bus);
        }
        self.events.push(LinkEvent::Cmd(cmd));
        Ok(())
    }

    fn send_data8(&mut self, data: u8) -> Result<(), LinkError> {
        self.check_idle()?;
        if self.fail_writes {
            return Err(LinkError::Bus);
        }
        self.events.push(LinkEvent::Data(data));
        Ok(())
    }

    #[allow(unsafe_code)]
    unsafe fn send_buffer(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.check_idle()?;
        self.events.push(LinkEvent::Bulk {
            addr: data.as_ptr() as usize,
            bytes: data.to_vec(),
        });
        self.busy.set(true);
        Ok(())
    }

    fn wait(&mut self) {
        if self.busy.get() {
            self.events.push(LinkEvent::Wait);
        }
        self.busy.set(false);
    }

    fn is_busy(&self) -> bool {
        let busy = self.busy.get();
        if busy && self.completes_on_poll {
            self.busy.set(false);
        }
        busy
    }
}

/// Output pin remembering its level history
#[derive(Default)]
pub struct MockPin {
    pub state: bool,
    pub history: Vec<bool>,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.state = true;
        self.history.push(true);
    }

    fn set_low(&mut self) {
        self.state = false;
        self.history.push(false);
    }

    fn is_set_high(&self) -> bool {
        self.state
    }
}

/// Delay that records requested milliseconds
#[derive(Default)]
pub struct MockDelay {
    pub ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

/// Clock that advances by `step` microseconds on every read
pub struct FakeClock {
    now: Cell<u32>,
    step: u32,
}

impl FakeClock {
    pub fn new(step: u32) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }

    pub fn advance(&self, us: u32) {
        self.now.set(self.now.get().wrapping_add(us));
    }
}

impl Clock for FakeClock {
    fn now_us(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}
