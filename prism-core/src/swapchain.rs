//! Swap chain
//!
//! Owns the surfaces and sequences drawing against presentation. Slots
//! move `Idle -> Drawing -> PendingTransfer -> Idle`. A single link serves
//! every slot, so at most one transfer is in flight; presented slots wait
//! their turn in a queue and are started whenever the chain gets control
//! (present, back, wait_last).
//!
//! The slot handed out for drawing is always waited for first, so a
//! surface is never written while the link reads it.
//!
//! RGB332 surfaces are expanded to RGB565 when their transfer starts. The
//! surface is free again as soon as it has been expanded; the expansion
//! buffer is what stays in flight. `present` therefore waits out the
//! previous expansion transfer and starts its own frame before returning.

use alloc::vec::Vec;

use heapless::Deque;
use prism_hal::Clock;

use crate::config::{EngineConfig, ExpansionMode, MAX_BUFFERS};
use crate::display::{DisplayError, Panel};
use crate::error::EngineError;
use crate::pixel::{expand_rgb332, PixelFormat};
use crate::surface::{alloc_words, Surface};

/// Lifecycle of one swap-chain slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    Idle,
    /// Lent out for drawing
    Drawing,
    /// Presented; queued or on the wire
    PendingTransfer,
}

/// What the link is currently reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Slot(usize),
    Expansion,
}

/// RGB332 expansion storage
enum Expansion {
    /// One full RGB565 frame
    Frame(Vec<u32>),
    /// Two ping-pong buffers of `lines` rows each
    Lines { halves: [Vec<u32>; 2], lines: usize },
}

/// Multi-buffered presentation over a [`Panel`]
pub struct SwapChain<P: Panel, C: Clock> {
    panel: P,
    clock: C,
    surfaces: heapless::Vec<Surface, MAX_BUFFERS>,
    states: [SlotState; MAX_BUFFERS],
    queue: Deque<usize, MAX_BUFFERS>,
    active: Option<InFlight>,
    back: usize,
    expansion: Option<Expansion>,
    wait_us: u32,
    frames: u32,
}

impl<P: Panel, C: Clock> SwapChain<P, C> {
    /// Allocate every surface (and the expansion buffer for RGB332)
    ///
    /// The panel must already be initialized. Nothing is allocated after
    /// this returns.
    pub fn new(panel: P, clock: C, config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let (w, h) = (config.width, config.height);

        let mut surfaces = heapless::Vec::new();
        for _ in 0..config.buffer_count.get() {
            let surface = Surface::new(w, h, config.pixel_format)?;
            if surfaces.push(surface).is_err() {
                return Err(EngineError::OutOfMemory);
            }
        }

        let expansion = if config.pixel_format.needs_expansion() {
            let row_bytes = w as usize * 2;
            Some(match config.expansion {
                ExpansionMode::Frame => Expansion::Frame(alloc_words(row_bytes * h as usize)?),
                ExpansionMode::Lines(n) => {
                    let lines = (n as usize).min(h as usize);
                    Expansion::Lines {
                        halves: [
                            alloc_words(row_bytes * lines)?,
                            alloc_words(row_bytes * lines)?,
                        ],
                        lines,
                    }
                }
            })
        } else {
            None
        };

        let mut states = [SlotState::Idle; MAX_BUFFERS];
        states[0] = SlotState::Drawing;

        Ok(Self {
            panel,
            clock,
            surfaces,
            states,
            queue: Deque::new(),
            active: None,
            back: 0,
            expansion,
            wait_us: 0,
            frames: 0,
        })
    }

    /// Surface to draw the next frame into
    ///
    /// Waits for the slot if its previous transfer is still running.
    pub fn get_draw_surface(&mut self) -> Result<&mut Surface, DisplayError> {
        self.wait_slot(self.back)?;
        self.states[self.back] = SlotState::Drawing;
        Ok(&mut self.surfaces[self.back])
    }

    /// Same as [`get_draw_surface`](Self::get_draw_surface)
    pub fn back(&mut self) -> Result<&mut Surface, DisplayError> {
        self.get_draw_surface()
    }

    /// Queue the back surface for transfer and move on to the next slot
    ///
    /// With two or three buffers this returns once the next slot is free,
    /// usually immediately. With one buffer the transfer is left running
    /// and the next [`get_draw_surface`](Self::get_draw_surface) waits.
    pub fn present(&mut self) -> Result<(), DisplayError> {
        let slot = self.back;
        self.wait_slot(slot)?;
        self.states[slot] = SlotState::PendingTransfer;
        let queued = self.queue.push_back(slot).is_ok();
        debug_assert!(queued, "slot queued twice");
        self.pump()?;
        if self.expansion.is_some() {
            // One expansion buffer: hand this frame to the link before returning
            while self.queue.iter().any(|&s| s == slot) {
                self.wait_link();
                self.pump()?;
            }
        }
        self.frames = self.frames.wrapping_add(1);

        if self.surfaces.len() > 1 {
            self.back = (self.back + 1) % self.surfaces.len();
            self.wait_slot(self.back)?;
            self.states[self.back] = SlotState::Drawing;
        }
        Ok(())
    }

    /// Block until every presented frame has left the link
    ///
    /// Returns immediately when nothing is outstanding.
    pub fn wait_last(&mut self) -> Result<(), DisplayError> {
        self.pump()?;
        while self.active.is_some() || !self.queue.is_empty() {
            if self.active.is_some() {
                self.wait_link();
            }
            self.pump()?;
        }
        Ok(())
    }

    pub fn back_index(&self) -> usize {
        self.back
    }

    /// Width, height and format shared by every slot
    pub fn geometry(&self) -> (u16, u16, PixelFormat) {
        let s = &self.surfaces[0];
        (s.width(), s.height(), s.format())
    }

    pub fn buffer_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        (slot < self.surfaces.len()).then(|| self.states[slot])
    }

    /// Slot whose surface the link is reading right now
    pub fn in_flight(&self) -> Option<usize> {
        match self.active {
            Some(InFlight::Slot(slot)) => Some(slot),
            _ => None,
        }
    }

    /// Whether any transfer is on the wire
    pub fn is_transferring(&self) -> bool {
        self.active.is_some()
    }

    /// Read-only view of a slot's surface
    pub fn surface(&self, slot: usize) -> Option<&Surface> {
        self.surfaces.get(slot)
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Time spent blocked on the link since the last reset
    pub fn wait_us(&self) -> u32 {
        self.wait_us
    }

    /// Frames presented since creation
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn reset_stats(&mut self) {
        self.wait_us = 0;
    }

    fn wait_link(&mut self) {
        let start = self.clock.now_us();
        self.panel.wait();
        self.wait_us = self.wait_us.wrapping_add(self.clock.elapsed_us(start));
    }

    fn wait_slot(&mut self, slot: usize) -> Result<(), DisplayError> {
        self.pump()?;
        while self.states[slot] == SlotState::PendingTransfer {
            self.wait_link();
            self.pump()?;
        }
        Ok(())
    }

    /// Retire a finished transfer and start the next queued one
    fn pump(&mut self) -> Result<(), DisplayError> {
        if let Some(done) = self.active {
            if self.panel.is_busy() {
                return Ok(());
            }
            self.active = None;
            if let InFlight::Slot(slot) = done {
                self.states[slot] = SlotState::Idle;
            }
            self.panel.end_bulk()?;
        }
        if let Some(slot) = self.queue.pop_front() {
            if let Err(e) = self.start(slot) {
                self.states[slot] = SlotState::Idle;
                return Err(e);
            }
        }
        Ok(())
    }

    fn start(&mut self, slot: usize) -> Result<(), DisplayError> {
        let surface = &self.surfaces[slot];
        let (w, h) = (surface.width() as usize, surface.height() as usize);
        self.panel
            .set_window(0, 0, surface.width() - 1, surface.height() - 1)?;
        self.panel.start_bulk()?;

        match &mut self.expansion {
            None => {
                // SAFETY: the slot stays PendingTransfer, so it is not lent
                // out or dropped before `pump` sees the link idle.
                #[allow(unsafe_code)]
                unsafe {
                    self.panel.send_buffer(surface.bytes())?;
                }
                self.active = Some(InFlight::Slot(slot));
            }
            Some(Expansion::Frame(buf)) => {
                let wire: &mut [u8] = bytemuck::cast_slice_mut(buf.as_mut_slice());
                let wire = &mut wire[..w * h * 2];
                expand_rgb332(surface.bytes(), wire);
                self.states[slot] = SlotState::Idle;
                // SAFETY: the expansion buffer is only rewritten by `start`,
                // which runs once the previous transfer has been retired.
                #[allow(unsafe_code)]
                unsafe {
                    self.panel.send_buffer(wire)?;
                }
                self.active = Some(InFlight::Expansion);
            }
            Some(Expansion::Lines { halves, lines }) => {
                let src = surface.bytes();
                let mut row = 0;
                let mut half = 0;
                while row < h {
                    let n = (*lines).min(h - row);
                    let wire: &mut [u8] = bytemuck::cast_slice_mut(halves[half].as_mut_slice());
                    let wire = &mut wire[..n * w * 2];
                    expand_rgb332(&src[row * w..(row + n) * w], wire);

                    let t = self.clock.now_us();
                    self.panel.wait();
                    self.wait_us = self.wait_us.wrapping_add(self.clock.elapsed_us(t));

                    // SAFETY: this half is not touched again until the link
                    // has drained (next-but-one chunk, or the next `start`).
                    #[allow(unsafe_code)]
                    unsafe {
                        self.panel.send_buffer(wire)?;
                    }
                    row += n;
                    half ^= 1;
                }
                self.states[slot] = SlotState::Idle;
                self.active = Some(InFlight::Expansion);
            }
        }
        Ok(())
    }
}

impl<P: Panel, C: Clock> Drop for SwapChain<P, C> {
    fn drop(&mut self) {
        // The link may still be reading a buffer we are about to free
        if self.active.is_some() {
            self.panel.wait();
        }
    }
}
