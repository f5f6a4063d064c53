//! Prism Hardware Abstraction Layer
//!
//! This crate defines the hardware seams of the presentation engine. The
//! core crate only talks to these traits, so the same swap chain, render
//! service and panel protocol run on the RP2040 and under host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  prism-core (swap chain, panel, codec)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  prism-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  prism-hal-   │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Panel link (PIO bit clock or SPI + DMA)
//! - [`fill::WordFill`] - 32-bit memory fill engine
//! - [`clock::Clock`] - Free-running microsecond counter
//! - [`gpio::OutputPin`] - Reset and backlight lines

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod fill;
pub mod gpio;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use fill::WordFill;
pub use gpio::OutputPin;
pub use transport::{LinkError, LinkSpeed, Transport};
