//! Board-agnostic core of the presentation engine
//!
//! This crate contains everything between "the application drew a frame"
//! and "the bytes are on the wire", without depending on a specific chip:
//!
//! - Pixel codecs for the three on-wire bit depths (RGB565/444/332)
//! - Surfaces (owned pixel buffers) and drawing primitives
//! - The swap chain that overlaps drawing with DMA presentation
//! - The render service that hands half of a clear to the second core
//! - The panel command protocol and its window/bulk sessions
//! - Engine configuration, frame profiling and the frame loop

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod pixel;
pub mod profiler;
pub mod render;
pub mod surface;
pub mod swapchain;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{BufferCount, ClockProfile, EngineConfig, ExpansionMode, PerformanceProfile};
pub use display::{DisplayController, DisplayError, Panel, PanelConfig};
pub use engine::{App, Engine, Frame};
pub use error::EngineError;
pub use pixel::PixelFormat;
pub use profiler::{FrameProfiler, FrameStats};
pub use render::{RenderError, RenderJob, RenderLink, RenderService};
pub use surface::Surface;
pub use swapchain::{SlotState, SwapChain};
