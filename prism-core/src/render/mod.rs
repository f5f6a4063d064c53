//! Cross-core render service
//!
//! Core 0 hands one job at a time to a worker loop on core 1 through a
//! pair of single-slot channels: one carries the job, the other the
//! completion report. Submit and wait strictly alternate; the service
//! refuses anything else instead of corrupting the shared slot.
//!
//! ```text
//!   core 0                         core 1
//!   submit ──── jobs (cap 1) ────▶ run_worker
//!   wait   ◀─── done (cap 1) ───── report
//! ```

mod job;
mod service;
mod split;
mod worker;

pub use job::{JobKind, JobReport, RenderJob, SurfaceRegion};
pub use service::{RenderLink, RenderService};
pub use split::CpuFill;
pub use worker::run_worker;

/// Render protocol errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError {
    /// Submit while a job is outstanding, or wait with none outstanding
    ProtocolMisuse,
    /// Region offset breaks the format's packing or word alignment
    Misaligned,
}
