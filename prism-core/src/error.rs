//! Engine-level errors
//!
//! Only initialization can fail for resource reasons. Everything after
//! that is either a caller precondition violation or impossible by
//! construction.

use crate::config::ConfigError;
use crate::display::DisplayError;
use crate::render::RenderError;

/// Errors surfaced by engine construction and the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// A surface or the expansion buffer could not be allocated
    OutOfMemory,
    /// The engine configuration was rejected
    InvalidConfig(ConfigError),
    /// Panel protocol failure
    Display(DisplayError),
    /// Render worker protocol failure
    Render(RenderError),
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::InvalidConfig(e)
    }
}

impl From<DisplayError> for EngineError {
    fn from(e: DisplayError) -> Self {
        EngineError::Display(e)
    }
}

impl From<RenderError> for EngineError {
    fn from(e: RenderError) -> Self {
        EngineError::Render(e)
    }
}
