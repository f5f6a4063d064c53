//! Demo applications

mod bouncing;

pub use bouncing::BouncingBalls;
