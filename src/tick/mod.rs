//! Tick source module
//!
//! An independent periodic task that reports real elapsed time to the
//! countdown engine.

pub mod tick_source;

// Re-export main types
pub use tick_source::{ElapsedClock, TickEvent, TickSource, DEFAULT_TICK_PERIOD};
