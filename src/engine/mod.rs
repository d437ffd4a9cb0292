//! Countdown engine module
//!
//! Pure timing logic: the state machine, its display projection and the
//! errors it raises. The engine has no clock of its own; elapsed time is
//! pushed into it by a tick source.

pub mod display;
pub mod error;
pub mod timer_engine;

// Re-export main types
pub use display::{DisplayFields, PaddedFields};
pub use error::TimerError;
pub use timer_engine::{TickControl, TickOutcome, TimerEngine, TimerSnapshot, TimerState};
