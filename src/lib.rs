//! Focus Timer - A drift-corrected countdown timer engine
//!
//! The engine keeps a countdown in step with wall-clock time by consuming
//! measured elapsed-time ticks from an independent background task, and
//! exposes it to a view layer over HTTP.

pub mod config;
pub mod engine;
pub mod tick;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::{TimerEngine, TimerError, TimerSnapshot, TimerState};
pub use tick::{TickEvent, TickSource};
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
