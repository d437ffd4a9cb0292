//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod expiry_watch;
pub mod tick_pump;

// Re-export main functions
pub use expiry_watch::expiry_watch_task;
pub use tick_pump::tick_pump_task;
