//! Process utilities

pub mod signals;

pub use signals::shutdown_signal;
