//! State management module
//!
//! The process-wide timer service and the settings it carries.

pub mod app_state;
pub mod error;
pub mod settings;

// Re-export main types
pub use app_state::{AppState, ExpiryNotice, TimerEvent};
pub use error::StateError;
pub use settings::{DurationUnit, Settings, SettingsUpdate};
