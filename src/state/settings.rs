//! User-facing timer settings

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::engine::TimerError;

/// Unit a requested duration is expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Milliseconds,
    Seconds,
    #[default]
    Minutes,
}

impl DurationUnit {
    fn millis_per_unit(self) -> f64 {
        match self {
            DurationUnit::Milliseconds => 1.0,
            DurationUnit::Seconds => 1_000.0,
            DurationUnit::Minutes => 60_000.0,
        }
    }

    /// Convert a value in this unit to whole milliseconds.
    ///
    /// Negative values are rejected before rounding, so a tiny negative
    /// never collapses into a zero-length countdown.
    pub fn to_millis(self, value: f64) -> Result<i64, TimerError> {
        if !value.is_finite() {
            return Err(TimerError::MalformedInput(format!("duration must be finite, got {}", value)));
        }
        if value < 0.0 {
            return Err(TimerError::MalformedInput(format!("duration must be non-negative, got {}", value)));
        }
        let ms = (value * self.millis_per_unit()).round();
        if !ms.is_finite() || ms >= i64::MAX as f64 || ms <= i64::MIN as f64 {
            return Err(TimerError::MalformedInput(format!("duration {} {:?} is out of range", value, self)));
        }
        Ok(ms as i64)
    }
}

/// Key/value preferences read and written by the view layer.
/// Held in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Unit used when a duration request does not name one
    pub unit: DurationUnit,
    /// Render on a single plain background
    pub one_background: bool,
}

/// Partial settings change; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub unit: Option<DurationUnit>,
    pub one_background: Option<bool>,
}

impl Settings {
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(one_background) = update.one_background {
            self.one_background = one_background;
        }
    }
}
