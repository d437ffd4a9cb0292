//! Display projection of the remaining time

use std::fmt;

use serde::{Deserialize, Serialize};

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Remaining time split into days/hours/minutes/seconds.
///
/// Always derived from a millisecond count, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFields {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Zero-padded string form of [`DisplayFields`], ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddedFields {
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

impl DisplayFields {
    /// Decompose a millisecond count using 24h/60m/60s radices.
    /// Sub-second remainders are truncated.
    pub fn from_millis(ms: u64) -> Self {
        Self {
            days: ms / MS_PER_DAY,
            hours: (ms % MS_PER_DAY) / MS_PER_HOUR,
            minutes: (ms % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        }
    }

    /// Pad every field to at least two digits
    pub fn padded(&self) -> PaddedFields {
        PaddedFields {
            days: pad(self.days),
            hours: pad(self.hours),
            minutes: pad(self.minutes),
            seconds: pad(self.seconds),
        }
    }
}

impl fmt::Display for DisplayFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d ", self.days)?;
        }
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

fn pad(value: u64) -> String {
    format!("{:02}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposition() {
        assert_eq!(
            DisplayFields::from_millis(0),
            DisplayFields { days: 0, hours: 0, minutes: 0, seconds: 0 }
        );
        assert_eq!(
            DisplayFields::from_millis(300_000),
            DisplayFields { days: 0, hours: 0, minutes: 5, seconds: 0 }
        );
        // 1d 1h 1m 1s plus a partial second
        let ms = MS_PER_DAY + MS_PER_HOUR + MS_PER_MINUTE + MS_PER_SECOND + 999;
        assert_eq!(
            DisplayFields::from_millis(ms),
            DisplayFields { days: 1, hours: 1, minutes: 1, seconds: 1 }
        );
    }

    #[test]
    fn test_fields_wrap_at_radix() {
        let fields = DisplayFields::from_millis(23 * MS_PER_HOUR + 59 * MS_PER_MINUTE + 59_999);
        assert_eq!(fields.days, 0);
        assert_eq!(fields.hours, 23);
        assert_eq!(fields.minutes, 59);
        assert_eq!(fields.seconds, 59);

        let next = DisplayFields::from_millis(MS_PER_DAY);
        assert_eq!(next, DisplayFields { days: 1, hours: 0, minutes: 0, seconds: 0 });
    }

    #[test]
    fn test_padding() {
        let padded = DisplayFields::from_millis(3 * MS_PER_DAY + 7 * MS_PER_MINUTE + 42_000).padded();
        assert_eq!(padded.days, "03");
        assert_eq!(padded.hours, "00");
        assert_eq!(padded.minutes, "07");
        assert_eq!(padded.seconds, "42");

        let wide = DisplayFields::from_millis(123 * MS_PER_DAY).padded();
        assert_eq!(wide.days, "123");
    }

    #[test]
    fn test_display_format() {
        assert_eq!(DisplayFields::from_millis(61_000).to_string(), "00:01:01");
        assert_eq!(DisplayFields::from_millis(3_661_000).to_string(), "01:01:01");
        assert_eq!(
            DisplayFields::from_millis(2 * MS_PER_DAY + 5_000).to_string(),
            "2d 00:00:05"
        );
    }
}
