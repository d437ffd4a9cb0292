//! Errors raised by timer control operations

use thiserror::Error;

use super::TimerState;

/// A rejected control call. Rejected calls never mutate the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The operation is not allowed in the current state
    #[error("cannot {operation} while timer is {state}")]
    InvalidState {
        operation: &'static str,
        state: TimerState,
    },

    /// The supplied value is negative, non-finite or out of range
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

pub type Result<T, E = TimerError> = std::result::Result<T, E>;
