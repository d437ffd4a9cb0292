//! Service-level errors

use thiserror::Error;

use crate::engine::TimerError;

#[derive(Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("failed to lock {0}")]
    Lock(&'static str),
}
