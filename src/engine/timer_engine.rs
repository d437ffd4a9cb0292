//! Countdown state machine

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    display::{DisplayFields, PaddedFields},
    error::{Result, TimerError},
};

/// Switch for the tick source driving the engine.
///
/// Both calls must be idempotent and must not block. Ticks produced after
/// `enable(epoch)` must carry that epoch back to [`TimerEngine::on_tick`].
pub trait TickControl {
    fn enable(&self, epoch: u64);
    fn disable(&self);
}

/// Lifecycle state of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Read-only view of the engine published to the view layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub duration_ms: Option<u64>,
    pub remaining_ms: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub padded: PaddedFields,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_expired: bool,
}

/// Result of feeding one tick into the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or left over from an earlier run; discarded
    Ignored,
    /// Remaining time decreased and the countdown continues
    Advanced,
    /// This tick drove remaining time to zero
    Expired,
}

type ExpiryListener = Box<dyn FnMut(&TimerSnapshot) + Send>;

/// Countdown engine.
///
/// Owns the configured duration, the remaining time and the state. It turns
/// its tick source on when entering `Running` and off when leaving it.
pub struct TimerEngine<T: TickControl> {
    ticks: T,
    state: TimerState,
    duration_ms: Option<u64>,
    remaining_ms: u64,
    /// Bumped every time ticks are enabled
    run_epoch: u64,
    listeners: Vec<ExpiryListener>,
}

impl<T: TickControl> TimerEngine<T> {
    /// Create an idle engine with no configured duration
    pub fn new(ticks: T) -> Self {
        Self {
            ticks,
            state: TimerState::Idle,
            duration_ms: None,
            remaining_ms: 0,
            run_epoch: 0,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Epoch handed to the tick source on the latest enable
    pub fn run_epoch(&self) -> u64 {
        self.run_epoch
    }

    /// Configure the countdown length. Only allowed while idle.
    pub fn set_duration(&mut self, ms: i64) -> Result<()> {
        if self.state != TimerState::Idle {
            warn!("Rejected set_duration({}) while {}", ms, self.state);
            return Err(TimerError::InvalidState {
                operation: "set duration",
                state: self.state,
            });
        }
        let ms = u64::try_from(ms)
            .map_err(|_| TimerError::MalformedInput(format!("duration must be non-negative, got {}", ms)))?;

        self.duration_ms = Some(ms);
        self.remaining_ms = ms;
        info!("Duration set to {}ms", ms);
        Ok(())
    }

    /// Start or continue the countdown. No-op while running or expired.
    pub fn start(&mut self) {
        match self.state {
            TimerState::Running => debug!("start ignored, already running"),
            TimerState::Expired => debug!("start ignored, timer expired"),
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                if self.remaining_ms == 0 {
                    info!("Started with no time remaining");
                    self.expire();
                } else {
                    self.enable_ticks();
                    info!("Timer running, {}ms remaining", self.remaining_ms);
                }
            }
        }
    }

    /// Freeze the countdown. No-op unless running.
    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            debug!("pause ignored while {}", self.state);
            return;
        }
        self.ticks.disable();
        self.state = TimerState::Paused;
        info!("Timer paused, {}ms remaining", self.remaining_ms);
    }

    /// Continue a paused countdown. No-op unless paused.
    pub fn resume(&mut self) {
        if self.state != TimerState::Paused {
            debug!("resume ignored while {}", self.state);
            return;
        }
        self.state = TimerState::Running;
        self.enable_ticks();
        info!("Timer resumed, {}ms remaining", self.remaining_ms);
    }

    /// Abandon the countdown and return to idle
    pub fn stop(&mut self) {
        info!("Timer stopped");
        self.return_to_idle();
    }

    /// Rewind to the full duration and return to idle
    pub fn reset(&mut self) {
        info!("Timer reset");
        self.return_to_idle();
    }

    /// Apply one elapsed-time tick produced under `epoch`.
    ///
    /// Ticks arriving outside `Running` are discarded, and so are ticks from
    /// an earlier run that were still in flight when the timer was paused,
    /// stopped or reset and then started again.
    pub fn on_tick(&mut self, epoch: u64, elapsed_ms: u64) -> TickOutcome {
        if self.state != TimerState::Running {
            debug!("Discarding {}ms tick while {}", elapsed_ms, self.state);
            return TickOutcome::Ignored;
        }
        if epoch != self.run_epoch {
            debug!("Discarding {}ms tick from run {}, current run is {}", elapsed_ms, epoch, self.run_epoch);
            return TickOutcome::Ignored;
        }

        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms == 0 {
            self.expire();
            TickOutcome::Expired
        } else {
            debug!("Tick of {}ms, {}ms remaining", elapsed_ms, self.remaining_ms);
            TickOutcome::Advanced
        }
    }

    /// Register a listener invoked once per transition into `Expired`.
    ///
    /// Listeners run synchronously inside the transition and must not call
    /// back into the engine.
    pub fn on_expire<F>(&mut self, listener: F)
    where
        F: FnMut(&TimerSnapshot) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Current state plus the display projection of the remaining time
    pub fn snapshot(&self) -> TimerSnapshot {
        let fields = DisplayFields::from_millis(self.remaining_ms);
        TimerSnapshot {
            state: self.state,
            duration_ms: self.duration_ms,
            remaining_ms: self.remaining_ms,
            days: fields.days,
            hours: fields.hours,
            minutes: fields.minutes,
            seconds: fields.seconds,
            padded: fields.padded(),
            is_running: self.state == TimerState::Running,
            is_paused: self.state == TimerState::Paused,
            is_expired: self.state == TimerState::Expired,
        }
    }

    fn enable_ticks(&mut self) {
        self.run_epoch += 1;
        self.ticks.enable(self.run_epoch);
    }

    fn return_to_idle(&mut self) {
        self.ticks.disable();
        self.state = TimerState::Idle;
        self.remaining_ms = self.duration_ms.unwrap_or(0);
    }

    fn expire(&mut self) {
        self.ticks.disable();
        self.remaining_ms = 0;
        self.state = TimerState::Expired;
        info!("Countdown expired");

        let snapshot = self.snapshot();
        for listener in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }
}

impl<T: TickControl> fmt::Debug for TimerEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("duration_ms", &self.duration_ms)
            .field("remaining_ms", &self.remaining_ms)
            .field("run_epoch", &self.run_epoch)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
