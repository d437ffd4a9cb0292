//! Background tick source

use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::engine::TickControl;

/// Nominal period between ticks
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Wall-clock time elapsed since the previous tick (or since enable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// Run this tick belongs to, as passed to `enable`
    pub epoch: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
enum TickCommand {
    Enable(u64),
    Disable,
    Subscribe(mpsc::UnboundedSender<TickEvent>),
    Shutdown,
}

/// Handle to the tick task.
///
/// The task is spawned once and lives until [`TickSource::shutdown`] is
/// called or every handle is dropped. It is switched on and off by
/// messages, so enabling never races a task startup.
#[derive(Debug, Clone)]
pub struct TickSource {
    commands: mpsc::UnboundedSender<TickCommand>,
}

impl TickSource {
    /// Spawn the tick task on the current tokio runtime. It starts disabled.
    pub fn spawn(period: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(tick_task(period, rx));
        Self { commands }
    }

    /// Attach the single consumer, replacing any previous one
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TickEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.send(TickCommand::Subscribe(tx));
        rx
    }

    /// Stop the tick task for good
    pub fn shutdown(&self) {
        self.send(TickCommand::Shutdown);
    }

    fn send(&self, command: TickCommand) {
        if let Err(e) = self.commands.send(command) {
            warn!("Tick source is not running, dropped {:?}", e.0);
        }
    }
}

impl TickControl for TickSource {
    fn enable(&self, epoch: u64) {
        self.send(TickCommand::Enable(epoch));
    }

    fn disable(&self) {
        self.send(TickCommand::Disable);
    }
}

/// Measures true elapsed time between ticks in whole milliseconds.
///
/// Each lap takes the larger of the monotonic delta and the wall-clock
/// delta. The monotonic clock stops while the host is asleep, the wall
/// clock does not; a wall clock stepped backwards yields a zero wall delta
/// and the monotonic one wins. Sub-millisecond remainders carry over to
/// the next lap so repeated truncation never accumulates into drift.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedClock {
    last_instant: Instant,
    last_wall: DateTime<Utc>,
    carry: Duration,
}

impl ElapsedClock {
    pub fn start(now: Instant, wall: DateTime<Utc>) -> Self {
        Self {
            last_instant: now,
            last_wall: wall,
            carry: Duration::ZERO,
        }
    }

    /// Whole milliseconds since the previous lap
    pub fn lap(&mut self, now: Instant, wall: DateTime<Utc>) -> u64 {
        let monotonic = now.saturating_duration_since(self.last_instant);
        let wall_delta = (wall - self.last_wall).to_std().unwrap_or(Duration::ZERO);
        self.last_instant = now;
        self.last_wall = wall;

        let total = monotonic.max(wall_delta) + self.carry;
        let ms = u64::try_from(total.as_millis()).unwrap_or(u64::MAX);
        self.carry = total.saturating_sub(Duration::from_millis(ms));
        ms
    }
}

async fn tick_task(period: Duration, mut commands: mpsc::UnboundedReceiver<TickCommand>) {
    info!("Starting tick source task ({}ms period)", period.as_millis());

    let mut subscriber: Option<mpsc::UnboundedSender<TickEvent>> = None;
    let mut ticker: Option<(Interval, ElapsedClock)> = None;
    let mut epoch = 0;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(TickCommand::Enable(run)) => {
                    if ticker.is_none() || run != epoch {
                        let now = Instant::now();
                        let mut interval = interval_at(now + period, period);
                        // After a stall fire once, then keep the period from there
                        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        ticker = Some((interval, ElapsedClock::start(now, Utc::now())));
                        epoch = run;
                        debug!("Tick source enabled for run {}", run);
                    }
                }
                Some(TickCommand::Disable) => {
                    if ticker.take().is_some() {
                        debug!("Tick source disabled");
                    }
                }
                Some(TickCommand::Subscribe(tx)) => {
                    if subscriber.replace(tx).is_some() {
                        debug!("Tick subscriber replaced");
                    }
                }
                Some(TickCommand::Shutdown) | None => break,
            },

            _ = next_tick(&mut ticker), if ticker.is_some() => {
                let Some((_, clock)) = ticker.as_mut() else { continue };
                let event = TickEvent {
                    epoch,
                    elapsed_ms: clock.lap(Instant::now(), Utc::now()),
                };

                match &subscriber {
                    Some(tx) => {
                        if tx.send(event).is_err() {
                            debug!("Tick subscriber went away");
                            subscriber = None;
                        }
                    }
                    None => debug!("No tick subscriber, dropping {}ms tick", event.elapsed_ms),
                }
            }
        }
    }

    info!("Tick source task stopped");
}

async fn next_tick(ticker: &mut Option<(Interval, ElapsedClock)>) {
    match ticker {
        Some((interval, _)) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
