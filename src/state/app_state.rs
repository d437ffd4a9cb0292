//! Process-wide timer service

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{DurationUnit, Settings, SettingsUpdate, StateError};
use crate::{
    engine::{TickOutcome, TimerEngine, TimerError, TimerSnapshot},
    tick::{TickEvent, TickSource},
};

/// One-shot notice published when a countdown reaches zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryNotice {
    pub duration_ms: Option<u64>,
    pub expired_at: DateTime<Utc>,
}

/// Change notifications fanned out to view-layer subscribers.
///
/// On expiry the `Snapshot` showing the expired state is sent first and the
/// `Expired` notice right after it.
#[derive(Debug, Clone)]
pub enum TimerEvent {
    Snapshot(TimerSnapshot),
    Expired(ExpiryNotice),
}

/// Shared application state: the single engine, its tick source and the
/// settings the view layer keeps alongside it.
///
/// Every engine access goes through one mutex, so control calls and tick
/// deliveries are applied one at a time.
#[derive(Debug)]
pub struct AppState {
    engine: Mutex<TimerEngine<TickSource>>,
    tick_source: TickSource,
    settings: Mutex<Settings>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Snapshot and expiry notifications
    event_tx: broadcast::Sender<TimerEvent>,
    /// Expiry raised by the engine, sent once its snapshot is out
    pending_expiry: Arc<Mutex<Option<ExpiryNotice>>>,
    /// Latest snapshot
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create the service around an already spawned tick source
    pub fn new(tick_source: TickSource, port: u16, host: String, settings: Settings) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        let pending_expiry = Arc::new(Mutex::new(None));

        let mut engine = TimerEngine::new(tick_source.clone());
        let slot = Arc::clone(&pending_expiry);
        engine.on_expire(move |snapshot: &TimerSnapshot| {
            let notice = ExpiryNotice {
                duration_ms: snapshot.duration_ms,
                expired_at: Utc::now(),
            };
            if let Ok(mut pending) = slot.lock() {
                *pending = Some(notice);
            }
        });
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

        Self {
            engine: Mutex::new(engine),
            tick_source,
            settings: Mutex::new(settings),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            event_tx,
            pending_expiry,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, TimerEngine<TickSource>>, StateError> {
        self.engine.lock().map_err(|_| StateError::Lock("timer engine"))
    }

    /// Run a control operation and publish the resulting snapshot.
    /// A rejected operation leaves both the engine and the action log untouched.
    fn apply<F>(&self, action: &str, operation: F) -> Result<TimerSnapshot, StateError>
    where
        F: FnOnce(&mut TimerEngine<TickSource>) -> Result<(), TimerError>,
    {
        let mut engine = self.lock_engine()?;
        operation(&mut *engine)?;
        let snapshot = engine.snapshot();
        // Publish under the lock so subscribers see snapshots in order
        self.publish(snapshot.clone());
        drop(engine);

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        Ok(snapshot)
    }

    /// Called with the engine lock held
    fn publish(&self, snapshot: TimerSnapshot) {
        self.snapshot_tx.send_replace(snapshot.clone());
        if self.event_tx.send(TimerEvent::Snapshot(snapshot)).is_err() {
            debug!("No event subscribers for snapshot");
        }

        let expired = self.pending_expiry.lock().ok().and_then(|mut pending| pending.take());
        if let Some(notice) = expired {
            if self.event_tx.send(TimerEvent::Expired(notice)).is_err() {
                debug!("No event subscribers for expiry");
            }
        }
    }

    /// Set the countdown length. `unit` falls back to the configured default.
    pub fn set_duration(&self, value: f64, unit: Option<DurationUnit>) -> Result<TimerSnapshot, StateError> {
        let unit = match unit {
            Some(unit) => unit,
            None => self.get_settings()?.unit,
        };
        let ms = unit.to_millis(value).inspect_err(|e| warn!("Rejected duration: {}", e))?;
        self.apply("set-duration", |engine| engine.set_duration(ms))
    }

    pub fn start(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("start", |engine| {
            engine.start();
            Ok(())
        })
    }

    pub fn pause(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("pause", |engine| {
            engine.pause();
            Ok(())
        })
    }

    pub fn resume(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("resume", |engine| {
            engine.resume();
            Ok(())
        })
    }

    pub fn stop(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("stop", |engine| {
            engine.stop();
            Ok(())
        })
    }

    pub fn reset(&self) -> Result<TimerSnapshot, StateError> {
        self.apply("reset", |engine| {
            engine.reset();
            Ok(())
        })
    }

    /// Feed one tick into the engine
    pub fn on_tick(&self, event: TickEvent) -> Result<TickOutcome, StateError> {
        let mut engine = self.lock_engine()?;
        let outcome = engine.on_tick(event.epoch, event.elapsed_ms);
        if outcome != TickOutcome::Ignored {
            self.publish(engine.snapshot());
        }
        Ok(outcome)
    }

    /// Run epoch the engine last handed to the tick source
    pub fn run_epoch(&self) -> Result<u64, StateError> {
        Ok(self.lock_engine()?.run_epoch())
    }

    /// Current engine snapshot
    pub fn snapshot(&self) -> Result<TimerSnapshot, StateError> {
        Ok(self.lock_engine()?.snapshot())
    }

    /// Subscribe to snapshot and expiry notifications
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    /// Watch the latest snapshot
    pub fn watch_snapshot(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn get_settings(&self) -> Result<Settings, StateError> {
        self.settings
            .lock()
            .map(|settings| settings.clone())
            .map_err(|_| StateError::Lock("settings"))
    }

    pub fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, StateError> {
        let mut settings = self.settings.lock().map_err(|_| StateError::Lock("settings"))?;
        settings.apply(update);
        info!("Settings updated: unit={:?}, one_background={}", settings.unit, settings.one_background);
        Ok(settings.clone())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Stop the tick task; the engine stays readable
    pub fn shutdown(&self) {
        info!("Shutting down tick source");
        self.tick_source.shutdown();
    }
}
