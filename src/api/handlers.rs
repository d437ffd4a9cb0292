//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::{
    engine::TimerSnapshot,
    state::{AppState, Settings, SettingsUpdate, StateError, TimerEvent},
};
use super::responses::{ApiError, HealthResponse, SetDurationRequest, StatusResponse, TimerResponse};

type TimerResult = Result<Json<TimerResponse>, ApiError>;

fn control(
    state: &AppState,
    action: &str,
    operation: fn(&AppState) -> Result<TimerSnapshot, StateError>,
) -> TimerResult {
    match operation(state) {
        Ok(snapshot) => {
            info!("{} endpoint called - timer is {}", action, snapshot.state);
            Ok(Json(TimerResponse::new(format!("{}: timer is {}", action, snapshot.state), snapshot)))
        }
        Err(e) => {
            warn!("{} rejected: {}", action, e);
            Err(e.into())
        }
    }
}

/// Handle GET /timer - Current snapshot
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    let snapshot = state.snapshot()?;
    Ok(Json(TimerResponse::new("Current timer".to_string(), snapshot)))
}

/// Handle POST /timer/duration - Configure the countdown length
pub async fn set_duration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetDurationRequest>,
) -> TimerResult {
    match state.set_duration(request.value, request.unit) {
        Ok(snapshot) => {
            info!("Duration endpoint called - {}ms", snapshot.remaining_ms);
            Ok(Json(TimerResponse::new("Duration set".to_string(), snapshot)))
        }
        Err(e) => {
            warn!("Set duration rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    control(&state, "Start", AppState::start)
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    control(&state, "Pause", AppState::pause)
}

/// Handle POST /timer/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    control(&state, "Resume", AppState::resume)
}

/// Handle POST /timer/stop
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    control(&state, "Stop", AppState::stop)
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    control(&state, "Reset", AppState::reset)
}

/// Handle GET /timer/events - Server-sent snapshot and expiry stream.
///
/// Opens with the current snapshot so a fresh client never starts blank.
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let events = state.subscribe_events();
    let current = state.snapshot()?;

    let stream = stream::once(async move { TimerEvent::Snapshot(current) })
        .chain(broadcast_stream(events))
        .map(to_sse);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Turn a broadcast receiver into a stream that ends when the sender is
/// gone. A lagging receiver skips ahead to the oldest retained message.
fn broadcast_stream<T: Clone + Send + 'static>(rx: broadcast::Receiver<T>) -> impl Stream<Item = T> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(item) => return Some((item, rx)),
                Err(RecvError::Lagged(skipped)) => warn!("Event stream lagged, skipped {} events", skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

fn to_sse(event: TimerEvent) -> Result<Event, axum::Error> {
    match event {
        TimerEvent::Snapshot(snapshot) => Event::default().event("snapshot").json_data(snapshot),
        TimerEvent::Expired(notice) => Event::default().event("expired").json_data(notice),
    }
}

/// Handle GET /settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.get_settings()?))
}

/// Handle PUT /settings - Partial settings update
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.update_settings(update)?))
}

/// Handle GET /status - Timer, settings and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let timer = state.snapshot()?;
    let settings = state.get_settings()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        settings,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
