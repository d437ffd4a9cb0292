//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{DisplayFields, TimerError, TimerSnapshot},
    state::{DurationUnit, Settings, StateError},
};

/// Body of `POST /timer/duration`
#[derive(Debug, Clone, Deserialize)]
pub struct SetDurationRequest {
    pub value: f64,
    /// Defaults to the unit in the current settings
    pub unit: Option<DurationUnit>,
}

/// Response for every timer endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// `HH:MM:SS` rendering of the remaining time
    pub display: String,
    pub timer: TimerSnapshot,
}

impl TimerResponse {
    pub fn new(message: String, timer: TimerSnapshot) -> Self {
        Self {
            status: "ok".to_string(),
            message,
            timestamp: Utc::now(),
            display: DisplayFields::from_millis(timer.remaining_ms).to_string(),
            timer,
        }
    }
}

/// Status response with timer, settings and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub settings: Settings,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned for rejected calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A service error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub StateError);

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, kind) = match &self.0 {
            StateError::Timer(TimerError::InvalidState { .. }) => (StatusCode::CONFLICT, "invalid_state"),
            StateError::Timer(TimerError::MalformedInput(_)) => (StatusCode::BAD_REQUEST, "malformed_input"),
            StateError::Lock(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            kind: kind.to_string(),
            message: self.0.to_string(),
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}
