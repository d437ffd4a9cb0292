//! End-to-end tests for the HTTP surface

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::time::timeout;
use tower::ServiceExt;

use focus_timer::{
    api::create_router,
    state::{AppState, Settings},
    tick::{TickEvent, TickSource, DEFAULT_TICK_PERIOD},
};

fn app() -> (Router, Arc<AppState>) {
    let ticks = TickSource::spawn(DEFAULT_TICK_PERIOD);
    let state = Arc::new(AppState::new(ticks, 20554, "127.0.0.1".to_string(), Settings::default()));
    (create_router(Arc::clone(&state)), state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn tick(state: &AppState, elapsed_ms: u64) {
    let epoch = state.run_epoch().unwrap();
    state.on_tick(TickEvent { epoch, elapsed_ms }).unwrap();
}

/// Read server-sent events off a body until `count` complete frames arrived.
/// Returns `(event name, data)` pairs.
async fn read_events(body: &mut axum::body::BodyDataStream, count: usize) -> Vec<(String, Value)> {
    let mut text = String::new();
    while text.matches("\n\n").count() < count {
        let chunk = timeout(Duration::from_secs(5), body.next())
            .await
            .expect("event stream stalled")
            .expect("event stream ended")
            .unwrap();
        text.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    text.split("\n\n")
        .filter(|frame| !frame.trim().is_empty())
        .map(|frame| {
            let mut name = String::new();
            let mut data = Value::Null;
            for line in frame.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data = serde_json::from_str(value.trim()).unwrap();
                }
            }
            (name, data)
        })
        .collect()
}

async fn open_events(app: &Router) -> axum::body::BodyDataStream {
    let request = Request::builder().uri("/timer/events").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/event-stream"));
    response.into_body().into_data_stream()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn countdown_expires_after_five_ticks() {
    let (app, state) = app();
    let (status, body) = call(&app, Method::POST, "/timer/duration", Some(json!({"value": 5, "unit": "seconds"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["remaining_ms"], 5000);
    assert_eq!(body["display"], "00:00:05");

    let (_, body) = call(&app, Method::POST, "/timer/start", None).await;
    assert_eq!(body["timer"]["state"], "running");
    assert_eq!(body["timer"]["is_running"], true);

    for _ in 0..4 {
        tick(&state, 1000);
    }
    let (_, body) = call(&app, Method::GET, "/timer", None).await;
    assert_eq!(body["timer"]["remaining_ms"], 1000);
    assert_eq!(body["timer"]["state"], "running");

    tick(&state, 1000);
    let (_, body) = call(&app, Method::GET, "/timer", None).await;
    assert_eq!(body["timer"]["remaining_ms"], 0);
    assert_eq!(body["timer"]["state"], "expired");
    assert_eq!(body["timer"]["is_expired"], true);
}

#[tokio::test]
async fn pause_ignores_ticks_until_resumed() {
    let (app, state) = app();
    call(&app, Method::POST, "/timer/duration", Some(json!({"value": 3000, "unit": "milliseconds"}))).await;
    call(&app, Method::POST, "/timer/start", None).await;
    tick(&state, 1000);

    let (_, body) = call(&app, Method::POST, "/timer/pause", None).await;
    assert_eq!(body["timer"]["state"], "paused");
    assert_eq!(body["timer"]["remaining_ms"], 2000);

    tick(&state, 1000);
    let (_, body) = call(&app, Method::POST, "/timer/resume", None).await;
    assert_eq!(body["timer"]["remaining_ms"], 2000);

    tick(&state, 1000);
    let (_, body) = call(&app, Method::GET, "/timer", None).await;
    assert_eq!(body["timer"]["remaining_ms"], 1000);
}

#[tokio::test]
async fn duration_change_while_running_conflicts() {
    let (app, _) = app();
    call(&app, Method::POST, "/timer/duration", Some(json!({"value": 5, "unit": "seconds"}))).await;
    call(&app, Method::POST, "/timer/start", None).await;

    let (status, body) = call(&app, Method::POST, "/timer/duration", Some(json!({"value": 2, "unit": "seconds"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_state");

    let (_, body) = call(&app, Method::GET, "/timer", None).await;
    assert_eq!(body["timer"]["duration_ms"], 5000);
    assert_eq!(body["timer"]["remaining_ms"], 5000);
}

#[tokio::test]
async fn negative_duration_is_bad_request() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::POST, "/timer/duration", Some(json!({"value": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "malformed_input");
}

#[tokio::test]
async fn reset_restores_full_duration() {
    let (app, state) = app();
    call(&app, Method::POST, "/timer/duration", Some(json!({"value": 1, "unit": "minutes"}))).await;
    call(&app, Method::POST, "/timer/start", None).await;
    tick(&state, 15_000);

    let (_, body) = call(&app, Method::POST, "/timer/reset", None).await;
    assert_eq!(body["timer"]["state"], "idle");
    assert_eq!(body["timer"]["remaining_ms"], 60_000);
    assert_eq!(body["timer"]["padded"]["minutes"], "01");

    call(&app, Method::POST, "/timer/start", None).await;
    let (_, body) = call(&app, Method::POST, "/timer/stop", None).await;
    assert_eq!(body["timer"]["state"], "idle");
    assert_eq!(body["timer"]["remaining_ms"], 60_000);
}

#[tokio::test]
async fn settings_drive_default_unit() {
    let (app, _) = app();
    let (_, body) = call(&app, Method::GET, "/settings", None).await;
    assert_eq!(body, json!({"unit": "minutes", "one_background": false}));

    let (status, body) = call(&app, Method::PUT, "/settings", Some(json!({"unit": "seconds", "one_background": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"unit": "seconds", "one_background": true}));

    let (_, body) = call(&app, Method::POST, "/timer/duration", Some(json!({"value": 90}))).await;
    assert_eq!(body["timer"]["remaining_ms"], 90_000);
    assert_eq!(body["display"], "00:01:30");
}

#[tokio::test]
async fn status_tracks_last_action() {
    let (app, _) = app();
    call(&app, Method::POST, "/timer/duration", Some(json!({"value": 1}))).await;
    call(&app, Method::POST, "/timer/start", None).await;

    let (status, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_action"], "start");
    assert_eq!(body["port"], 20554);
    assert_eq!(body["timer"]["state"], "running");
    assert_eq!(body["settings"]["unit"], "minutes");
}

#[tokio::test]
async fn event_stream_opens_with_current_snapshot() {
    let (app, _) = app();
    call(&app, Method::POST, "/timer/duration", Some(json!({"value": 90, "unit": "seconds"}))).await;

    let mut body = open_events(&app).await;
    let events = read_events(&mut body, 1).await;
    assert_eq!(events[0].0, "snapshot");
    assert_eq!(events[0].1["state"], "idle");
    assert_eq!(events[0].1["remaining_ms"], 90_000);
}

#[tokio::test]
async fn event_stream_reports_single_expiry_after_expired_snapshot() {
    let (app, state) = app();
    call(&app, Method::POST, "/timer/duration", Some(json!({"value": 2, "unit": "seconds"}))).await;
    call(&app, Method::POST, "/timer/start", None).await;

    let mut body = open_events(&app).await;
    tick(&state, 1000);
    tick(&state, 1500);
    // Further ticks after expiry change nothing
    tick(&state, 1000);

    let events = read_events(&mut body, 4).await;
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["snapshot", "snapshot", "snapshot", "expired"]);

    assert_eq!(events[0].1["state"], "running");
    assert_eq!(events[0].1["remaining_ms"], 2000);
    assert_eq!(events[1].1["remaining_ms"], 1000);
    assert_eq!(events[2].1["state"], "expired");
    assert_eq!(events[2].1["remaining_ms"], 0);
    assert_eq!(events[3].1["duration_ms"], 2000);

    assert!(timeout(Duration::from_millis(200), body.next()).await.is_err());
}
