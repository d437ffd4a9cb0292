//! Expiry logging background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::{AppState, TimerEvent};

/// Log every countdown expiry as it happens
pub async fn expiry_watch_task(state: Arc<AppState>) {
    info!("Starting expiry watch task");

    let mut events = state.subscribe_events();

    loop {
        match events.recv().await {
            Ok(TimerEvent::Expired(notice)) => {
                let length = notice
                    .duration_ms
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "unconfigured".to_string());
                info!("Countdown of {} expired at {}", length, notice.expired_at.to_rfc3339());
            }
            Ok(TimerEvent::Snapshot(_)) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Expiry watch lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("Expiry watch task stopped");
}
