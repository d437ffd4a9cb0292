//! Tick delivery background task

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{engine::TickOutcome, state::AppState, tick::TickEvent};

/// Forward every tick from the tick source into the engine, in order
pub async fn tick_pump_task(state: Arc<AppState>, mut ticks: mpsc::UnboundedReceiver<TickEvent>) {
    info!("Starting tick pump task");

    while let Some(event) = ticks.recv().await {
        match state.on_tick(event) {
            Ok(TickOutcome::Expired) => debug!("Tick of {}ms expired the countdown", event.elapsed_ms),
            Ok(TickOutcome::Advanced) => {}
            Ok(TickOutcome::Ignored) => debug!("Stale tick of {}ms discarded", event.elapsed_ms),
            Err(e) => error!("Failed to apply tick: {}", e),
        }
    }

    info!("Tick stream closed, tick pump task stopped");
}
