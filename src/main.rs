//! Focus Timer - A drift-corrected countdown timer served over HTTP
//!
//! This is the main entry point for the focus-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use focus_timer::{
    api::create_router,
    config::Config,
    state::{AppState, DurationUnit},
    tasks::{expiry_watch_task, tick_pump_task},
    tick::TickSource,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, duration={}min, tick={}ms, unit={:?}",
          config.host, config.port, config.duration, config.tick_ms, config.unit);

    // One tick source for the whole process, enabled and disabled by the engine
    let tick_source = TickSource::spawn(config.tick_period());
    let ticks = tick_source.subscribe();

    let state = Arc::new(AppState::new(
        tick_source,
        config.port,
        config.host.clone(),
        config.initial_settings(),
    ));
    state.set_duration(config.duration as f64, Some(DurationUnit::Minutes))?;

    tokio::spawn(tick_pump_task(Arc::clone(&state), ticks));
    tokio::spawn(expiry_watch_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer           - Current countdown snapshot");
    info!("  POST /timer/duration  - Set countdown length");
    info!("  POST /timer/start     - Start the countdown");
    info!("  POST /timer/pause     - Pause the countdown");
    info!("  POST /timer/resume    - Resume the countdown");
    info!("  POST /timer/stop      - Stop and return to idle");
    info!("  POST /timer/reset     - Reset to the full duration");
    info!("  GET  /timer/events    - Server-sent snapshot/expiry events");
    info!("  GET  /settings        - Read settings (PUT to update)");
    info!("  GET  /status          - Timer, settings and server status");
    info!("  GET  /health          - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
