mod registry;
mod room;
mod scheduler;
mod server;
mod server_logic;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::server::{AppResult, SERVER_PORT, ServerApp};

/// Transport pump rate. Simulation runs on the per-room timers, so this
/// only bounds how quickly inbound requests are picked up.
const PUMP_INTERVAL: Duration = Duration::from_micros(16_667);

#[tokio::main]
async fn main() -> AppResult<()> {
    init_tracing();

    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let mut app = ServerApp::new(tick_tx)?;
    info!("Server listening on port {}", SERVER_PORT);

    let mut pump_ticker = time::interval(PUMP_INTERVAL);
    pump_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
            _ = pump_ticker.tick() => {
                if let Err(err) = app.pump() {
                    error!(error = %err, "Network pump failed");
                }
            }
            Some(room_code) = tick_rx.recv() => {
                app.on_room_tick(room_code);
            }
        }
    }

    app.shutdown();
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
