use anyhow::Result;
use carbon_ledger::{api, config, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0, the engine will be reachable from the network");
    }
    if let Some(seed) = cfg.simulation.seed {
        info!(seed, "sensor simulation seeded, runs are reproducible");
    }

    let app = api::router(api::AppState::new(cfg));

    info!(%addr, "starting Carbon Operations Engine");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
