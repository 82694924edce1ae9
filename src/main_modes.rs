use tokio::sync::watch;
use tracing::info;
use wagerboard::bootstrap::{self, Services};
use wagerboard::config::AppConfig;
use wagerboard::error::Result;

use crate::main_runtime::shutdown_signal;

pub async fn run_serve_mode(config: &AppConfig, port: Option<u16>) -> Result<()> {
    let services = Services::build(config).await?;
    let port = port.unwrap_or(config.server.port);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    bootstrap::serve(config, &services, port, shutdown_rx).await
}

pub async fn run_refresh_mode(config: &AppConfig) -> Result<()> {
    let services = Services::build(config).await?;
    let outcome = services.refresher.run_cycle().await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn run_window_mode(
    config: &AppConfig,
    start: i64,
    end: i64,
    limit: Option<usize>,
) -> Result<()> {
    let services = Services::build(config).await?;
    let mut gains = services.gains.compute_windowed(start, end).await;
    if let Some(limit) = limit {
        gains.truncate(limit);
    }
    println!("{}", serde_json::to_string_pretty(&gains)?);
    Ok(())
}
