//! Service bootstrap -- wires fetch client, stores and orchestrator from config

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::adapters::FetchClient;
use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::error::{LeaderboardError, Result};
use crate::persistence::SnapshotStore;
use crate::services::{LiveState, Refresher, WindowedGainCalculator};

/// Every long-lived component of a running aggregator
pub struct Services {
    pub live: Arc<LiveState>,
    pub gains: Arc<WindowedGainCalculator>,
    pub refresher: Arc<Refresher>,
}

impl Services {
    pub async fn build(config: &AppConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| LeaderboardError::Validation(errors.join("; ")))?;

        let fetch = Arc::new(FetchClient::new(config.upstream.clone())?);
        let live = Arc::new(
            LiveState::load(
                config.storage.cache_path(),
                config.refresh.countdown_deadline,
            )
            .await,
        );
        let store = Arc::new(SnapshotStore::new(config.storage.snapshot_path()));
        let gains = Arc::new(WindowedGainCalculator::new(store.clone(), live.clone()));
        let refresher = Arc::new(Refresher::new(
            fetch,
            live.clone(),
            store,
            config.refresh.clone(),
        ));

        Ok(Self {
            live,
            gains,
            refresher,
        })
    }

    pub fn app_state(&self, config: &AppConfig) -> AppState {
        AppState::new(
            self.live.clone(),
            self.gains.clone(),
            self.refresher.clone(),
            config.admin.clone(),
        )
    }
}

/// Run the HTTP server and the refresh scheduler until `shutdown` flips.
pub async fn serve(
    config: &AppConfig,
    services: &Services,
    port: u16,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let scheduler = services.refresher.clone().spawn(shutdown.clone());
    let app = create_router(services.app_state(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("API server listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    let mut server_shutdown = shutdown;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*server_shutdown.borrow() {
                if server_shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    let _ = scheduler.await;
    info!("Shutdown complete");
    Ok(())
}
